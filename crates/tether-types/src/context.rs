//! Type context: owns and interns every host type descriptor
//!
//! Structural (unnamed) types are interned, so building `[]int` twice yields
//! the same [`TypeId`]. Named types are unique by name and may be declared
//! before they are defined, which is how recursive types are described.

use std::fmt::Write;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::TypeError;
use crate::method::{Method, MethodDef, Receiver};
use crate::ty::{
    ChanDir, FunctionType, PrimitiveType, StructField, StructType, Type, TypeDef, TypeId, TypeKind,
};

/// Registry of host type descriptors
#[derive(Debug, Clone)]
pub struct TypeContext {
    defs: Vec<TypeDef>,
    interned: FxHashMap<Type, TypeId>,
    by_name: FxHashMap<String, TypeId>,
}

impl TypeContext {
    /// Create a context with every primitive pre-registered
    pub fn new() -> Self {
        let mut ctx = Self {
            defs: Vec::new(),
            interned: FxHashMap::default(),
            by_name: FxHashMap::default(),
        };
        for prim in PrimitiveType::ALL {
            ctx.intern(Type::Primitive(prim));
        }
        ctx
    }

    fn push(&mut self, def: TypeDef) -> TypeId {
        let id = TypeId(self.defs.len() as u32);
        self.defs.push(def);
        id
    }

    /// Intern a structural type
    pub fn intern(&mut self, ty: Type) -> TypeId {
        if let Some(&id) = self.interned.get(&ty) {
            return id;
        }
        let id = self.push(TypeDef::anonymous(ty.clone()));
        self.interned.insert(ty, id);
        id
    }

    /// Id of a primitive type
    pub fn primitive(&mut self, prim: PrimitiveType) -> TypeId {
        self.intern(Type::Primitive(prim))
    }

    /// `bool`
    pub fn bool_type(&mut self) -> TypeId {
        self.primitive(PrimitiveType::Bool)
    }

    /// `int`
    pub fn int_type(&mut self) -> TypeId {
        self.primitive(PrimitiveType::Int)
    }

    /// `float64`
    pub fn float64_type(&mut self) -> TypeId {
        self.primitive(PrimitiveType::Float64)
    }

    /// `string`
    pub fn string_type(&mut self) -> TypeId {
        self.primitive(PrimitiveType::String)
    }

    /// `[]elem`
    pub fn slice_of(&mut self, elem: TypeId) -> TypeId {
        self.intern(Type::Slice { elem })
    }

    /// `[len]elem`
    pub fn array_of(&mut self, elem: TypeId, len: usize) -> TypeId {
        self.intern(Type::Array { elem, len })
    }

    /// `map[key]value`
    pub fn map_of(&mut self, key: TypeId, value: TypeId) -> TypeId {
        self.intern(Type::Map { key, value })
    }

    /// `chan elem` with the given direction
    pub fn chan_of(&mut self, elem: TypeId, dir: ChanDir) -> TypeId {
        self.intern(Type::Chan { elem, dir })
    }

    /// `*elem`
    pub fn pointer_to(&mut self, elem: TypeId) -> TypeId {
        self.intern(Type::Pointer { elem })
    }

    /// Anonymous `struct { ... }`
    pub fn struct_of(&mut self, fields: Vec<StructField>) -> TypeId {
        self.intern(Type::Struct(StructType::new(fields)))
    }

    /// `func(params) (results)`
    pub fn func_of(&mut self, params: Vec<TypeId>, results: Vec<TypeId>) -> TypeId {
        self.intern(Type::Func(FunctionType {
            params,
            results,
            variadic: false,
        }))
    }

    /// Forward-declare a named type
    pub fn declare(&mut self, name: impl Into<String>) -> Result<TypeId, TypeError> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(TypeError::DuplicateName { name });
        }
        let id = self.push(TypeDef::named(name.clone()));
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Give a declared named type its underlying shape
    pub fn define(&mut self, id: TypeId, ty: Type) -> Result<(), TypeError> {
        let def = self.get(id).ok_or(TypeError::UnknownType { id })?;
        if !def.is_named() || def.ty != Type::Unresolved {
            return Err(TypeError::AlreadyDefined {
                name: self.name_of(id),
            });
        }
        self.defs[id.index()].ty = ty;
        Ok(())
    }

    /// Declare and define a named type in one step
    pub fn named(&mut self, name: impl Into<String>, ty: Type) -> Result<TypeId, TypeError> {
        let id = self.declare(name)?;
        self.define(id, ty)?;
        Ok(id)
    }

    /// Declare a method on a named type
    pub fn add_method(&mut self, id: TypeId, method: MethodDef) -> Result<(), TypeError> {
        let def = self.get(id).ok_or(TypeError::UnknownType { id })?;
        let reason = match def.ty.kind() {
            _ if !def.is_named() => Some("receiver must be a named type"),
            TypeKind::Pointer => Some("receiver base type is a pointer"),
            TypeKind::Interface => Some("receiver base type is an interface"),
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(TypeError::InvalidReceiver {
                ty: self.name_of(id),
                reason: reason.to_string(),
            });
        }
        if def.methods.iter().any(|m| m.name == method.name) {
            return Err(TypeError::DuplicateMethod {
                ty: self.name_of(id),
                method: method.name,
            });
        }
        self.defs[id.index()].methods.push(method);
        Ok(())
    }

    /// Check that every declared named type was defined
    pub fn validate(&self) -> Result<(), TypeError> {
        for def in &self.defs {
            if let (Some(name), Type::Unresolved) = (&def.name, &def.ty) {
                return Err(TypeError::Unresolved { name: name.clone() });
            }
        }
        Ok(())
    }

    /// Get a type definition
    pub fn get(&self, id: TypeId) -> Option<&TypeDef> {
        self.defs.get(id.index())
    }

    /// Get a type's shape
    pub fn ty(&self, id: TypeId) -> Option<&Type> {
        self.get(id).map(|def| &def.ty)
    }

    /// Structural kind; unknown ids report [`TypeKind::Invalid`]
    pub fn kind(&self, id: TypeId) -> TypeKind {
        self.ty(id).map_or(TypeKind::Invalid, Type::kind)
    }

    /// Find a named type
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Element type of a pointer, slice, array or channel; value type of a map
    pub fn elem(&self, id: TypeId) -> Option<TypeId> {
        match self.ty(id)? {
            Type::Pointer { elem }
            | Type::Slice { elem }
            | Type::Array { elem, .. }
            | Type::Chan { elem, .. } => Some(*elem),
            Type::Map { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Key type of a map
    pub fn key(&self, id: TypeId) -> Option<TypeId> {
        match self.ty(id)? {
            Type::Map { key, .. } => Some(*key),
            _ => None,
        }
    }

    /// Declared fields of a struct type
    pub fn struct_fields(&self, id: TypeId) -> Option<&[StructField]> {
        match self.ty(id)? {
            Type::Struct(s) => Some(&s.fields),
            _ => None,
        }
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Host spelling of a type: `Foo`, `[]int`, `map[string]int`, `*Foo`,
    /// `struct { A Foo }`
    pub fn name_of(&self, id: TypeId) -> String {
        let mut out = String::new();
        self.write_name(id, &mut out);
        out
    }

    fn write_name(&self, id: TypeId, out: &mut String) {
        let Some(def) = self.get(id) else {
            let _ = write!(out, "<unknown {}>", id);
            return;
        };
        if let Some(name) = &def.name {
            out.push_str(name);
            return;
        }
        match &def.ty {
            Type::Unresolved => out.push_str("<unresolved>"),
            Type::Primitive(p) => out.push_str(p.type_name()),
            Type::Interface(i) if i.methods.is_empty() => out.push_str("interface {}"),
            Type::Interface(i) => {
                let names: Vec<&str> = i.methods.iter().map(|m| m.name.as_str()).collect();
                let _ = write!(out, "interface {{ {} }}", names.join("; "));
            }
            Type::Func(func) => {
                out.push_str("func(");
                self.write_list(&func.params, out);
                out.push(')');
                match func.results.len() {
                    0 => {}
                    1 => {
                        out.push(' ');
                        self.write_name(func.results[0], out);
                    }
                    _ => {
                        out.push_str(" (");
                        self.write_list(&func.results, out);
                        out.push(')');
                    }
                }
            }
            Type::Struct(s) if s.fields.is_empty() => out.push_str("struct {}"),
            Type::Struct(s) => {
                out.push_str("struct { ");
                for (i, field) in s.fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    if !field.embedded {
                        out.push_str(&field.name);
                        out.push(' ');
                    }
                    self.write_name(field.ty, out);
                }
                out.push_str(" }");
            }
            Type::Slice { elem } => {
                out.push_str("[]");
                self.write_name(*elem, out);
            }
            Type::Array { elem, len } => {
                let _ = write!(out, "[{}]", len);
                self.write_name(*elem, out);
            }
            Type::Map { key, value } => {
                out.push_str("map[");
                self.write_name(*key, out);
                out.push(']');
                self.write_name(*value, out);
            }
            Type::Chan { elem, dir } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.write_name(*elem, out);
            }
            Type::Pointer { elem } => {
                out.push('*');
                self.write_name(*elem, out);
            }
        }
    }

    fn write_list(&self, ids: &[TypeId], out: &mut String) {
        for (i, id) in ids.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_name(*id, out);
        }
    }

    /// Method set of a type, sorted by name
    ///
    /// A value type `T` gets the value-receiver methods declared on `T`; `*T`
    /// gets every method declared on `T`. A named pointer type has no methods.
    /// An interface lists its own methods.
    ///
    /// Methods of embedded fields are promoted one embedding depth at a time.
    /// A name found at a shallower depth shadows every deeper one, and a name
    /// found more than once at the same depth is dropped. A pointer-receiver
    /// method that is unreachable from a value receiver still claims its name
    /// at its depth.
    pub fn method_set(&self, id: TypeId) -> Vec<Method> {
        let Some(def) = self.get(id) else {
            return Vec::new();
        };
        let (base, addressable) = match &def.ty {
            Type::Pointer { .. } if def.is_named() => return Vec::new(),
            Type::Pointer { elem } => match self.kind(*elem) {
                TypeKind::Pointer | TypeKind::Interface => return Vec::new(),
                _ => (*elem, true),
            },
            _ => (id, false),
        };

        let mut methods: Vec<Method> = self
            .resolve_methods(base, addressable)
            .into_values()
            .flatten()
            .collect();
        methods.sort_by(|a, b| a.def.name.cmp(&b.def.name));
        methods
    }

    /// Breadth-first walk over the embedding tree. Every name is settled at
    /// the first depth that declares it; `None` marks a name that is claimed
    /// but not part of the set.
    fn resolve_methods(
        &self,
        base: TypeId,
        addressable: bool,
    ) -> FxHashMap<String, Option<Method>> {
        let mut settled: FxHashMap<String, Option<Method>> = FxHashMap::default();
        let mut seen: FxHashSet<TypeId> = FxHashSet::default();
        let mut level = vec![Embedding {
            ty: base,
            addressable,
            path: Vec::new(),
            ambiguous: false,
        }];

        while !level.is_empty() {
            // A type reached twice at one depth makes all of its names ambiguous
            let mut occurrences: FxHashMap<TypeId, usize> = FxHashMap::default();
            for embedding in &level {
                *occurrences.entry(embedding.ty).or_default() += 1;
            }

            let mut found: FxHashMap<String, (usize, Option<Method>)> = FxHashMap::default();
            let mut next = Vec::new();
            for embedding in level {
                if !seen.insert(embedding.ty) {
                    continue;
                }
                let Some(def) = self.get(embedding.ty) else {
                    continue;
                };
                let count = match occurrences.get(&embedding.ty).copied().unwrap_or(1) {
                    1 if embedding.ambiguous => 2,
                    count => count,
                };

                let declared: &[MethodDef] = match &def.ty {
                    Type::Interface(iface) => &iface.methods,
                    _ => &def.methods,
                };
                let any_receiver = matches!(def.ty, Type::Interface(_));
                for method in declared {
                    if settled.contains_key(&method.name) {
                        continue;
                    }
                    let reachable = any_receiver
                        || method.receiver == Receiver::Value
                        || embedding.addressable;
                    let entry = reachable.then(|| Method {
                        def: method.clone(),
                        owner: embedding.ty,
                        path: embedding.path.clone(),
                    });
                    found
                        .entry(method.name.clone())
                        .and_modify(|(seen_count, _)| *seen_count += count)
                        .or_insert((count, entry));
                }

                let Some(fields) = self.struct_fields(embedding.ty) else {
                    continue;
                };
                for (index, field) in fields.iter().enumerate() {
                    if !field.embedded {
                        continue;
                    }
                    let (inner, inner_addressable) = match self.ty(field.ty) {
                        Some(Type::Pointer { elem }) => (*elem, true),
                        _ => (field.ty, embedding.addressable),
                    };
                    let mut path = embedding.path.clone();
                    path.push(index);
                    next.push(Embedding {
                        ty: inner,
                        addressable: inner_addressable,
                        path,
                        ambiguous: count > 1,
                    });
                }
            }

            for (name, (count, method)) in found {
                settled.insert(name, if count == 1 { method } else { None });
            }
            level = next;
        }
        settled
    }
}

/// An embedded type reached while resolving a method set
struct Embedding {
    ty: TypeId,
    addressable: bool,
    path: Vec<usize>,
    /// Reached through a type that occurs more than once at some depth
    ambiguous: bool,
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}
