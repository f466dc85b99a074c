//! Proxy descriptors
//!
//! A [`Proxy`] is the behavior table the script engine attaches to a wrapped
//! host value: one stub per supported [`Metamethod`], a `methods` sub-table,
//! and for struct kinds a `fields` sub-table mapping exposed names to the
//! [`FieldPath`] that reaches the field.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tether_types::{Method, Type, TypeContext, TypeId, TypeKind};

use crate::accessor::NativeFn;

/// Marker stored in every proxy's protected slot
pub const PROTECTED_MARKER: &str = "tether";

/// Operation slots of a behavior table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metamethod {
    /// `v[k]`
    Index,
    /// `v[k] = x`
    NewIndex,
    /// `#v`
    Len,
    /// `v(...)`
    Call,
    /// `a == b`
    Eq,
    /// `-v`
    Unm,
    /// `a + b`
    Add,
    /// `a ^ b`
    Pow,
    /// `tostring(v)`
    ToString,
}

impl Metamethod {
    /// Every slot
    pub const ALL: [Metamethod; 9] = [
        Metamethod::Index,
        Metamethod::NewIndex,
        Metamethod::Len,
        Metamethod::Call,
        Metamethod::Eq,
        Metamethod::Unm,
        Metamethod::Add,
        Metamethod::Pow,
        Metamethod::ToString,
    ];

    /// Engine-facing slot name
    pub fn name(&self) -> &'static str {
        match self {
            Metamethod::Index => "__index",
            Metamethod::NewIndex => "__newindex",
            Metamethod::Len => "__len",
            Metamethod::Call => "__call",
            Metamethod::Eq => "__eq",
            Metamethod::Unm => "__unm",
            Metamethod::Add => "__add",
            Metamethod::Pow => "__pow",
            Metamethod::ToString => "__tostring",
        }
    }
}

impl fmt::Display for Metamethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Field indices leading from the owning type down to a field
///
/// Every step past the first goes through an embedded field, dereferencing
/// at most one pointer on the way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldPath(Vec<usize>);

impl FieldPath {
    /// Path to a field declared directly on the owning type
    pub fn root(index: usize) -> Self {
        FieldPath(vec![index])
    }

    /// This path extended by one step
    pub fn child(&self, index: usize) -> Self {
        let mut steps = Vec::with_capacity(self.0.len() + 1);
        steps.extend_from_slice(&self.0);
        steps.push(index);
        FieldPath(steps)
    }

    /// The indices, outermost first
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the path has no steps
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prepend `index` to this path
    pub(crate) fn nested_under(self, index: usize) -> Self {
        let mut steps = Vec::with_capacity(self.0.len() + 1);
        steps.push(index);
        steps.extend(self.0);
        FieldPath(steps)
    }
}

impl From<Vec<usize>> for FieldPath {
    fn from(steps: Vec<usize>) -> Self {
        FieldPath(steps)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, step) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", step)?;
        }
        f.write_str("]")
    }
}

/// Exported host method bound into a proxy's `methods` table
pub struct MethodStub {
    /// The method-set entry
    pub method: Method,
    /// Whether the receiver arrives as a pointer
    pub ptr_receiver: bool,
    /// Stub invoked by the engine
    pub call: NativeFn,
}

impl fmt::Debug for MethodStub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodStub")
            .field("name", &self.method.def.name)
            .field("owner", &self.method.owner)
            .field("ptr_receiver", &self.ptr_receiver)
            .finish()
    }
}

/// Structural category a proxy is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyKind {
    /// Fixed-length array
    Array,
    /// Channel
    Chan,
    /// Map
    Map,
    /// Slice
    Slice,
    /// Struct value
    Struct,
    /// Pointer to an array
    PtrArray,
    /// Pointer to a struct
    PtrStruct,
    /// Any other pointer
    Ptr,
}

impl ProxyKind {
    /// Kind of `ty`, or `None` when values of `ty` are not wrapped in proxies
    pub fn of(types: &TypeContext, ty: TypeId) -> Option<ProxyKind> {
        match types.ty(ty)? {
            Type::Array { .. } => Some(ProxyKind::Array),
            Type::Chan { .. } => Some(ProxyKind::Chan),
            Type::Map { .. } => Some(ProxyKind::Map),
            Type::Slice { .. } => Some(ProxyKind::Slice),
            Type::Struct(_) => Some(ProxyKind::Struct),
            Type::Pointer { elem } => match types.kind(*elem) {
                TypeKind::Array => Some(ProxyKind::PtrArray),
                TypeKind::Struct => Some(ProxyKind::PtrStruct),
                _ => Some(ProxyKind::Ptr),
            },
            _ => None,
        }
    }

    /// Whether methods bound for this kind take a pointer receiver
    pub fn ptr_receiver(&self) -> bool {
        matches!(
            self,
            ProxyKind::PtrArray | ProxyKind::PtrStruct | ProxyKind::Ptr
        )
    }

    /// Lowercase kind name
    pub fn name(&self) -> &'static str {
        match self {
            ProxyKind::Array => "array",
            ProxyKind::Chan => "chan",
            ProxyKind::Map => "map",
            ProxyKind::Slice => "slice",
            ProxyKind::Struct => "struct",
            ProxyKind::PtrArray => "ptr-array",
            ProxyKind::PtrStruct => "ptr-struct",
            ProxyKind::Ptr => "ptr",
        }
    }
}

impl fmt::Display for ProxyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a proxy handed to the post-processing hook is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyRole {
    /// Wraps values of the type
    Value,
    /// The shared table of type handles
    Constructor,
}

impl ProxyRole {
    /// Check if this is the constructor role
    pub fn is_constructor(&self) -> bool {
        matches!(self, ProxyRole::Constructor)
    }
}

/// Behavior table for one host type
#[derive(Default)]
pub struct Proxy {
    kind: Option<ProxyKind>,
    ops: FxHashMap<Metamethod, NativeFn>,
    custom: FxHashMap<String, NativeFn>,
    methods: FxHashMap<String, Arc<MethodStub>>,
    fields: Option<FxHashMap<String, FieldPath>>,
    protected: Option<String>,
}

impl Proxy {
    /// Empty table for values of `kind`; struct kinds get a `fields` table
    pub fn new(kind: ProxyKind) -> Self {
        Self {
            kind: Some(kind),
            fields: (kind == ProxyKind::Struct).then(FxHashMap::default),
            ..Self::default()
        }
    }

    /// Empty table for type handles
    pub fn constructor() -> Self {
        Self::default()
    }

    /// Kind this table was built for; `None` for the constructor table
    pub fn kind(&self) -> Option<ProxyKind> {
        self.kind
    }

    /// Set an operation slot
    pub fn set_op(&mut self, slot: Metamethod, stub: NativeFn) {
        self.ops.insert(slot, stub);
    }

    /// Get an operation slot
    pub fn op(&self, slot: Metamethod) -> Option<&NativeFn> {
        self.ops.get(&slot)
    }

    /// Check if an operation slot is set
    pub fn has_op(&self, slot: Metamethod) -> bool {
        self.ops.contains_key(&slot)
    }

    /// Set slots, in [`Metamethod::ALL`] order
    pub fn op_slots(&self) -> Vec<Metamethod> {
        Metamethod::ALL
            .into_iter()
            .filter(|slot| self.ops.contains_key(slot))
            .collect()
    }

    /// Add a named entry outside the standard slots
    pub fn set_custom(&mut self, name: impl Into<String>, stub: NativeFn) {
        self.custom.insert(name.into(), stub);
    }

    /// Get a named entry outside the standard slots
    pub fn custom(&self, name: &str) -> Option<&NativeFn> {
        self.custom.get(name)
    }

    /// Register a method under `name`
    pub fn insert_method(&mut self, name: impl Into<String>, stub: Arc<MethodStub>) {
        self.methods.insert(name.into(), stub);
    }

    /// Look up a method by exposed name
    pub fn method(&self, name: &str) -> Option<&Arc<MethodStub>> {
        self.methods.get(name)
    }

    /// The `methods` table
    pub fn methods(&self) -> &FxHashMap<String, Arc<MethodStub>> {
        &self.methods
    }

    /// Record a field alias; ignored on non-struct tables and for empty paths
    pub fn insert_field(&mut self, name: impl Into<String>, path: FieldPath) {
        if path.is_empty() {
            return;
        }
        if let Some(fields) = self.fields.as_mut() {
            fields.insert(name.into(), path);
        }
    }

    /// Look up a field alias
    pub fn field(&self, name: &str) -> Option<&FieldPath> {
        self.fields.as_ref()?.get(name)
    }

    /// The `fields` table, present on struct tables only
    pub fn fields(&self) -> Option<&FxHashMap<String, FieldPath>> {
        self.fields.as_ref()
    }

    /// Number of registered method names
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Number of registered field names
    pub fn field_count(&self) -> usize {
        self.fields.as_ref().map_or(0, FxHashMap::len)
    }

    /// Set the protected-table marker
    pub fn set_protected(&mut self, marker: impl Into<String>) {
        self.protected = Some(marker.into());
    }

    /// The protected-table marker
    pub fn protected(&self) -> Option<&str> {
        self.protected.as_deref()
    }
}

impl fmt::Debug for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.keys().collect();
        methods.sort();
        let fields = self.fields.as_ref().map(|fields| {
            let mut names: Vec<_> = fields.keys().collect();
            names.sort();
            names
        });
        f.debug_struct("Proxy")
            .field("kind", &self.kind)
            .field("ops", &self.op_slots())
            .field("methods", &methods)
            .field("fields", &fields)
            .field("protected", &self.protected)
            .finish()
    }
}
