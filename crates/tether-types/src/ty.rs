//! Core type definitions for host type descriptors

use std::fmt;

use crate::method::MethodDef;

/// Unique identifier for a type in the type context
///
/// Two requests for the same host type resolve to the same `TypeId`, which
/// makes it usable as a cache key by anything built on top of the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Index of this type inside its context
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Primitive host types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    /// `bool`
    Bool,
    /// `int` (platform word)
    Int,
    /// `int8`
    Int8,
    /// `int16`
    Int16,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `uint` (platform word)
    Uint,
    /// `uint8`
    Uint8,
    /// `uint16`
    Uint16,
    /// `uint32`
    Uint32,
    /// `uint64`
    Uint64,
    /// `float32`
    Float32,
    /// `float64`
    Float64,
    /// `string`
    String,
}

impl PrimitiveType {
    /// Every primitive, in the order a fresh context registers them
    pub const ALL: [PrimitiveType; 14] = [
        PrimitiveType::Bool,
        PrimitiveType::Int,
        PrimitiveType::Int8,
        PrimitiveType::Int16,
        PrimitiveType::Int32,
        PrimitiveType::Int64,
        PrimitiveType::Uint,
        PrimitiveType::Uint8,
        PrimitiveType::Uint16,
        PrimitiveType::Uint32,
        PrimitiveType::Uint64,
        PrimitiveType::Float32,
        PrimitiveType::Float64,
        PrimitiveType::String,
    ];

    /// Host spelling of the primitive
    pub fn type_name(&self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Int => "int",
            PrimitiveType::Int8 => "int8",
            PrimitiveType::Int16 => "int16",
            PrimitiveType::Int32 => "int32",
            PrimitiveType::Int64 => "int64",
            PrimitiveType::Uint => "uint",
            PrimitiveType::Uint8 => "uint8",
            PrimitiveType::Uint16 => "uint16",
            PrimitiveType::Uint32 => "uint32",
            PrimitiveType::Uint64 => "uint64",
            PrimitiveType::Float32 => "float32",
            PrimitiveType::Float64 => "float64",
            PrimitiveType::String => "string",
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Whether a field or method can be seen from outside its declaring package
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Exported
    Public,
    /// Package-private
    Private,
}

impl Visibility {
    /// Host convention: identifiers starting with an uppercase letter are exported.
    pub fn from_name(name: &str) -> Self {
        match name.chars().next() {
            Some(c) if c.is_uppercase() => Visibility::Public,
            _ => Visibility::Private,
        }
    }
}

/// A declared struct field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    /// Field name (for embedded fields, the name of the embedded type)
    pub name: String,
    /// Field type
    pub ty: TypeId,
    /// Field visibility
    pub visibility: Visibility,
    /// Whether the field is embedded (anonymous)
    pub embedded: bool,
    /// Field tags in declaration order: `key -> value`
    pub tags: Vec<(String, String)>,
}

impl StructField {
    /// Create a named field; visibility follows the host naming convention
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        let name = name.into();
        Self {
            visibility: Visibility::from_name(&name),
            name,
            ty,
            embedded: false,
            tags: Vec::new(),
        }
    }

    /// Create an embedded field; `name` is the embedded type's name
    pub fn embedded(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            embedded: true,
            ..Self::new(name, ty)
        }
    }

    /// Attach a tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// Force the field to be exported
    pub fn public(mut self) -> Self {
        self.visibility = Visibility::Public;
        self
    }

    /// Force the field to be package-private
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Look up a tag value; the first tag with a matching key wins
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the field is exported
    pub fn is_exported(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// Struct type: `struct { A T; B U }`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructType {
    /// Fields in declaration order
    pub fields: Vec<StructField>,
}

impl StructType {
    /// Create a struct type from its fields
    pub fn new(fields: Vec<StructField>) -> Self {
        Self { fields }
    }
}

/// Function type: `func(P1, P2) (R1, R2)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunctionType {
    /// Parameter types
    pub params: Vec<TypeId>,
    /// Result types
    pub results: Vec<TypeId>,
    /// Whether the last parameter is variadic
    pub variadic: bool,
}

/// Interface type
///
/// Interfaces never get proxies of their own, but embedding one in a struct
/// promotes every method listed here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceType {
    /// Methods required by the interface. Receivers are ignored
    pub methods: Vec<MethodDef>,
}

impl InterfaceType {
    /// Create an interface from its method signatures
    pub fn new(methods: Vec<MethodDef>) -> Self {
        Self { methods }
    }
}

/// Channel direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

/// The structural shape of a host type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Named type that was declared but not yet defined
    Unresolved,

    /// Primitive type
    Primitive(PrimitiveType),

    /// Interface type
    Interface(InterfaceType),

    /// Function type
    Func(FunctionType),

    /// Struct type
    Struct(StructType),

    /// Slice: `[]T`
    Slice {
        /// Element type
        elem: TypeId,
    },

    /// Fixed-size array: `[N]T`
    Array {
        /// Element type
        elem: TypeId,
        /// Number of elements
        len: usize,
    },

    /// Map: `map[K]V`
    Map {
        /// Key type
        key: TypeId,
        /// Value type
        value: TypeId,
    },

    /// Channel: `chan T`
    Chan {
        /// Element type
        elem: TypeId,
        /// Direction
        dir: ChanDir,
    },

    /// Pointer: `*T`
    Pointer {
        /// Pointed-to type
        elem: TypeId,
    },
}

impl Type {
    /// Structural kind of this type
    pub fn kind(&self) -> TypeKind {
        match self {
            Type::Unresolved => TypeKind::Invalid,
            Type::Primitive(_) => TypeKind::Primitive,
            Type::Interface(_) => TypeKind::Interface,
            Type::Func(_) => TypeKind::Func,
            Type::Struct(_) => TypeKind::Struct,
            Type::Slice { .. } => TypeKind::Slice,
            Type::Array { .. } => TypeKind::Array,
            Type::Map { .. } => TypeKind::Map,
            Type::Chan { .. } => TypeKind::Chan,
            Type::Pointer { .. } => TypeKind::Pointer,
        }
    }
}

/// Kind tag of a [`Type`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Unresolved or unknown type
    Invalid,
    /// Primitive
    Primitive,
    /// Interface
    Interface,
    /// Function
    Func,
    /// Struct
    Struct,
    /// Slice
    Slice,
    /// Array
    Array,
    /// Map
    Map,
    /// Channel
    Chan,
    /// Pointer
    Pointer,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::Invalid => "invalid",
            TypeKind::Primitive => "primitive",
            TypeKind::Interface => "interface",
            TypeKind::Func => "func",
            TypeKind::Struct => "struct",
            TypeKind::Slice => "slice",
            TypeKind::Array => "array",
            TypeKind::Map => "map",
            TypeKind::Chan => "chan",
            TypeKind::Pointer => "ptr",
        };
        f.write_str(name)
    }
}

/// A registered type: its shape, optional name and declared methods
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Name for named types, `None` for structural ones
    pub name: Option<String>,
    /// Underlying shape
    pub ty: Type,
    /// Methods declared directly on this named type
    pub methods: Vec<MethodDef>,
}

impl TypeDef {
    pub(crate) fn anonymous(ty: Type) -> Self {
        Self {
            name: None,
            ty,
            methods: Vec::new(),
        }
    }

    pub(crate) fn named(name: String) -> Self {
        Self {
            name: Some(name),
            ty: Type::Unresolved,
            methods: Vec::new(),
        }
    }

    /// Whether this is a named type
    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }
}
