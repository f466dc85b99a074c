//! Method descriptors and method-set entries

use crate::ty::{TypeId, Visibility};

/// How a method receives its receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// `func (t T) M()`
    Value,
    /// `func (t *T) M()`
    Pointer,
}

/// A method declared on a named type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Receiver convention
    pub receiver: Receiver,
    /// Parameter types, receiver excluded
    pub params: Vec<TypeId>,
    /// Result types
    pub results: Vec<TypeId>,
    /// Method visibility
    pub visibility: Visibility,
    /// Host function implementing the method, resolved by the accessor layer
    pub function_id: usize,
}

impl MethodDef {
    /// Create a value-receiver method with no parameters or results
    pub fn new(name: impl Into<String>, function_id: usize) -> Self {
        let name = name.into();
        Self {
            visibility: Visibility::from_name(&name),
            name,
            receiver: Receiver::Value,
            params: Vec::new(),
            results: Vec::new(),
            function_id,
        }
    }

    /// Switch to a pointer receiver
    pub fn on_pointer(mut self) -> Self {
        self.receiver = Receiver::Pointer;
        self
    }

    /// Add a parameter
    pub fn with_param(mut self, ty: TypeId) -> Self {
        self.params.push(ty);
        self
    }

    /// Add a result
    pub fn returns(mut self, ty: TypeId) -> Self {
        self.results.push(ty);
        self
    }

    /// Whether the method is exported
    pub fn is_exported(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Parameter and result types in signature order
    pub fn signature_types(&self) -> impl Iterator<Item = TypeId> + '_ {
        self.params.iter().chain(self.results.iter()).copied()
    }
}

/// One entry of a type's method set
///
/// Declared methods have an empty `path`; promoted methods carry the field
/// indices leading from the receiver to the embedded value that declares them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    /// The method declaration
    pub def: MethodDef,
    /// Named type that declares the method
    pub owner: TypeId,
    /// Embedding path from the receiver to `owner`
    pub path: Vec<usize>,
}

impl Method {
    /// Method name
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Whether the method was promoted from an embedded field
    pub fn is_promoted(&self) -> bool {
        !self.path.is_empty()
    }
}
