//! Type model errors

use thiserror::Error;

use crate::ty::TypeId;

/// Errors that can occur while describing the host type graph
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TypeError {
    /// A `TypeId` that does not belong to this context
    #[error("Unknown type: {id}")]
    UnknownType {
        /// Offending id
        id: TypeId,
    },

    /// Named type defined twice
    #[error("Type already defined: {name}")]
    AlreadyDefined {
        /// Type name
        name: String,
    },

    /// Two named types with the same name
    #[error("Duplicate type name: {name}")]
    DuplicateName {
        /// Type name
        name: String,
    },

    /// Named type declared but never given an underlying type
    #[error("Type {name} was declared but never defined")]
    Unresolved {
        /// Type name
        name: String,
    },

    /// Two methods with the same name on one type
    #[error("Duplicate method {method} on {ty}")]
    DuplicateMethod {
        /// Receiver type name
        ty: String,
        /// Method name
        method: String,
    },

    /// Methods can only be declared on named, non-pointer, non-interface types
    #[error("Invalid receiver type {ty}: {reason}")]
    InvalidReceiver {
        /// Receiver type name
        ty: String,
        /// Reason for rejection
        reason: String,
    },
}
