//! Tether Type Model
//!
//! Descriptors for the host types a script may see: primitives, structs with
//! tagged and embedded fields, containers, pointers, and methods declared on
//! named types. A [`TypeContext`] interns them behind copyable [`TypeId`]s.

#![warn(missing_docs)]

pub mod context;
pub mod error;
pub mod method;
pub mod ty;

pub use context::TypeContext;
pub use error::TypeError;
pub use method::{Method, MethodDef, Receiver};
pub use ty::{
    ChanDir, FunctionType, InterfaceType, PrimitiveType, StructField, StructType, Type, TypeDef,
    TypeId, TypeKind, Visibility,
};
