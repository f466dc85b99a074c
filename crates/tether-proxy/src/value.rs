//! ScriptValue: the value handle exchanged between the script engine and
//! host accessors
//!
//! Primitive values travel inline. Host values never cross the boundary
//! themselves: the engine holds a [`HostRef`] naming the value's type and an
//! opaque slot the accessor layer knows how to resolve.

use std::fmt;
use std::sync::Arc;

use tether_types::TypeId;

/// Reference to a host value owned by the accessor layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostRef {
    /// Host type of the referenced value
    pub ty: TypeId,
    /// Opaque slot, meaningful only to the accessor layer
    pub slot: u64,
}

/// Value passed to and returned from operation stubs
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScriptValue {
    /// `nil`
    #[default]
    Nil,
    /// Boolean
    Bool(bool),
    /// Integer
    Integer(i64),
    /// Floating point number
    Number(f64),
    /// Immutable string
    String(Arc<str>),
    /// Host value wrapped in a proxy
    Host(HostRef),
}

impl ScriptValue {
    /// Create a string value
    pub fn string(s: impl AsRef<str>) -> Self {
        ScriptValue::String(Arc::from(s.as_ref()))
    }

    /// Check if this is `nil`
    pub fn is_nil(&self) -> bool {
        matches!(self, ScriptValue::Nil)
    }

    /// Get as boolean if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer if this is an integer
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ScriptValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as number; integers widen
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            ScriptValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as string slice if this is a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the host reference if this wraps a host value
    pub fn as_host(&self) -> Option<HostRef> {
        match self {
            ScriptValue::Host(r) => Some(*r),
            _ => None,
        }
    }

    /// Script-facing type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Nil => "nil",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Integer(_) | ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Host(_) => "userdata",
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Nil => f.write_str("nil"),
            ScriptValue::Bool(b) => write!(f, "{}", b),
            ScriptValue::Integer(i) => write!(f, "{}", i),
            ScriptValue::Number(n) => write!(f, "{}", n),
            ScriptValue::String(s) => f.write_str(s),
            ScriptValue::Host(r) => write!(f, "userdata: {}#{}", r.ty, r.slot),
        }
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        ScriptValue::Bool(b)
    }
}

impl From<i64> for ScriptValue {
    fn from(i: i64) -> Self {
        ScriptValue::Integer(i)
    }
}

impl From<f64> for ScriptValue {
    fn from(n: f64) -> Self {
        ScriptValue::Number(n)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        ScriptValue::string(s)
    }
}

impl From<HostRef> for ScriptValue {
    fn from(r: HostRef) -> Self {
        ScriptValue::Host(r)
    }
}
