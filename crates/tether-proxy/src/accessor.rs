//! Accessors: the boundary to the low-level operation layer
//!
//! Proxies only decide *which* operation a value of a given kind supports;
//! the value-level implementation of each one lives behind this interface.
//! The builder asks for one [`NativeFn`] per [`Accessor`] it wires in, and
//! asks the layer to wrap every exported method as a callable stub.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tether_types::{Method, TypeContext};

use crate::error::{NativeError, NativeResult};
use crate::value::{HostRef, ScriptValue};

/// Callable stub invoked by the script engine
pub type NativeFn = Arc<dyn Fn(&[ScriptValue]) -> NativeResult<Vec<ScriptValue>> + Send + Sync>;

/// Wraps a host method as a callable stub
pub type MethodBinderFn = Arc<dyn Fn(&TypeContext, &Method, bool) -> NativeFn + Send + Sync>;

/// Every operation implementation the builder can wire into a proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accessor {
    /// Element read on an array value
    ArrayIndex,
    /// Length of an array
    ArrayLen,
    /// Iteration over an array
    ArrayCall,
    /// Array equality
    ArrayEq,
    /// Receive/close helpers on a channel
    ChanIndex,
    /// Buffered element count of a channel
    ChanLen,
    /// Channel identity
    ChanEq,
    /// Iteration over a channel
    ChanCall,
    /// Receive from a channel
    ChanUnm,
    /// Key lookup on a map
    MapIndex,
    /// Key store on a map
    MapNewIndex,
    /// Entry count of a map
    MapLen,
    /// Iteration over a map
    MapCall,
    /// Element read on a slice
    SliceIndex,
    /// Element store on a slice
    SliceNewIndex,
    /// Length of a slice
    SliceLen,
    /// Iteration over a slice
    SliceCall,
    /// Append to a slice
    SliceAdd,
    /// Field or method lookup on a struct value
    StructIndex,
    /// Struct equality
    StructEq,
    /// Element read through a pointer to an array
    ArrayPtrIndex,
    /// Element store through a pointer to an array
    ArrayPtrNewIndex,
    /// Field or method lookup through a pointer to a struct
    StructPtrIndex,
    /// Field store through a pointer to a struct
    StructPtrNewIndex,
    /// Method lookup on any other pointer
    PtrIndex,
    /// Pointer identity
    PtrEq,
    /// Store through a pointer
    PtrPow,
    /// Dereference a pointer
    PtrUnm,
    /// String conversion shared by every kind
    ToString,
    /// Instantiate a new value from a type handle
    TypeCall,
    /// Type handle equality
    TypeEq,
}

impl Accessor {
    /// Every accessor
    pub const ALL: [Accessor; 31] = [
        Accessor::ArrayIndex,
        Accessor::ArrayLen,
        Accessor::ArrayCall,
        Accessor::ArrayEq,
        Accessor::ChanIndex,
        Accessor::ChanLen,
        Accessor::ChanEq,
        Accessor::ChanCall,
        Accessor::ChanUnm,
        Accessor::MapIndex,
        Accessor::MapNewIndex,
        Accessor::MapLen,
        Accessor::MapCall,
        Accessor::SliceIndex,
        Accessor::SliceNewIndex,
        Accessor::SliceLen,
        Accessor::SliceCall,
        Accessor::SliceAdd,
        Accessor::StructIndex,
        Accessor::StructEq,
        Accessor::ArrayPtrIndex,
        Accessor::ArrayPtrNewIndex,
        Accessor::StructPtrIndex,
        Accessor::StructPtrNewIndex,
        Accessor::PtrIndex,
        Accessor::PtrEq,
        Accessor::PtrPow,
        Accessor::PtrUnm,
        Accessor::ToString,
        Accessor::TypeCall,
        Accessor::TypeEq,
    ];

    /// Symbolic name, as used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Accessor::ArrayIndex => "arrayIndex",
            Accessor::ArrayLen => "arrayLen",
            Accessor::ArrayCall => "arrayCall",
            Accessor::ArrayEq => "arrayEq",
            Accessor::ChanIndex => "chanIndex",
            Accessor::ChanLen => "chanLen",
            Accessor::ChanEq => "chanEq",
            Accessor::ChanCall => "chanCall",
            Accessor::ChanUnm => "chanUnm",
            Accessor::MapIndex => "mapIndex",
            Accessor::MapNewIndex => "mapNewIndex",
            Accessor::MapLen => "mapLen",
            Accessor::MapCall => "mapCall",
            Accessor::SliceIndex => "sliceIndex",
            Accessor::SliceNewIndex => "sliceNewIndex",
            Accessor::SliceLen => "sliceLen",
            Accessor::SliceCall => "sliceCall",
            Accessor::SliceAdd => "sliceAdd",
            Accessor::StructIndex => "structIndex",
            Accessor::StructEq => "structEq",
            Accessor::ArrayPtrIndex => "arrayPtrIndex",
            Accessor::ArrayPtrNewIndex => "arrayPtrNewIndex",
            Accessor::StructPtrIndex => "structPtrIndex",
            Accessor::StructPtrNewIndex => "structPtrNewIndex",
            Accessor::PtrIndex => "ptrIndex",
            Accessor::PtrEq => "ptrEq",
            Accessor::PtrPow => "ptrPow",
            Accessor::PtrUnm => "ptrUnm",
            Accessor::ToString => "tostring",
            Accessor::TypeCall => "typeCall",
            Accessor::TypeEq => "typeEq",
        }
    }
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Trait implemented by the low-level operation layer
///
/// Implementors hand out the stub behind every [`Accessor`] and wrap host
/// methods. Both are called at proxy construction time only; the returned
/// stubs are what the script engine invokes later.
pub trait Accessors: Send + Sync {
    /// Stub implementing `accessor`
    fn accessor(&self, accessor: Accessor) -> NativeFn;

    /// Wrap `method` as a stub; `ptr_receiver` tells the stub whether the
    /// receiver arrives as a pointer or by value
    fn bind_method(&self, types: &TypeContext, method: &Method, ptr_receiver: bool) -> NativeFn;
}

/// Stub that fails with [`NativeError::Unsupported`]
pub fn unsupported(what: impl Into<String>) -> NativeFn {
    let what = what.into();
    Arc::new(move |_args: &[ScriptValue]| -> NativeResult<Vec<ScriptValue>> {
        Err(NativeError::Unsupported(what.clone()))
    })
}

/// Fail unless a stub received exactly `expected` arguments
pub fn check_arity(what: &str, args: &[ScriptValue], expected: usize) -> NativeResult<()> {
    if args.len() != expected {
        return Err(NativeError::ArgumentError(format!(
            "{} expects {} arguments, got {}",
            what,
            expected,
            args.len()
        )));
    }
    Ok(())
}

fn arg(args: &[ScriptValue], index: usize) -> NativeResult<&ScriptValue> {
    args.get(index)
        .ok_or_else(|| NativeError::ArgumentError(format!("missing argument {}", index)))
}

/// Read argument `index` as a host value
pub fn host_arg(args: &[ScriptValue], index: usize) -> NativeResult<HostRef> {
    let value = arg(args, index)?;
    value.as_host().ok_or_else(|| NativeError::TypeMismatch {
        expected: "userdata".to_string(),
        got: value.type_name().to_string(),
    })
}

/// Read argument `index` as an integer
pub fn integer_arg(args: &[ScriptValue], index: usize) -> NativeResult<i64> {
    let value = arg(args, index)?;
    value.as_integer().ok_or_else(|| NativeError::TypeMismatch {
        expected: "integer".to_string(),
        got: value.type_name().to_string(),
    })
}

/// Wrap a stub so that a panic inside it surfaces as [`NativeError::Panic`]
pub fn catch_panics(stub: NativeFn) -> NativeFn {
    Arc::new(move |args: &[ScriptValue]| -> NativeResult<Vec<ScriptValue>> {
        panic::catch_unwind(AssertUnwindSafe(|| stub(args)))
            .unwrap_or_else(|payload| Err(NativeError::Panic(panic_message(payload.as_ref()))))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// An accessor layer with nothing registered
pub struct NoopAccessors;

impl Accessors for NoopAccessors {
    fn accessor(&self, accessor: Accessor) -> NativeFn {
        unsupported(accessor.name())
    }

    fn bind_method(&self, _types: &TypeContext, method: &Method, _ptr_receiver: bool) -> NativeFn {
        unsupported(method.def.name.clone())
    }
}

/// Registry of accessor stubs indexed by [`Accessor`].
///
/// Anything not registered resolves to an [`unsupported`] stub, so a
/// partially populated table still yields complete proxies. Registered and
/// bound stubs are wrapped with [`catch_panics`].
pub struct AccessorTable {
    handlers: FxHashMap<Accessor, NativeFn>,
    method_binder: Option<MethodBinderFn>,
}

impl AccessorTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self {
            handlers: FxHashMap::default(),
            method_binder: None,
        }
    }

    /// Register the stub for an accessor
    pub fn register(
        &mut self,
        accessor: Accessor,
        handler: impl Fn(&[ScriptValue]) -> NativeResult<Vec<ScriptValue>> + Send + Sync + 'static,
    ) {
        self.handlers.insert(accessor, catch_panics(Arc::new(handler)));
    }

    /// Install the function wrapping host methods
    pub fn set_method_binder(
        &mut self,
        binder: impl Fn(&TypeContext, &Method, bool) -> NativeFn + Send + Sync + 'static,
    ) {
        self.method_binder = Some(Arc::new(binder));
    }

    /// Get a registered stub
    pub fn get(&self, accessor: Accessor) -> Option<NativeFn> {
        self.handlers.get(&accessor).cloned()
    }

    /// Check if a stub is registered
    pub fn contains(&self, accessor: Accessor) -> bool {
        self.handlers.contains_key(&accessor)
    }

    /// Get the number of registered stubs
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for AccessorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Accessors for AccessorTable {
    fn accessor(&self, accessor: Accessor) -> NativeFn {
        self.get(accessor)
            .unwrap_or_else(|| unsupported(accessor.name()))
    }

    fn bind_method(&self, types: &TypeContext, method: &Method, ptr_receiver: bool) -> NativeFn {
        match &self.method_binder {
            Some(binder) => catch_panics(binder(types, method, ptr_receiver)),
            None => unsupported(method.def.name.clone()),
        }
    }
}
