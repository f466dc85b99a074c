//! Tether Proxy - behavior tables for host values exposed to scripts
//!
//! Host values handed to a script engine are wrapped in a userdata whose
//! behavior table ([`Proxy`]) decides what the script may do with them:
//! index fields, call methods, iterate, compare. This crate builds those
//! tables from the host type model in [`tether_types`], caches them per
//! engine instance, and optionally builds every reachable type's table up
//! front.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tether_proxy::{Bridge, NoopAccessors};
//! use tether_types::{StructField, StructType, Type, TypeContext};
//!
//! let mut types = TypeContext::new();
//! let int = types.int_type();
//! let point = types.named(
//!     "Point",
//!     Type::Struct(StructType::new(vec![StructField::new("X", int)])),
//! )?;
//!
//! let bridge = Bridge::new(Arc::new(types), Arc::new(NoopAccessors));
//! let proxy = bridge.new_value(point).unwrap();
//! assert!(proxy.field("x").is_some());
//! ```

#![warn(missing_docs)]

pub mod accessor;
pub mod bridge;
pub mod builder;
pub mod config;
pub mod error;
pub mod fields;
pub mod methods;
pub mod names;
pub mod preprocess;
pub mod proxy;
pub mod value;

pub use accessor::{
    catch_panics, check_arity, host_arg, integer_arg, unsupported, Accessor, AccessorTable,
    Accessors, NativeFn, NoopAccessors,
};
pub use bridge::{Bridge, BridgeId};
pub use builder::BuildContext;
pub use config::{BuildGuard, Config, ConfigOptions, PostProcessFn, ProxyCache};
pub use error::{ConfigError, NativeError, NativeResult};
pub use fields::{collect_fields, CollectedField};
pub use names::{default_field_names, default_method_names, lower_first, DEFAULT_TAG_KEY};
pub use proxy::{FieldPath, Metamethod, MethodStub, Proxy, ProxyKind, ProxyRole, PROTECTED_MARKER};
pub use value::{HostRef, ScriptValue};
