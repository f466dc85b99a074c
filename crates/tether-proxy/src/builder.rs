//! Proxy construction
//!
//! [`BuildContext`] bundles what building needs: the type model, the
//! accessor layer supplying operation stubs, and the [`Config`] holding the
//! cache and hooks. Building a type's proxy consults the cache, marks the
//! type in progress, wires in the operations for its [`ProxyKind`], adds
//! fields and methods, runs the post-processing hook and publishes.

use std::sync::Arc;

use tether_types::{TypeContext, TypeId};
use tracing::{debug, trace};

use crate::accessor::{Accessor, Accessors};
use crate::config::Config;
use crate::fields::collect_fields;
use crate::proxy::{Metamethod, Proxy, ProxyKind, ProxyRole, PROTECTED_MARKER};

/// Everything needed to build proxies for one bridge
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    /// Host type model
    pub types: &'a TypeContext,
    /// Operation stub supplier
    pub accessors: &'a dyn Accessors,
    /// Cache, hooks and options
    pub config: &'a Config,
}

impl<'a> BuildContext<'a> {
    /// Create a build context
    pub fn new(types: &'a TypeContext, accessors: &'a dyn Accessors, config: &'a Config) -> Self {
        Self {
            types,
            accessors,
            config,
        }
    }

    /// Proxy for values of `ty`, built on first request
    ///
    /// Returns `None` while `ty` is itself under construction further up the
    /// call stack.
    ///
    /// # Panics
    ///
    /// Panics if values of `ty` are not wrapped in proxies; callers check
    /// [`ProxyKind::of`] first.
    pub fn proxy(&self, ty: TypeId) -> Option<Arc<Proxy>> {
        let cache = self.config.cache();
        if let Some(proxy) = cache.get(ty) {
            trace!(ty = %self.types.name_of(ty), "proxy cache hit");
            return Some(proxy);
        }
        let Some(_guard) = cache.begin(ty) else {
            trace!(ty = %self.types.name_of(ty), "proxy already in progress");
            return None;
        };

        let kind = match ProxyKind::of(self.types, ty) {
            Some(kind) => kind,
            None => panic!(
                "unexpected kind {} for {}",
                self.types.kind(ty),
                self.types.name_of(ty)
            ),
        };

        let mut proxy = Proxy::new(kind);
        if kind == ProxyKind::Struct {
            self.add_fields(ty, &mut proxy);
        }
        self.attach_ops(kind, &mut proxy);
        self.add_methods(ty, &mut proxy, kind.ptr_receiver());

        proxy.set_op(Metamethod::ToString, self.accessors.accessor(Accessor::ToString));
        proxy.set_protected(PROTECTED_MARKER);

        let proxy = self
            .config
            .post_process(self.types, ty, proxy, ProxyRole::Value);
        debug!(
            ty = %self.types.name_of(ty),
            kind = %kind,
            fields = proxy.field_count(),
            methods = proxy.method_count(),
            "built proxy"
        );
        Some(cache.publish(ty, proxy))
    }

    /// The shared proxy for type handles, built once per configuration
    pub fn constructor_proxy(&self, ty: TypeId) -> Arc<Proxy> {
        self.config.cache().constructor(|| {
            let mut proxy = Proxy::constructor();
            proxy.set_op(Metamethod::Call, self.accessors.accessor(Accessor::TypeCall));
            proxy.set_op(Metamethod::Eq, self.accessors.accessor(Accessor::TypeEq));
            proxy.set_protected(PROTECTED_MARKER);
            debug!(ty = %self.types.name_of(ty), "built constructor proxy");
            self.config
                .post_process(self.types, ty, proxy, ProxyRole::Constructor)
        })
    }

    fn attach_ops(&self, kind: ProxyKind, proxy: &mut Proxy) {
        let ops: &[(Metamethod, Accessor)] = match kind {
            ProxyKind::Array => &[
                (Metamethod::Index, Accessor::ArrayIndex),
                (Metamethod::Len, Accessor::ArrayLen),
                (Metamethod::Call, Accessor::ArrayCall),
                (Metamethod::Eq, Accessor::ArrayEq),
            ],
            ProxyKind::Chan => &[
                (Metamethod::Index, Accessor::ChanIndex),
                (Metamethod::Len, Accessor::ChanLen),
                (Metamethod::Eq, Accessor::ChanEq),
                (Metamethod::Call, Accessor::ChanCall),
                (Metamethod::Unm, Accessor::ChanUnm),
            ],
            ProxyKind::Map => &[
                (Metamethod::Index, Accessor::MapIndex),
                (Metamethod::NewIndex, Accessor::MapNewIndex),
                (Metamethod::Len, Accessor::MapLen),
                (Metamethod::Call, Accessor::MapCall),
            ],
            ProxyKind::Slice => &[
                (Metamethod::Index, Accessor::SliceIndex),
                (Metamethod::NewIndex, Accessor::SliceNewIndex),
                (Metamethod::Len, Accessor::SliceLen),
                (Metamethod::Call, Accessor::SliceCall),
                (Metamethod::Add, Accessor::SliceAdd),
            ],
            ProxyKind::Struct => &[
                (Metamethod::Index, Accessor::StructIndex),
                (Metamethod::Eq, Accessor::StructEq),
            ],
            // array call and len work the same through a pointer
            ProxyKind::PtrArray => &[
                (Metamethod::Index, Accessor::ArrayPtrIndex),
                (Metamethod::NewIndex, Accessor::ArrayPtrNewIndex),
                (Metamethod::Call, Accessor::ArrayCall),
                (Metamethod::Len, Accessor::ArrayLen),
            ],
            ProxyKind::PtrStruct => &[
                (Metamethod::Index, Accessor::StructPtrIndex),
                (Metamethod::NewIndex, Accessor::StructPtrNewIndex),
            ],
            ProxyKind::Ptr => &[(Metamethod::Index, Accessor::PtrIndex)],
        };
        for &(slot, accessor) in ops {
            proxy.set_op(slot, self.accessors.accessor(accessor));
        }

        if kind.ptr_receiver() {
            proxy.set_op(Metamethod::Eq, self.accessors.accessor(Accessor::PtrEq));
            proxy.set_op(Metamethod::Pow, self.accessors.accessor(Accessor::PtrPow));
            proxy.set_op(Metamethod::Unm, self.accessors.accessor(Accessor::PtrUnm));
        }
    }

    fn add_fields(&self, ty: TypeId, proxy: &mut Proxy) {
        for collected in collect_fields(self.types, ty).into_values() {
            for name in self.config.field_names(self.types, ty, &collected.field) {
                proxy.insert_field(name, collected.path.clone());
            }
            self.preprocess(collected.field.ty);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::NoopAccessors;
    use tether_types::{StructField, StructType, Type};

    #[test]
    fn test_struct_proxy() {
        let mut types = TypeContext::new();
        let int = types.int_type();
        let point = types
            .named(
                "Point",
                Type::Struct(StructType::new(vec![
                    StructField::new("X", int),
                    StructField::new("Y", int).with_tag("tether", "y_axis"),
                ])),
            )
            .unwrap();
        let config = Config::new();
        let ctx = BuildContext::new(&types, &NoopAccessors, &config);

        let proxy = ctx.proxy(point).unwrap();
        assert_eq!(proxy.kind(), Some(ProxyKind::Struct));
        assert_eq!(
            proxy.op_slots(),
            vec![Metamethod::Index, Metamethod::Eq, Metamethod::ToString]
        );
        assert_eq!(proxy.protected(), Some(PROTECTED_MARKER));
        assert_eq!(proxy.field_count(), 3);
        assert_eq!(proxy.field("x").unwrap().as_slice(), &[0]);
        assert_eq!(proxy.field("y_axis").unwrap().as_slice(), &[1]);
        assert!(proxy.field("Y").is_none());
    }

    #[test]
    fn test_in_progress_returns_none() {
        let mut types = TypeContext::new();
        let int = types.int_type();
        let slice = types.slice_of(int);
        let config = Config::new();
        let ctx = BuildContext::new(&types, &NoopAccessors, &config);

        let guard = config.cache().begin(slice).unwrap();
        assert!(ctx.proxy(slice).is_none());
        drop(guard);
        assert!(ctx.proxy(slice).is_some());
    }

    #[test]
    fn test_constructor_proxy_slots() {
        let mut types = TypeContext::new();
        let int = types.int_type();
        let config = Config::new();
        let ctx = BuildContext::new(&types, &NoopAccessors, &config);

        let proxy = ctx.constructor_proxy(int);
        assert_eq!(proxy.kind(), None);
        assert_eq!(proxy.op_slots(), vec![Metamethod::Call, Metamethod::Eq]);
        assert!(proxy.methods().is_empty());
        assert!(proxy.fields().is_none());
        assert!(config.cache().is_empty());
    }
}
