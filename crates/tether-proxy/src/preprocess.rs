//! Eager preprocessing
//!
//! With preprocessing enabled, wrapping a value builds the proxy of every
//! type reachable from it: field types, method signature types, and the
//! element and key types of containers. Later wraps of those types are
//! cache hits.

use rustc_hash::FxHashSet;
use tether_types::{Type, TypeId};

use crate::builder::BuildContext;
use crate::proxy::ProxyKind;

impl BuildContext<'_> {
    /// Build proxies for `ty` and everything reachable from it
    ///
    /// Does nothing when preprocessing is disabled or values of `ty` are not
    /// wrapped in proxies. A type already under construction is skipped, but
    /// its element types are still visited.
    pub fn preprocess(&self, ty: TypeId) {
        let mut visited = FxHashSet::default();
        self.walk(ty, &mut visited);
    }

    fn walk(&self, ty: TypeId, visited: &mut FxHashSet<TypeId>) {
        if !self.config.preprocess() || ProxyKind::of(self.types, ty).is_none() {
            return;
        }
        // `type T []T` would otherwise descend forever
        if !visited.insert(ty) {
            return;
        }

        self.proxy(ty);

        match self.types.ty(ty) {
            Some(Type::Pointer { elem })
            | Some(Type::Slice { elem })
            | Some(Type::Array { elem, .. })
            | Some(Type::Chan { elem, .. }) => self.walk(*elem, visited),
            Some(Type::Map { key, value }) => {
                self.walk(*key, visited);
                self.walk(*value, visited);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::accessor::NoopAccessors;
    use crate::builder::BuildContext;
    use crate::config::Config;
    use tether_types::{Type, TypeContext};

    #[test]
    fn test_disabled_builds_nothing() {
        let mut types = TypeContext::new();
        let int = types.int_type();
        let slice = types.slice_of(int);
        let config = Config::new();
        BuildContext::new(&types, &NoopAccessors, &config).preprocess(slice);
        assert!(config.cache().is_empty());
    }

    #[test]
    fn test_non_container_ignored() {
        let mut types = TypeContext::new();
        let int = types.int_type();
        let mut config = Config::new();
        config.set_preprocess(true);
        BuildContext::new(&types, &NoopAccessors, &config).preprocess(int);
        assert!(config.cache().is_empty());
    }

    #[test]
    fn test_map_key_and_value() {
        let mut types = TypeContext::new();
        let int = types.int_type();
        let key = types.array_of(int, 2);
        let value = types.slice_of(int);
        let map = types.map_of(key, value);
        let mut config = Config::new();
        config.set_preprocess(true);

        BuildContext::new(&types, &NoopAccessors, &config).preprocess(map);
        assert_eq!(config.cache().len(), 3);
        assert!(config.cache().contains(key));
        assert!(config.cache().contains(value));
    }

    #[test]
    fn test_self_referential_slice_terminates() {
        let mut types = TypeContext::new();
        let tree = types.declare("Tree").unwrap();
        let children = types.slice_of(tree);
        types.define(tree, Type::Slice { elem: children }).unwrap();
        let mut config = Config::new();
        config.set_preprocess(true);

        BuildContext::new(&types, &NoopAccessors, &config).preprocess(tree);
        assert_eq!(config.cache().len(), 2);
    }
}
