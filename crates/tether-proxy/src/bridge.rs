//! Engine-instance bridge
//!
//! One [`Bridge`] exists per script engine instance. It owns the engine's
//! [`Config`], created on first use, and shares the host type model and the
//! accessor layer with any other bridges.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use tether_types::{TypeContext, TypeId};
use tracing::debug;

use crate::accessor::Accessors;
use crate::builder::BuildContext;
use crate::config::{Config, ConfigOptions};
use crate::proxy::{Proxy, ProxyKind};

/// Unique identifier for a bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BridgeId(u64);

impl BridgeId {
    /// Create a new unique bridge ID
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        BridgeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for BridgeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Proxy entry points for one script engine instance
pub struct Bridge {
    id: BridgeId,
    types: Arc<TypeContext>,
    accessors: Arc<dyn Accessors>,
    options: ConfigOptions,
    config: OnceCell<Config>,
}

impl Bridge {
    /// Create a bridge with default options
    pub fn new(types: Arc<TypeContext>, accessors: Arc<dyn Accessors>) -> Self {
        Self::with_options(types, accessors, ConfigOptions::default())
    }

    /// Create a bridge whose configuration starts from `options`
    pub fn with_options(
        types: Arc<TypeContext>,
        accessors: Arc<dyn Accessors>,
        options: ConfigOptions,
    ) -> Self {
        let id = BridgeId::new();
        debug!(bridge = id.as_u64(), preprocess = options.preprocess, "created bridge");
        Self {
            id,
            types,
            accessors,
            options,
            config: OnceCell::new(),
        }
    }

    /// Bridge ID
    pub fn id(&self) -> BridgeId {
        self.id
    }

    /// Host type model
    pub fn types(&self) -> &Arc<TypeContext> {
        &self.types
    }

    /// Check if the configuration has been created yet
    pub fn has_config(&self) -> bool {
        self.config.get().is_some()
    }

    /// The configuration, created on first access
    pub fn config(&self) -> &Config {
        self.config
            .get_or_init(|| Config::from_options(self.options.clone()))
    }

    /// Mutable configuration, created on first access
    pub fn config_mut(&mut self) -> &mut Config {
        self.config();
        self.config
            .get_mut()
            .expect("config initialized by config()")
    }

    /// Build context over this bridge's state
    pub fn build_context(&self) -> BuildContext<'_> {
        BuildContext::new(&self.types, self.accessors.as_ref(), self.config())
    }

    /// Proxy for values of `ty`
    ///
    /// # Panics
    ///
    /// Panics if values of `ty` are not wrapped in proxies.
    pub fn proxy(&self, ty: TypeId) -> Option<Arc<Proxy>> {
        self.build_context().proxy(ty)
    }

    /// Proxy for wrapping a new value of `ty`
    ///
    /// Returns `None` for types whose values are passed to scripts directly.
    /// With preprocessing enabled, everything reachable from `ty` is built
    /// as well.
    pub fn new_value(&self, ty: TypeId) -> Option<Arc<Proxy>> {
        ProxyKind::of(&self.types, ty)?;
        let ctx = self.build_context();
        if ctx.config.preprocess() {
            ctx.preprocess(ty);
        }
        ctx.proxy(ty)
    }

    /// Proxy for a handle to the type `ty` itself
    pub fn new_type(&self, ty: TypeId) -> Arc<Proxy> {
        self.build_context().constructor_proxy(ty)
    }
}
