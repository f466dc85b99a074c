//! Per-engine proxy configuration and cache
//!
//! A [`Config`] owns everything a bridge remembers between proxy requests:
//! the published proxies, the set of types under construction, the naming
//! overrides, the post-processing hook and the eager preprocessing flag.

use std::cell::RefCell;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use tether_types::{Method, StructField, TypeContext, TypeId};

use crate::error::ConfigError;
use crate::names::{
    default_field_names, default_method_names, FieldNamesFn, MethodNamesFn, DEFAULT_TAG_KEY,
};
use crate::proxy::{Proxy, ProxyRole};

/// Post-processing hook
///
/// Called once per built proxy with the table about to be published. The
/// hook may edit it in place; a returned proxy replaces it entirely.
pub type PostProcessFn = Box<dyn Fn(&TypeContext, TypeId, &mut Proxy, ProxyRole) -> Option<Proxy>>;

/// Data options of a [`Config`], loadable from TOML
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOptions {
    /// Build every reachable type's proxy when a value is first wrapped
    pub preprocess: bool,
    /// Tag key consulted by default field naming
    pub tag_key: String,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            preprocess: false,
            tag_key: DEFAULT_TAG_KEY.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct Document {
    #[serde(default)]
    proxy: ConfigOptions,
}

impl ConfigOptions {
    /// Read options from the `[proxy]` table of a TOML document
    ///
    /// Other top-level tables are ignored; a missing `[proxy]` table yields
    /// the defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let doc: Document = toml::from_str(source)?;
        if doc.proxy.tag_key.is_empty() {
            return Err(ConfigError::EmptyTagKey);
        }
        Ok(doc.proxy)
    }
}

/// Published proxies and types under construction
#[derive(Default)]
pub struct ProxyCache {
    published: RefCell<FxHashMap<TypeId, Arc<Proxy>>>,
    processing: RefCell<FxHashSet<TypeId>>,
    constructor: OnceCell<Arc<Proxy>>,
}

impl ProxyCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Published proxy for `ty`; never builds
    pub fn get(&self, ty: TypeId) -> Option<Arc<Proxy>> {
        self.published.borrow().get(&ty).cloned()
    }

    /// Mark `ty` as under construction
    ///
    /// Returns `None` if it already is. The mark is cleared when the guard
    /// drops.
    pub fn begin(&self, ty: TypeId) -> Option<BuildGuard<'_>> {
        if !self.processing.borrow_mut().insert(ty) {
            return None;
        }
        Some(BuildGuard {
            processing: &self.processing,
            ty,
        })
    }

    /// Check if `ty` is under construction
    pub fn is_in_progress(&self, ty: TypeId) -> bool {
        self.processing.borrow().contains(&ty)
    }

    /// Store the finished proxy for `ty`
    pub fn publish(&self, ty: TypeId, proxy: Proxy) -> Arc<Proxy> {
        let proxy = Arc::new(proxy);
        self.published.borrow_mut().insert(ty, Arc::clone(&proxy));
        proxy
    }

    /// The constructor proxy, built by `init` on first use
    pub fn constructor(&self, init: impl FnOnce() -> Proxy) -> Arc<Proxy> {
        Arc::clone(self.constructor.get_or_init(|| Arc::new(init())))
    }

    /// Check if the constructor proxy has been built
    pub fn has_constructor(&self) -> bool {
        self.constructor.get().is_some()
    }

    /// Check if a proxy is published for `ty`
    pub fn contains(&self, ty: TypeId) -> bool {
        self.published.borrow().contains_key(&ty)
    }

    /// Number of published proxies
    pub fn len(&self) -> usize {
        self.published.borrow().len()
    }

    /// Check if nothing is published
    pub fn is_empty(&self) -> bool {
        self.published.borrow().is_empty()
    }
}

/// In-progress mark for one type
pub struct BuildGuard<'a> {
    processing: &'a RefCell<FxHashSet<TypeId>>,
    ty: TypeId,
}

impl BuildGuard<'_> {
    /// The type under construction
    pub fn ty(&self) -> TypeId {
        self.ty
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        self.processing.borrow_mut().remove(&self.ty);
    }
}

/// Proxy configuration for one engine instance
pub struct Config {
    cache: ProxyCache,
    field_names: Option<FieldNamesFn>,
    method_names: Option<MethodNamesFn>,
    post_process: Option<PostProcessFn>,
    options: ConfigOptions,
}

impl Config {
    /// Create a configuration with default options
    pub fn new() -> Self {
        Self::from_options(ConfigOptions::default())
    }

    /// Create a configuration from data options
    pub fn from_options(options: ConfigOptions) -> Self {
        Self {
            cache: ProxyCache::new(),
            field_names: None,
            method_names: None,
            post_process: None,
            options,
        }
    }

    /// Replace default field naming
    pub fn set_field_names(
        &mut self,
        names: impl Fn(&TypeContext, TypeId, &StructField) -> Vec<String> + 'static,
    ) {
        self.field_names = Some(Box::new(names));
    }

    /// Replace default method naming
    pub fn set_method_names(
        &mut self,
        names: impl Fn(&TypeContext, TypeId, &Method) -> Vec<String> + 'static,
    ) {
        self.method_names = Some(Box::new(names));
    }

    /// Install the post-processing hook
    pub fn set_post_process(
        &mut self,
        hook: impl Fn(&TypeContext, TypeId, &mut Proxy, ProxyRole) -> Option<Proxy> + 'static,
    ) {
        self.post_process = Some(Box::new(hook));
    }

    /// Enable or disable eager preprocessing
    pub fn set_preprocess(&mut self, enabled: bool) {
        self.options.preprocess = enabled;
    }

    /// Whether eager preprocessing is enabled
    pub fn preprocess(&self) -> bool {
        self.options.preprocess
    }

    /// Set the tag key consulted by default field naming
    pub fn set_tag_key(&mut self, key: impl Into<String>) {
        self.options.tag_key = key.into();
    }

    /// Tag key consulted by default field naming
    pub fn tag_key(&self) -> &str {
        &self.options.tag_key
    }

    /// Current data options
    pub fn options(&self) -> &ConfigOptions {
        &self.options
    }

    /// The proxy cache
    pub fn cache(&self) -> &ProxyCache {
        &self.cache
    }

    /// Names `field` of `owner` is exposed under
    pub fn field_names(&self, types: &TypeContext, owner: TypeId, field: &StructField) -> Vec<String> {
        match &self.field_names {
            Some(names) => names(types, owner, field),
            None => default_field_names(&self.options.tag_key, field),
        }
    }

    /// Names `method` of `receiver` is exposed under
    pub fn method_names(&self, types: &TypeContext, receiver: TypeId, method: &Method) -> Vec<String> {
        match &self.method_names {
            Some(names) => names(types, receiver, method),
            None => default_method_names(method),
        }
    }

    /// Run the post-processing hook on a proxy about to be published
    pub(crate) fn post_process(
        &self,
        types: &TypeContext,
        ty: TypeId,
        mut proxy: Proxy,
        role: ProxyRole,
    ) -> Proxy {
        match &self.post_process {
            Some(hook) => hook(types, ty, &mut proxy, role).unwrap_or(proxy),
            None => proxy,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
