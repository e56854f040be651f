use crate::factory::{PackageResolverFactory, ResolverFactory};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Keys read from a plugin's per-type metadata.
pub mod metadata {
    /// String list of URI schemes a resolver serves.
    pub const URI_SCHEMES: &str = "uriSchemes";
    /// String list of file extensions a package resolver serves.
    pub const EXTENSIONS: &str = "extensions";
    /// Boolean, the resolver implements the context operations.
    pub const IMPLEMENTS_CONTEXTS: &str = "implementsContexts";
    /// Boolean, the resolver implements scoped caching itself.
    pub const IMPLEMENTS_SCOPED_CACHES: &str = "implementsScopedCaches";
}

/// Registered name of a resolver implementation type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(SmolStr);

impl TypeName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl PartialEq<str> for TypeName {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// The two resolver capabilities a type can implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityKind {
    Resolver,
    PackageResolver,
}

impl CapabilityKind {
    /// Name of the abstract root type every implementation derives from.
    pub fn root_type(self) -> TypeName {
        match self {
            CapabilityKind::Resolver => TypeName::new("Resolver"),
            CapabilityKind::PackageResolver => TypeName::new("PackageResolver"),
        }
    }
}

/// Type registry used to enumerate resolver implementations.
///
/// Enumeration order is not meaningful; callers sort.
pub trait TypeRegistry: Send + Sync {
    /// Every concrete type implementing `capability`.
    fn find_all_implementing(&self, capability: CapabilityKind) -> Vec<TypeName>;

    /// Whether `ty` is registered and derives from the root of `capability`.
    fn implements(&self, ty: &TypeName, capability: CapabilityKind) -> bool;

    fn find_by_name(&self, name: &str) -> Option<TypeName>;

    /// Direct base types of `ty`.
    fn base_types(&self, ty: &TypeName) -> Vec<TypeName>;

    fn resolver_factory(&self, ty: &TypeName) -> Option<Arc<dyn ResolverFactory>>;

    fn package_resolver_factory(&self, ty: &TypeName) -> Option<Arc<dyn PackageResolverFactory>>;
}

/// Locates and loads the plugin that provides a type.
pub trait PluginSource: Send + Sync {
    fn find_owning_plugin(&self, ty: &TypeName) -> Option<Arc<dyn PluginHandle>>;
}

/// A loadable plugin module.
pub trait PluginHandle: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn path(&self) -> Option<&Path> {
        None
    }

    /// Load the plugin. Returns `false` if loading failed.
    fn load(&self) -> bool;

    fn is_loaded(&self) -> bool;

    /// Metadata declared by the plugin for `ty`.
    fn metadata_for(&self, ty: &TypeName) -> serde_json::Map<String, serde_json::Value>;
}
