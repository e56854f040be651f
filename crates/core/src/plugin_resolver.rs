use crate::error::CatalogError;
use assetres_plugin::{
    CapabilityKind, PackageResolver, PluginHandle, Resolver, TypeName, TypeRegistry,
};
use once_cell::sync::OnceCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A capability a plugin type can be instantiated as.
pub trait Capability: Send + Sync + 'static {
    type Instance: ?Sized + Send + Sync;

    const KIND: CapabilityKind;

    fn manufacture(registry: &dyn TypeRegistry, ty: &TypeName) -> Option<Arc<Self::Instance>>;
}

pub struct ResolverCapability;

impl Capability for ResolverCapability {
    type Instance = dyn Resolver;

    const KIND: CapabilityKind = CapabilityKind::Resolver;

    fn manufacture(registry: &dyn TypeRegistry, ty: &TypeName) -> Option<Arc<dyn Resolver>> {
        registry.resolver_factory(ty)?.create()
    }
}

pub struct PackageResolverCapability;

impl Capability for PackageResolverCapability {
    type Instance = dyn PackageResolver;

    const KIND: CapabilityKind = CapabilityKind::PackageResolver;

    fn manufacture(
        registry: &dyn TypeRegistry,
        ty: &TypeName,
    ) -> Option<Arc<dyn PackageResolver>> {
        registry.package_resolver_factory(ty)?.create()
    }
}

/// Lazily loads a plugin and builds one instance of a resolver type.
///
/// The instance is built at most once, even when many threads call
/// [`get`](Self::get) at the same time; the losers block until the winner
/// has finished and then share its result. A failed construction is
/// remembered too.
pub struct PluginResolver<C: Capability> {
    plugin: Arc<dyn PluginHandle>,
    type_name: TypeName,
    registry: Arc<dyn TypeRegistry>,
    instance: OnceCell<Option<Arc<C::Instance>>>,
    _capability: PhantomData<C>,
}

pub type PluginBackend = PluginResolver<ResolverCapability>;
pub type PluginPackageBackend = PluginResolver<PackageResolverCapability>;

impl<C: Capability> PluginResolver<C> {
    pub fn new(
        plugin: Arc<dyn PluginHandle>,
        type_name: TypeName,
        registry: Arc<dyn TypeRegistry>,
    ) -> Self {
        Self {
            plugin,
            type_name,
            registry,
            instance: OnceCell::new(),
            _capability: PhantomData,
        }
    }

    /// Wrap an instance that already exists, so it is never built again.
    pub fn with_instance(
        plugin: Arc<dyn PluginHandle>,
        type_name: TypeName,
        registry: Arc<dyn TypeRegistry>,
        instance: Arc<C::Instance>,
    ) -> Self {
        Self {
            plugin,
            type_name,
            registry,
            instance: OnceCell::with_value(Some(instance)),
            _capability: PhantomData,
        }
    }

    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    pub fn plugin(&self) -> &Arc<dyn PluginHandle> {
        &self.plugin
    }

    /// Load the plugin and build a fresh instance, bypassing the cached one.
    pub fn create(&self) -> Result<Arc<C::Instance>, CatalogError> {
        if !self.plugin.load() {
            return Err(CatalogError::PluginLoad {
                plugin: self.plugin.name().to_string(),
                ty: self.type_name.clone(),
            });
        }
        C::manufacture(self.registry.as_ref(), &self.type_name).ok_or_else(|| {
            CatalogError::Manufacture {
                plugin: self.plugin.name().to_string(),
                ty: self.type_name.clone(),
            }
        })
    }

    /// The shared instance, built on first use. `None` if construction failed.
    pub fn get(&self) -> Option<Arc<C::Instance>> {
        self.instance
            .get_or_init(|| match self.create() {
                Ok(instance) => {
                    tracing::debug!(
                        target: "assetres::init",
                        "Created {} from plugin {}",
                        self.type_name,
                        self.plugin.name()
                    );
                    Some(instance)
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    None
                }
            })
            .clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.instance.get().is_some()
    }
}

impl<C: Capability> fmt::Debug for PluginResolver<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginResolver")
            .field("type_name", &self.type_name)
            .field("plugin", &self.plugin.name())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
