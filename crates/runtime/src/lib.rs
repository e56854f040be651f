//! Process-wide access to the dispatching resolver.
//!
//! Resolver types are registered into a global [`InMemoryRegistry`] before
//! the first call to [`get_resolver`], which builds the dispatcher once from
//! the environment and keeps it for the rest of the process.

use assetres_core::primary::{self, ResolverSources, available_primary_resolvers};
use assetres_core::{DispatchingResolver, InMemoryRegistry, ResolverCatalog, ResolverSettings};
use assetres_plugin::{
    PackageResolverFactory, PluginHandle, PluginSource, Resolver, ResolverFactory, TypeName,
    TypeRegistry,
};
use once_cell::sync::{Lazy, OnceCell};
use std::sync::{Arc, PoisonError, RwLock};

pub use assetres_api::AssetResolver;

static REGISTRY: Lazy<Arc<InMemoryRegistry>> =
    Lazy::new(|| Arc::new(InMemoryRegistry::with_builtins()));

static RESOLVER: OnceCell<DispatchingResolver> = OnceCell::new();

static PREFERRED: RwLock<Option<String>> = RwLock::new(None);

/// The global registry the singleton is built from.
pub fn registry() -> &'static Arc<InMemoryRegistry> {
    &REGISTRY
}

/// Register a resolver type with the global registry.
///
/// Types registered after the singleton exists are only reachable through
/// [`create_resolver`].
pub fn register_resolver<F>(ty: &str, plugin: Arc<dyn PluginHandle>, factory: F)
where
    F: ResolverFactory + 'static,
{
    warn_if_built("register_resolver", ty);
    REGISTRY.register_resolver(ty, plugin, factory);
}

pub fn register_package_resolver<F>(ty: &str, plugin: Arc<dyn PluginHandle>, factory: F)
where
    F: PackageResolverFactory + 'static,
{
    warn_if_built("register_package_resolver", ty);
    REGISTRY.register_package_resolver(ty, plugin, factory);
}

/// Name the resolver type to try first as primary. Overrides
/// `ASSETRES_PREFERRED_RESOLVER`; ignored once the singleton exists.
pub fn set_preferred_resolver(name: impl Into<String>) {
    let name = name.into();
    if RESOLVER.get().is_some() {
        tracing::warn!(
            "set_preferred_resolver({}) called after the resolver was created; ignoring",
            name
        );
        return;
    }
    *PREFERRED.write().unwrap_or_else(PoisonError::into_inner) = Some(name);
}

/// The process-wide dispatching resolver, built on first use.
pub fn get_resolver() -> &'static DispatchingResolver {
    RESOLVER.get_or_init(|| {
        let settings = current_settings();
        tracing::debug!(target: "assetres::init", "Building global resolver: {:?}", settings);

        DispatchingResolver::builder()
            .with_registry(Arc::clone(&REGISTRY))
            .with_settings(settings)
            .build()
    })
}

/// The primary backend behind the singleton.
pub fn get_underlying_resolver() -> &'static Arc<dyn Resolver> {
    get_resolver().primary_resolver()
}

/// Primary candidates in the order the singleton would try them.
///
/// Reads the global registry directly, so resolver factories may call it
/// while the singleton is being built. Types under construction on this
/// thread are left out.
pub fn available_resolvers() -> Vec<TypeName> {
    let settings = current_settings();
    let registry: &InMemoryRegistry = &REGISTRY;
    let catalog = ResolverCatalog::build(
        registry,
        registry,
        !settings.disable_strict_scheme_validation,
    );
    available_primary_resolvers(&catalog, settings.disable_plugin_resolver)
}

/// Build a standalone backend of type `name`, falling back to the default
/// resolver. Does not touch the singleton.
pub fn create_resolver(name: &str) -> Arc<dyn Resolver> {
    let settings = current_settings();
    let shared: Arc<InMemoryRegistry> = Arc::clone(&REGISTRY);
    let registry: Arc<dyn TypeRegistry> = shared.clone();
    let plugins: Arc<dyn PluginSource> = shared;
    primary::create_resolver(
        &TypeName::new(name),
        &ResolverSources::new(registry, plugins),
        &settings.default_search_path,
    )
}

/// Install the file (and optionally stderr) log layers. Keep the guard alive
/// for as long as logs should be flushed.
pub fn init_logging(component: &str, to_stderr: bool) -> tracing_appender::non_blocking::WorkerGuard {
    assetres_core::logging::init_logging(component, to_stderr)
}

/// Environment settings with the explicit preference applied.
fn current_settings() -> ResolverSettings {
    let preferred = PREFERRED
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    with_preferred(ResolverSettings::from_env(), preferred)
}

fn with_preferred(mut settings: ResolverSettings, preferred: Option<String>) -> ResolverSettings {
    if let Some(name) = preferred.filter(|name| !name.is_empty()) {
        settings.preferred_resolver = Some(name);
    }
    settings
}

fn warn_if_built(operation: &str, ty: &str) {
    if RESOLVER.get().is_some() {
        tracing::warn!(
            "{}({}) after the resolver was created; it will not take part in dispatch",
            operation,
            ty
        );
    }
}
