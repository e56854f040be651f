use super::DispatchingResolver;
use crate::catalog::ResolverCatalog;
use crate::primary::{ResolverSources, select_primary};
use crate::registry::InMemoryRegistry;
use crate::scope::{ContextStack, ThreadLocalScopedCache, next_dispatcher_id};
use crate::settings::ResolverSettings;
use crate::table::{PackageResolverTable, UriResolverTable};
use assetres_plugin::{PluginSource, TypeRegistry};
use std::sync::Arc;

pub struct DispatchingResolverBuilder {
    registry: Option<Arc<dyn TypeRegistry>>,
    plugins: Option<Arc<dyn PluginSource>>,
    settings: ResolverSettings,
}

impl Default for DispatchingResolverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchingResolverBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            plugins: None,
            settings: ResolverSettings::default(),
        }
    }

    /// Use `registry` both as type registry and plugin source.
    pub fn with_registry(mut self, registry: Arc<InMemoryRegistry>) -> Self {
        let types: Arc<dyn TypeRegistry> = registry.clone();
        let plugins: Arc<dyn PluginSource> = registry;
        self.registry = Some(types);
        self.plugins = Some(plugins);
        self
    }

    pub fn with_type_registry(mut self, registry: Arc<dyn TypeRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_plugin_source(mut self, plugins: Arc<dyn PluginSource>) -> Self {
        self.plugins = Some(plugins);
        self
    }

    pub fn with_settings(mut self, settings: ResolverSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_preferred_resolver(mut self, name: impl Into<String>) -> Self {
        self.settings.preferred_resolver = Some(name.into());
        self
    }

    /// Build the catalog, pick the primary resolver, then fill the URI and
    /// package tables. Never fails: broken plugins are logged and skipped.
    pub fn build(self) -> DispatchingResolver {
        let (registry, plugins) = match (self.registry, self.plugins) {
            (Some(registry), Some(plugins)) => (registry, plugins),
            (registry, plugins) => {
                let builtins = Arc::new(InMemoryRegistry::with_builtins());
                let builtin_types: Arc<dyn TypeRegistry> = builtins.clone();
                let builtin_plugins: Arc<dyn PluginSource> = builtins;
                (
                    registry.unwrap_or(builtin_types),
                    plugins.unwrap_or(builtin_plugins),
                )
            }
        };
        let settings = self.settings;
        let sources = ResolverSources::new(registry.clone(), plugins.clone());

        let catalog = ResolverCatalog::build(
            registry.as_ref(),
            plugins.as_ref(),
            !settings.disable_strict_scheme_validation,
        );
        let primary = select_primary(&catalog, &sources, &settings);

        let uri_table = if settings.disable_plugin_uri_resolvers {
            tracing::debug!(target: "assetres::init", "Plugin URI resolvers disabled");
            UriResolverTable::default()
        } else {
            UriResolverTable::build(&catalog, &registry, &primary)
        };
        let package_table = PackageResolverTable::build(&registry, plugins.as_ref());

        let id = next_dispatcher_id();
        tracing::debug!(
            target: "assetres::init",
            "Dispatching resolver {} ready: primary {}, {} URI resolvers, {} package resolvers",
            id,
            primary.info.type_name,
            uri_table.entries().len(),
            package_table.entries().len()
        );

        DispatchingResolver {
            id,
            settings,
            sources,
            catalog,
            primary,
            uri_table,
            package_table,
            contexts: ContextStack::new(id),
            resolve_cache: ThreadLocalScopedCache::new(id),
        }
    }
}
