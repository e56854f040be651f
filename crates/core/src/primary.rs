//! Selection and construction of the primary resolver.

use crate::catalog::{ResolverCatalog, ResolverInfo, capability_flag};
use crate::default::DefaultResolver;
use crate::error::CatalogError;
use crate::plugin_resolver::PluginBackend;
use crate::registry::{BUILTIN_PLUGIN, StaticPlugin};
use crate::settings::ResolverSettings;
use assetres_plugin::{
    CapabilityKind, PluginHandle, PluginSource, Resolver, TypeName, TypeRegistry, metadata,
};
use serde_json::json;
use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::Arc;

thread_local! {
    static UNDER_CONSTRUCTION: RefCell<Vec<TypeName>> = const { RefCell::new(Vec::new()) };
}

/// Marks a resolver type as being constructed on this thread until dropped.
///
/// While the guard lives, [`available_primary_resolvers`] leaves the type
/// out, so a resolver whose constructor asks which resolvers exist never
/// selects itself.
#[derive(Debug)]
pub struct ConstructionGuard {
    ty: TypeName,
}

impl ConstructionGuard {
    pub fn enter(ty: TypeName) -> Self {
        UNDER_CONSTRUCTION.with(|stack| stack.borrow_mut().push(ty.clone()));
        Self { ty }
    }
}

impl Drop for ConstructionGuard {
    fn drop(&mut self) {
        UNDER_CONSTRUCTION.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|ty| ty == &self.ty) {
                stack.remove(pos);
            }
        });
    }
}

pub fn is_under_construction(ty: &TypeName) -> bool {
    UNDER_CONSTRUCTION.with(|stack| stack.borrow().contains(ty))
}

/// Primary-eligible plugin types in catalog order, then `DefaultResolver`.
///
/// Types under construction on this thread are skipped.
pub fn available_primary_resolvers(catalog: &ResolverCatalog, disable_plugins: bool) -> Vec<TypeName> {
    let default_type = DefaultResolver::type_name();
    let mut types: Vec<TypeName> = if disable_plugins {
        Vec::new()
    } else {
        catalog
            .iter()
            .filter(|info| info.can_be_primary)
            .filter(|info| info.type_name != default_type)
            .filter(|info| !is_under_construction(&info.type_name))
            .map(|info| info.type_name.clone())
            .collect()
    };
    types.push(default_type);
    types
}

/// Catalog entry used for `DefaultResolver` when the registry does not
/// know it.
pub fn default_resolver_info() -> ResolverInfo {
    let ty = DefaultResolver::type_name();
    let plugin = StaticPlugin::builder(BUILTIN_PLUGIN)
        .metadata(ty.as_str(), json!({ (metadata::IMPLEMENTS_CONTEXTS): true }))
        .build();
    ResolverInfo {
        plugin,
        type_name: ty,
        uri_schemes: Vec::new(),
        can_be_primary: true,
        implements_contexts: true,
        implements_scoped_caches: false,
    }
}

/// Everything needed to build plugin resolvers.
#[derive(Clone)]
pub struct ResolverSources {
    pub registry: Arc<dyn TypeRegistry>,
    pub plugins: Arc<dyn PluginSource>,
}

impl ResolverSources {
    pub fn new(registry: Arc<dyn TypeRegistry>, plugins: Arc<dyn PluginSource>) -> Self {
        Self { registry, plugins }
    }

    fn info_for(
        &self,
        catalog: &ResolverCatalog,
        ty: &TypeName,
        plugin: Arc<dyn PluginHandle>,
    ) -> ResolverInfo {
        if let Some(info) = catalog.find(ty) {
            return info.clone();
        }
        let registry = self.registry.as_ref();
        let plugins = self.plugins.as_ref();
        ResolverInfo {
            plugin,
            type_name: ty.clone(),
            uri_schemes: Vec::new(),
            can_be_primary: true,
            implements_contexts: capability_flag(registry, plugins, ty, metadata::IMPLEMENTS_CONTEXTS),
            implements_scoped_caches: capability_flag(
                registry,
                plugins,
                ty,
                metadata::IMPLEMENTS_SCOPED_CACHES,
            ),
        }
    }

    /// Load the plugin for `ty` and manufacture an instance under the
    /// construction guard.
    fn construct(&self, ty: &TypeName) -> Result<(Arc<dyn Resolver>, Arc<dyn PluginHandle>), CatalogError> {
        let _guard = ConstructionGuard::enter(ty.clone());
        let plugin = self
            .plugins
            .find_owning_plugin(ty)
            .ok_or_else(|| CatalogError::NoOwningPlugin(ty.clone()))?;
        let backend = PluginBackend::new(plugin.clone(), ty.clone(), self.registry.clone());
        Ok((backend.create()?, plugin))
    }
}

/// The chosen primary resolver.
pub struct PrimaryResolver {
    pub resolver: Arc<dyn Resolver>,
    pub info: ResolverInfo,
}

/// Pick and build the primary resolver.
///
/// With plugins disabled only `DefaultResolver` is considered. Otherwise a
/// valid preferred type is the sole candidate; failing that every
/// primary-eligible catalog entry is tried in order. `DefaultResolver` is
/// always the last resort and is built directly.
pub fn select_primary(
    catalog: &ResolverCatalog,
    sources: &ResolverSources,
    settings: &ResolverSettings,
) -> PrimaryResolver {
    let default_type = DefaultResolver::type_name();
    let mut candidates = Vec::new();

    if settings.disable_plugin_resolver {
        tracing::debug!(target: "assetres::init", "Plugin primary resolvers disabled");
    } else if let Some(preferred) = settings.preferred_resolver.as_deref() {
        match sources.registry.find_by_name(preferred) {
            None => tracing::warn!("Preferred resolver {} not found", preferred),
            Some(ty) if !sources.registry.implements(&ty, CapabilityKind::Resolver) => {
                tracing::warn!("Preferred resolver {} does not derive from Resolver", preferred)
            }
            Some(ty) => {
                tracing::debug!(target: "assetres::init", "Using preferred resolver {}", ty);
                candidates.push(ty);
            }
        }
    }

    if candidates.is_empty() {
        candidates = available_primary_resolvers(catalog, settings.disable_plugin_resolver);
        tracing::debug!(
            target: "assetres::init",
            "Primary resolver candidates: [{}]",
            candidates
                .iter()
                .map(TypeName::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    for ty in candidates.iter().filter(|ty| **ty != default_type) {
        match sources.construct(ty) {
            Ok((resolver, plugin)) => {
                tracing::debug!(
                    target: "assetres::init",
                    "Using resolver {} from plugin {}",
                    ty,
                    plugin.name()
                );
                let info = sources.info_for(catalog, ty, plugin);
                return PrimaryResolver { resolver, info };
            }
            Err(e) => tracing::error!("{}", e),
        }
    }

    tracing::debug!(target: "assetres::init", "Using default resolver {}", default_type);
    let _guard = ConstructionGuard::enter(default_type.clone());
    PrimaryResolver {
        resolver: Arc::new(DefaultResolver::new(settings.default_search_path.clone())),
        info: catalog
            .find(&default_type)
            .cloned()
            .unwrap_or_else(default_resolver_info),
    }
}

/// Build a standalone resolver of type `ty`.
///
/// Falls back to `DefaultResolver` when the type is unknown, is not a
/// resolver, or fails to build.
pub fn create_resolver(
    ty: &TypeName,
    sources: &ResolverSources,
    default_search_path: &[PathBuf],
) -> Arc<dyn Resolver> {
    let default_type = DefaultResolver::type_name();
    if *ty != default_type {
        if !sources.registry.implements(ty, CapabilityKind::Resolver) {
            tracing::error!("Given type {} does not derive from Resolver", ty);
        } else {
            match sources.construct(ty) {
                Ok((resolver, _)) => return resolver,
                Err(e) => tracing::error!("{}", e),
            }
        }
    }

    let _guard = ConstructionGuard::enter(default_type);
    Arc::new(DefaultResolver::new(default_search_path.iter()))
}
