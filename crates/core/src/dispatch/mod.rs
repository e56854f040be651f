//! The dispatching resolver.
//!
//! Every public operation picks a backend for the path it is given: the URI
//! resolver registered for the path's scheme, or the primary resolver.
//! Package-relative paths (`outer[inner]`) are split first; the outer part
//! goes to that backend and each nested level to the package resolver
//! registered for the enclosing package's extension.

mod builder;
mod slots;

pub use builder::DispatchingResolverBuilder;
pub use slots::ResolveCache;

use crate::catalog::{ResolverCatalog, ResolverInfo};
use crate::path::{is_package_relative, join, split_inner, split_outer};
use crate::primary::{PrimaryResolver, ResolverSources, available_primary_resolvers, create_resolver};
use crate::scope::{ContextStack, ThreadLocalScopedCache};
use crate::settings::ResolverSettings;
use crate::table::{PackageResolverTable, UriResolverTable};
use assetres_api::{
    Asset, AssetInfo, AssetResolver, BindingData, CacheScopeData, ResolvedPath, ResolverContext,
    ResolverError, ResolverResult, ScopeData, Timestamp, WritableAsset, WriteMode,
};
use assetres_plugin::{PackageResolver, Resolver, TypeName};
use slots::{BindingSlots, CacheSlots};
use std::sync::Arc;

/// A backend chosen for one call.
struct Backend<'a> {
    resolver: Arc<dyn Resolver>,
    info: &'a ResolverInfo,
}

/// A participant in cache scopes other than the dispatcher itself.
enum CacheParticipant {
    Resolver(Arc<dyn Resolver>),
    Package(Arc<dyn PackageResolver>),
}

impl CacheParticipant {
    fn begin(&self, data: &mut ScopeData) {
        match self {
            CacheParticipant::Resolver(resolver) => resolver.begin_cache_scope(data),
            CacheParticipant::Package(resolver) => resolver.begin_cache_scope(data),
        }
    }

    fn end(&self, data: &mut ScopeData) {
        match self {
            CacheParticipant::Resolver(resolver) => resolver.end_cache_scope(data),
            CacheParticipant::Package(resolver) => resolver.end_cache_scope(data),
        }
    }
}

/// Routes asset resolution to primary, URI and package resolvers.
///
/// Built with [`DispatchingResolverBuilder`]. The catalog and tables are
/// fixed at construction; bound contexts and open cache scopes are tracked
/// per thread.
pub struct DispatchingResolver {
    id: u64,
    settings: ResolverSettings,
    sources: ResolverSources,
    catalog: ResolverCatalog,
    primary: PrimaryResolver,
    uri_table: UriResolverTable,
    package_table: PackageResolverTable,
    contexts: ContextStack,
    resolve_cache: ThreadLocalScopedCache<ResolveCache>,
}

impl DispatchingResolver {
    pub fn builder() -> DispatchingResolverBuilder {
        DispatchingResolverBuilder::new()
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &ResolverCatalog {
        &self.catalog
    }

    /// The primary resolver instance.
    pub fn primary_resolver(&self) -> &Arc<dyn Resolver> {
        &self.primary.resolver
    }

    pub fn primary_info(&self) -> &ResolverInfo {
        &self.primary.info
    }

    /// Types eligible as primary resolver, in selection order.
    pub fn available_resolvers(&self) -> Vec<TypeName> {
        available_primary_resolvers(&self.catalog, self.settings.disable_plugin_resolver)
    }

    /// Build a standalone resolver of type `ty`, or a `DefaultResolver` if
    /// that fails.
    pub fn create_resolver(&self, ty: &TypeName) -> Arc<dyn Resolver> {
        create_resolver(ty, &self.sources, &self.settings.default_search_path)
    }

    pub fn uri_schemes(&self) -> Vec<&str> {
        self.uri_table.schemes()
    }

    pub fn package_extensions(&self) -> Vec<&str> {
        self.package_table.extensions()
    }

    /// The type that serves `asset_path`, if its backend could be built.
    pub fn resolver_type_for(&self, asset_path: &str) -> Option<TypeName> {
        let (outer, _) = split_outer(asset_path);
        self.select_backend(outer)
            .map(|backend| backend.info.type_name.clone())
    }

    /// Number of contexts bound on this thread.
    pub fn bound_context_depth(&self) -> usize {
        self.contexts.depth()
    }

    /// Number of cache scopes open on this thread.
    pub fn cache_scope_depth(&self) -> usize {
        self.resolve_cache.depth()
    }

    fn primary_backend(&self) -> Backend<'_> {
        Backend {
            resolver: self.primary.resolver.clone(),
            info: &self.primary.info,
        }
    }

    fn select_backend(&self, path: &str) -> Option<Backend<'_>> {
        match self.uri_table.lookup(path) {
            Some(entry) => entry.resolver().map(|resolver| Backend {
                resolver,
                info: &entry.info,
            }),
            None => Some(self.primary_backend()),
        }
    }

    /// The URI resolver for `asset_path`'s scheme, else the backend for the
    /// anchor.
    fn identifier_backend(
        &self,
        asset_path: &str,
        anchor: Option<&ResolvedPath>,
    ) -> Option<Backend<'_>> {
        if let Some(entry) = self.uri_table.lookup(asset_path) {
            return entry.resolver().map(|resolver| Backend {
                resolver,
                info: &entry.info,
            });
        }
        match anchor {
            Some(anchor) => self.select_backend(anchor.as_str()),
            None => Some(self.primary_backend()),
        }
    }

    /// Context-capable backends with their binding slot: the primary, then
    /// URI resolvers that are not also the primary.
    fn context_backends(&self) -> Vec<(usize, Backend<'_>)> {
        let mut backends = Vec::new();
        if self.primary.info.implements_contexts {
            backends.push((0, self.primary_backend()));
        }
        for (idx, entry) in self.uri_table.secondary().enumerate() {
            if !entry.info.implements_contexts {
                continue;
            }
            if let Some(resolver) = entry.resolver() {
                backends.push((
                    idx + 1,
                    Backend {
                        resolver,
                        info: &entry.info,
                    },
                ));
            }
        }
        backends
    }

    fn binding_slot_count(&self) -> usize {
        1 + self.uri_table.secondary().count()
    }

    /// Cache-scope participants with their slot: the primary, secondary URI
    /// resolvers, then package resolvers. Only scoped-cache-capable
    /// resolvers take part; every package resolver does.
    fn cache_participants(&self) -> Vec<(usize, CacheParticipant)> {
        let mut participants = Vec::new();
        if self.primary.info.implements_scoped_caches {
            participants.push((0, CacheParticipant::Resolver(self.primary.resolver.clone())));
        }
        let mut slot = 1;
        for entry in self.uri_table.secondary() {
            if entry.info.implements_scoped_caches {
                if let Some(resolver) = entry.resolver() {
                    participants.push((slot, CacheParticipant::Resolver(resolver)));
                }
            }
            slot += 1;
        }
        for entry in self.package_table.entries() {
            if let Some(resolver) = entry.resolver() {
                participants.push((slot, CacheParticipant::Package(resolver)));
            }
            slot += 1;
        }
        participants
    }

    /// Slot holding the dispatcher's own resolve cache.
    fn own_cache_slot(&self) -> usize {
        1 + self.uri_table.secondary().count() + self.package_table.entries().len()
    }

    fn resolve_plain(&self, asset_path: &str) -> ResolvedPath {
        let Some(backend) = self.select_backend(asset_path) else {
            return ResolvedPath::empty();
        };
        let context = self.contexts.top();

        let cache = if backend.info.implements_scoped_caches {
            None
        } else {
            self.resolve_cache.current()
        };
        if let Some(hit) = cache
            .as_ref()
            .and_then(|cache| cache.get(asset_path, context.as_ref()))
        {
            return hit;
        }

        let resolved = backend.resolver.resolve(asset_path, context.as_ref());
        if let Some(cache) = cache {
            cache.insert(asset_path, context.as_ref(), resolved.clone());
        }
        resolved
    }

    fn resolve_package_relative(&self, asset_path: &str) -> ResolvedPath {
        let (outer, packaged) = split_outer(asset_path);
        let mut resolved = self.resolve_plain(outer);
        if resolved.is_empty() {
            return resolved;
        }

        let mut rest = packaged.to_string();
        let mut depth = 0;
        while !rest.is_empty() {
            depth += 1;
            if depth > self.settings.max_package_depth {
                tracing::warn!(
                    "Package nesting in {} exceeds {} levels",
                    asset_path,
                    self.settings.max_package_depth
                );
                return ResolvedPath::empty();
            }

            let (next, remaining) = {
                let (next, remaining) = split_outer(&rest);
                (next.to_string(), remaining.to_string())
            };
            let extension = self.extension(resolved.as_str());
            let Some(package_resolver) = self
                .package_table
                .lookup(&extension)
                .and_then(|entry| entry.resolver())
            else {
                tracing::debug!("No package resolver for '{}' in {}", extension, asset_path);
                return ResolvedPath::empty();
            };

            let next_resolved = package_resolver.resolve(resolved.as_str(), &next);
            if next_resolved.is_empty() {
                return ResolvedPath::empty();
            }
            resolved = ResolvedPath::new(join(resolved.as_str(), &next_resolved));
            rest = remaining;
        }
        resolved
    }

    fn identifier(&self, asset_path: &str, anchor: Option<&ResolvedPath>, for_new: bool) -> String {
        if is_package_relative(asset_path) {
            let (outer, packaged) = split_outer(asset_path);
            let outer_id = self.identifier(outer, anchor, for_new);
            if outer_id.is_empty() {
                return outer_id;
            }
            return join(&outer_id, packaged);
        }

        let anchor = anchor.map(|anchor| ResolvedPath::new(split_outer(anchor.as_str()).0));
        let Some(backend) = self.identifier_backend(asset_path, anchor.as_ref()) else {
            return String::new();
        };
        if for_new {
            backend
                .resolver
                .create_identifier_for_new_asset(asset_path, anchor.as_ref())
        } else {
            backend.resolver.create_identifier(asset_path, anchor.as_ref())
        }
    }

    fn write_rejected(&self, resolved_path: &ResolvedPath) -> Option<ResolverError> {
        is_package_relative(resolved_path.as_str()).then(|| {
            let err = ResolverError::PackageWriteUnsupported(resolved_path.to_string());
            tracing::error!("{}", err);
            err
        })
    }
}

impl AssetResolver for DispatchingResolver {
    fn create_identifier(&self, asset_path: &str, anchor: Option<&ResolvedPath>) -> String {
        self.identifier(asset_path, anchor, false)
    }

    fn create_identifier_for_new_asset(
        &self,
        asset_path: &str,
        anchor: Option<&ResolvedPath>,
    ) -> String {
        self.identifier(asset_path, anchor, true)
    }

    fn resolve(&self, asset_path: &str) -> ResolvedPath {
        if is_package_relative(asset_path) {
            self.resolve_package_relative(asset_path)
        } else {
            self.resolve_plain(asset_path)
        }
    }

    fn resolve_for_new_asset(&self, asset_path: &str) -> ResolvedPath {
        if is_package_relative(asset_path) {
            let (outer, packaged) = split_outer(asset_path);
            let resolved = self.resolve_for_new_asset(outer);
            if resolved.is_empty() {
                return resolved;
            }
            return ResolvedPath::new(join(resolved.as_str(), packaged));
        }

        let Some(backend) = self.select_backend(asset_path) else {
            return ResolvedPath::empty();
        };
        let context = self.contexts.top();
        backend
            .resolver
            .resolve_for_new_asset(asset_path, context.as_ref())
    }

    fn bind_context(&self, context: &ResolverContext, binding: &mut BindingData) {
        let slots = Arc::new(BindingSlots::new(self.binding_slot_count()));
        for (idx, backend) in self.context_backends() {
            let mut data = ScopeData::new();
            backend.resolver.bind_context(context, &mut data);
            slots.set(idx, data);
        }
        binding.set(slots);
        self.contexts.push(context.clone());
    }

    fn unbind_context(
        &self,
        context: &ResolverContext,
        binding: &mut BindingData,
    ) -> ResolverResult<()> {
        if !binding.is_empty() && !binding.holds::<BindingSlots>() {
            tracing::error!("{}", ResolverError::InvalidBindingData);
            return Err(ResolverError::InvalidBindingData);
        }
        if let Err(e) = self.contexts.pop(context) {
            tracing::error!("{}", e);
            return Err(e);
        }

        let slots = binding.get::<BindingSlots>();
        for (idx, backend) in self.context_backends() {
            let mut data = slots.as_ref().map(|slots| slots.get(idx)).unwrap_or_default();
            backend.resolver.unbind_context(context, &mut data);
        }
        binding.clear();
        Ok(())
    }

    fn create_default_context(&self) -> ResolverContext {
        let contexts: Vec<ResolverContext> = self
            .context_backends()
            .into_iter()
            .map(|(_, backend)| backend.resolver.create_default_context())
            .collect();
        ResolverContext::merged(&contexts)
    }

    fn create_default_context_for_asset(&self, asset_path: &str) -> ResolverContext {
        if is_package_relative(asset_path) {
            return self.create_default_context_for_asset(split_outer(asset_path).0);
        }
        let contexts: Vec<ResolverContext> = self
            .context_backends()
            .into_iter()
            .map(|(_, backend)| backend.resolver.create_default_context_for_asset(asset_path))
            .collect();
        ResolverContext::merged(&contexts)
    }

    fn create_context_from_string(
        &self,
        uri_scheme: &str,
        context_str: &str,
    ) -> ResolverContext {
        if uri_scheme.is_empty() {
            return self.primary.resolver.create_context_from_string(context_str);
        }
        self.uri_table
            .for_scheme(uri_scheme)
            .and_then(|entry| entry.resolver())
            .map(|resolver| resolver.create_context_from_string(context_str))
            .unwrap_or_default()
    }

    fn refresh_context(&self, context: &ResolverContext) {
        for (_, backend) in self.context_backends() {
            backend.resolver.refresh_context(context);
        }
    }

    fn current_context(&self) -> ResolverContext {
        let mut contexts: Vec<ResolverContext> = self
            .context_backends()
            .into_iter()
            .map(|(_, backend)| backend.resolver.current_context())
            .collect();
        contexts.extend(self.contexts.top());
        ResolverContext::merged(&contexts)
    }

    fn is_context_dependent_path(&self, asset_path: &str) -> bool {
        let (outer, _) = split_outer(asset_path);
        self.select_backend(outer).is_some_and(|backend| {
            backend.info.implements_contexts && backend.resolver.is_context_dependent_path(outer)
        })
    }

    fn is_repository_path(&self, path: &str) -> bool {
        let (outer, _) = split_outer(path);
        self.select_backend(outer)
            .is_some_and(|backend| backend.resolver.is_repository_path(outer))
    }

    fn extension(&self, asset_path: &str) -> String {
        if is_package_relative(asset_path) {
            let (_, leaf) = split_inner(asset_path);
            return self.extension(&leaf);
        }
        self.select_backend(asset_path)
            .map(|backend| backend.resolver.extension(asset_path))
            .unwrap_or_default()
    }

    fn asset_info(&self, asset_path: &str, resolved_path: &ResolvedPath) -> AssetInfo {
        if is_package_relative(asset_path) {
            let (outer_asset, _) = split_outer(asset_path);
            let (outer_resolved, packaged) = split_outer(resolved_path.as_str());
            let mut info = self.asset_info(outer_asset, &ResolvedPath::new(outer_resolved));
            if let Some(repo_path) = info.repo_path.take() {
                info.repo_path = Some(join(&repo_path, packaged));
            }
            return info;
        }
        self.select_backend(asset_path)
            .map(|backend| backend.resolver.asset_info(asset_path, resolved_path))
            .unwrap_or_default()
    }

    fn modification_timestamp(
        &self,
        asset_path: &str,
        resolved_path: &ResolvedPath,
    ) -> Timestamp {
        let (outer_asset, _) = split_outer(asset_path);
        let (outer_resolved, _) = split_outer(resolved_path.as_str());
        self.select_backend(outer_asset)
            .map(|backend| {
                backend
                    .resolver
                    .modification_timestamp(outer_asset, &ResolvedPath::new(outer_resolved))
            })
            .unwrap_or_default()
    }

    fn open_asset(&self, resolved_path: &ResolvedPath) -> Option<Arc<dyn Asset>> {
        if is_package_relative(resolved_path.as_str()) {
            let (package, packaged) = split_inner(resolved_path.as_str());
            let extension = self.extension(&package);
            let Some(package_resolver) = self
                .package_table
                .lookup(&extension)
                .and_then(|entry| entry.resolver())
            else {
                tracing::debug!("No package resolver for '{}' in {}", extension, resolved_path);
                return None;
            };
            return package_resolver.open_asset(&package, &packaged);
        }
        self.select_backend(resolved_path.as_str())?
            .resolver
            .open_asset(resolved_path)
    }

    fn open_asset_for_write(
        &self,
        resolved_path: &ResolvedPath,
        mode: WriteMode,
    ) -> ResolverResult<Arc<dyn WritableAsset>> {
        if let Some(err) = self.write_rejected(resolved_path) {
            return Err(err);
        }
        match self.select_backend(resolved_path.as_str()) {
            Some(backend) => backend.resolver.open_asset_for_write(resolved_path, mode),
            None => Err(ResolverError::OpenFailed(resolved_path.to_string())),
        }
    }

    fn can_write_asset_to_path(&self, resolved_path: &ResolvedPath) -> ResolverResult<()> {
        if let Some(err) = self.write_rejected(resolved_path) {
            return Err(err);
        }
        let backend = self
            .select_backend(resolved_path.as_str())
            .ok_or_else(|| ResolverError::OpenFailed(resolved_path.to_string()))?;
        backend
            .resolver
            .can_write_asset_to_path(resolved_path)
            .map_err(|reason| ResolverError::CannotWrite {
                path: resolved_path.to_string(),
                reason,
            })
    }

    fn begin_cache_scope(&self, data: &mut CacheScopeData) {
        let own_slot = self.own_cache_slot();
        let slots = match data.get::<CacheSlots>() {
            Some(slots) if slots.len() == own_slot + 1 => slots,
            Some(_) => {
                tracing::error!("{}", ResolverError::InvalidCacheScopeData);
                Arc::new(CacheSlots::new(own_slot + 1))
            }
            None => Arc::new(CacheSlots::new(own_slot + 1)),
        };
        data.set(slots.clone());

        for (idx, participant) in self.cache_participants() {
            let mut slot = slots.get(idx);
            participant.begin(&mut slot);
            slots.set(idx, slot);
        }

        let mut own = slots.get(own_slot);
        self.resolve_cache.begin(&mut own);
        slots.set(own_slot, own);
    }

    fn end_cache_scope(&self, data: &mut CacheScopeData) -> ResolverResult<()> {
        let own_slot = self.own_cache_slot();
        let own = data
            .get::<CacheSlots>()
            .filter(|slots| slots.len() == own_slot + 1)
            .map(|slots| (slots.get(own_slot), slots));
        let Some((own, slots)) = own.filter(|(own, _)| self.resolve_cache.is_innermost(own)) else {
            tracing::error!("{}", ResolverError::InvalidCacheScopeData);
            return Err(ResolverError::InvalidCacheScopeData);
        };

        for (idx, participant) in self.cache_participants().into_iter().rev() {
            let mut slot = slots.get(idx);
            participant.end(&mut slot);
        }

        self.resolve_cache
            .end(&own)
            .inspect_err(|e| tracing::error!("{}", e))
    }
}

impl Drop for DispatchingResolver {
    fn drop(&mut self) {
        self.contexts.clear_current_thread();
        self.resolve_cache.clear_current_thread();
        tracing::debug!(target: "assetres::init", "Dropped dispatching resolver {}", self.id);
    }
}

impl std::fmt::Debug for DispatchingResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchingResolver")
            .field("id", &self.id)
            .field("primary", &self.primary.info.type_name)
            .field("uri_schemes", &self.uri_table.schemes())
            .field("package_extensions", &self.package_table.extensions())
            .finish()
    }
}
