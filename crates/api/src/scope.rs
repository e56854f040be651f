//! Scoped guards that keep context bindings and cache scopes balanced.

use crate::models::{BindingData, CacheScopeData, ResolverContext};
use crate::resolver::AssetResolver;

/// Binds a context for the lifetime of the guard.
///
/// ```ignore
/// let _binder = ContextBinder::new(resolver, context);
/// let resolved = resolver.resolve("model.usd");
/// ```
pub struct ContextBinder<'a> {
    resolver: &'a dyn AssetResolver,
    context: ResolverContext,
    binding: BindingData,
}

impl<'a> ContextBinder<'a> {
    pub fn new(resolver: &'a dyn AssetResolver, context: ResolverContext) -> Self {
        let mut binding = BindingData::new();
        resolver.bind_context(&context, &mut binding);
        Self {
            resolver,
            context,
            binding,
        }
    }

    pub fn context(&self) -> &ResolverContext {
        &self.context
    }
}

impl Drop for ContextBinder<'_> {
    fn drop(&mut self) {
        // Ordering violations are already logged by the resolver.
        let _ = self
            .resolver
            .unbind_context(&self.context, &mut self.binding);
    }
}

/// Holds a cache scope open for the lifetime of the guard.
pub struct ScopedCache<'a> {
    resolver: &'a dyn AssetResolver,
    data: CacheScopeData,
}

impl<'a> ScopedCache<'a> {
    /// Open a new scope, or join the innermost open scope on this thread.
    pub fn new(resolver: &'a dyn AssetResolver) -> Self {
        Self::with_data(resolver, CacheScopeData::new())
    }

    /// Join the scope described by `data`, typically taken from a guard on
    /// another thread.
    pub fn shared(resolver: &'a dyn AssetResolver, data: &CacheScopeData) -> Self {
        Self::with_data(resolver, data.clone())
    }

    fn with_data(resolver: &'a dyn AssetResolver, mut data: CacheScopeData) -> Self {
        resolver.begin_cache_scope(&mut data);
        Self { resolver, data }
    }

    /// Scope data that other threads can pass to [`ScopedCache::shared`].
    pub fn data(&self) -> &CacheScopeData {
        &self.data
    }
}

impl Drop for ScopedCache<'_> {
    fn drop(&mut self) {
        let _ = self.resolver.end_cache_scope(&mut self.data);
    }
}
