use crate::error::ResolverResult;
use crate::models::{
    Asset, AssetInfo, BindingData, CacheScopeData, ResolvedPath, ResolverContext, Timestamp,
    WritableAsset, WriteMode,
};
use std::sync::Arc;

/// Client-facing asset resolution service.
///
/// Maps asset paths (plain paths, `scheme:` URIs and package-relative
/// `outer[inner]` paths) to resolved paths and opens the assets behind them.
///
/// # Failure reporting
/// - Resolution failures are sentinels: an empty [`ResolvedPath`], an empty
///   [`ResolverContext`] or `None`.
/// - Usage errors (out-of-order unbinding, writing inside a package) return
///   `Err` and are also logged.
///
/// # Thread-local state
/// Bound contexts and open cache scopes belong to the calling thread. Use
/// [`ContextBinder`](crate::ContextBinder) and
/// [`ScopedCache`](crate::ScopedCache) to keep them balanced.
pub trait AssetResolver: Send + Sync {
    /// Identifier for `asset_path`, anchored to `anchor` when relative.
    fn create_identifier(&self, asset_path: &str, anchor: Option<&ResolvedPath>) -> String;

    /// Identifier for a new asset at `asset_path`.
    fn create_identifier_for_new_asset(
        &self,
        asset_path: &str,
        anchor: Option<&ResolvedPath>,
    ) -> String;

    /// Resolve `asset_path`. Returns an empty path if the asset cannot be found.
    fn resolve(&self, asset_path: &str) -> ResolvedPath;

    /// Resolve the location a new asset at `asset_path` would be written to.
    fn resolve_for_new_asset(&self, asset_path: &str) -> ResolvedPath;

    /// Push `context` onto this thread's binding stack.
    fn bind_context(&self, context: &ResolverContext, binding: &mut BindingData);

    /// Pop `context` from this thread's binding stack. It must be the
    /// innermost bound context.
    fn unbind_context(
        &self,
        context: &ResolverContext,
        binding: &mut BindingData,
    ) -> ResolverResult<()>;

    fn create_default_context(&self) -> ResolverContext;

    fn create_default_context_for_asset(&self, asset_path: &str) -> ResolverContext;

    /// Build a context from a string for the resolver serving `uri_scheme`
    /// (the primary resolver when empty). Unknown schemes yield an empty
    /// context.
    fn create_context_from_string(&self, uri_scheme: &str, context_str: &str)
    -> ResolverContext;

    /// Build one context from `(scheme, string)` pairs listed strongest first.
    fn create_context_from_strings(&self, pairs: &[(&str, &str)]) -> ResolverContext {
        let contexts: Vec<ResolverContext> = pairs
            .iter()
            .map(|(scheme, context_str)| self.create_context_from_string(scheme, context_str))
            .filter(|context| !context.is_empty())
            .collect();
        ResolverContext::merged(&contexts)
    }

    /// Tell resolvers that state behind `context` may have changed.
    fn refresh_context(&self, context: &ResolverContext);

    /// Context currently in effect on this thread.
    fn current_context(&self) -> ResolverContext;

    fn is_context_dependent_path(&self, asset_path: &str) -> bool;

    fn is_repository_path(&self, path: &str) -> bool;

    /// File extension of the asset `asset_path` refers to, without the dot.
    fn extension(&self, asset_path: &str) -> String;

    fn asset_info(&self, asset_path: &str, resolved_path: &ResolvedPath) -> AssetInfo;

    fn modification_timestamp(&self, asset_path: &str, resolved_path: &ResolvedPath)
    -> Timestamp;

    fn open_asset(&self, resolved_path: &ResolvedPath) -> Option<Arc<dyn Asset>>;

    fn open_asset_for_write(
        &self,
        resolved_path: &ResolvedPath,
        mode: WriteMode,
    ) -> ResolverResult<Arc<dyn WritableAsset>>;

    fn can_write_asset_to_path(&self, resolved_path: &ResolvedPath) -> ResolverResult<()>;

    /// Open a cache scope on this thread. If `data` already holds a scope
    /// (from an enclosing or another thread's scope) it is shared.
    fn begin_cache_scope(&self, data: &mut CacheScopeData);

    fn end_cache_scope(&self, data: &mut CacheScopeData) -> ResolverResult<()>;
}
