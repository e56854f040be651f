use assetres_api::{
    Asset, AssetInfo, BindingData, CacheScopeData, ResolvedPath, ResolverContext, ResolverError,
    ResolverResult, Timestamp, WritableAsset, WriteMode,
};
use std::path::Path;
use std::sync::Arc;

/// A resolver backend.
///
/// Backends are either primary-eligible (they declare no URI schemes and may
/// serve plain paths) or URI resolvers serving the schemes listed in their
/// plugin metadata. The dispatcher only forwards context operations to
/// backends declaring `implementsContexts`, and cache-scope operations to
/// backends declaring `implementsScopedCaches`.
pub trait Resolver: Send + Sync {
    fn create_identifier(&self, asset_path: &str, anchor: Option<&ResolvedPath>) -> String;

    fn create_identifier_for_new_asset(
        &self,
        asset_path: &str,
        anchor: Option<&ResolvedPath>,
    ) -> String {
        self.create_identifier(asset_path, anchor)
    }

    /// Resolve `asset_path`. `context` is the innermost context bound on the
    /// calling thread, if any. Returns an empty path on failure.
    fn resolve(&self, asset_path: &str, context: Option<&ResolverContext>) -> ResolvedPath;

    fn resolve_for_new_asset(
        &self,
        asset_path: &str,
        context: Option<&ResolverContext>,
    ) -> ResolvedPath {
        let _ = context;
        ResolvedPath::new(asset_path)
    }

    // === Context operations ===

    fn bind_context(&self, _context: &ResolverContext, _binding: &mut BindingData) {}

    fn unbind_context(&self, _context: &ResolverContext, _binding: &mut BindingData) {}

    fn create_default_context(&self) -> ResolverContext {
        ResolverContext::new()
    }

    fn create_default_context_for_asset(&self, _asset_path: &str) -> ResolverContext {
        ResolverContext::new()
    }

    fn create_context_from_string(&self, _context_str: &str) -> ResolverContext {
        ResolverContext::new()
    }

    fn refresh_context(&self, _context: &ResolverContext) {}

    /// The backend's own notion of the current context.
    fn current_context(&self) -> ResolverContext {
        ResolverContext::new()
    }

    fn is_context_dependent_path(&self, _asset_path: &str) -> bool {
        false
    }

    // === Asset queries ===

    fn is_repository_path(&self, _path: &str) -> bool {
        false
    }

    fn extension(&self, asset_path: &str) -> String {
        path_extension(asset_path)
    }

    fn asset_info(&self, _asset_path: &str, _resolved_path: &ResolvedPath) -> AssetInfo {
        AssetInfo::default()
    }

    fn modification_timestamp(
        &self,
        _asset_path: &str,
        _resolved_path: &ResolvedPath,
    ) -> Timestamp {
        Timestamp::invalid()
    }

    fn open_asset(&self, resolved_path: &ResolvedPath) -> Option<Arc<dyn Asset>>;

    fn open_asset_for_write(
        &self,
        resolved_path: &ResolvedPath,
        _mode: WriteMode,
    ) -> ResolverResult<Arc<dyn WritableAsset>> {
        Err(ResolverError::CannotWrite {
            path: resolved_path.to_string(),
            reason: "resolver does not support writing".to_string(),
        })
    }

    /// `Err` carries the reason the asset cannot be written.
    fn can_write_asset_to_path(&self, _resolved_path: &ResolvedPath) -> Result<(), String> {
        Ok(())
    }

    // === Scoped caches ===

    fn begin_cache_scope(&self, _data: &mut CacheScopeData) {}

    fn end_cache_scope(&self, _data: &mut CacheScopeData) {}
}

/// Extension of the last path component, without the dot.
pub fn path_extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|ext| ext.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_extension() {
        assert_eq!(path_extension("dir/model.usda"), "usda");
        assert_eq!(path_extension("archive.tar.gz"), "gz");
        assert_eq!(path_extension("dir.d/noext"), "");
        assert_eq!(path_extension(""), "");
    }
}
