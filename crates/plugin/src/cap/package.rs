use assetres_api::{Asset, CacheScopeData};
use std::sync::Arc;

/// Resolves and opens assets stored inside a package (archive) asset.
///
/// A package resolver is registered for the file extensions listed in its
/// plugin metadata and only ever sees one nesting level: a resolved package
/// path plus a single packaged path.
pub trait PackageResolver: Send + Sync {
    /// Resolve `packaged_path` inside the package at `resolved_package_path`.
    /// Returns an empty string if the package does not contain it.
    fn resolve(&self, resolved_package_path: &str, packaged_path: &str) -> String;

    fn open_asset(
        &self,
        resolved_package_path: &str,
        resolved_packaged_path: &str,
    ) -> Option<Arc<dyn Asset>>;

    fn begin_cache_scope(&self, _data: &mut CacheScopeData) {}

    fn end_cache_scope(&self, _data: &mut CacheScopeData) {}
}
