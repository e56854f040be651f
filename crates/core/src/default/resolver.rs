use super::asset::{FilesystemAsset, FilesystemWritableAsset};
use super::context::DefaultResolverContext;
use assetres_api::{
    Asset, ResolvedPath, ResolverContext, ResolverError, ResolverResult, Timestamp,
    WritableAsset, WriteMode,
};
use assetres_plugin::{Resolver, TypeName};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_RESOLVER_TYPE: &str = "DefaultResolver";

/// Filesystem resolver with search-path lookup.
///
/// - Absolute paths resolve to themselves when the file exists.
/// - `./` and `../` paths are anchored to the anchor asset's directory.
/// - Other relative paths are "search paths": they are tried against the
///   working directory, then the search paths of the bound
///   [`DefaultResolverContext`], then the default search path.
#[derive(Debug, Clone, Default)]
pub struct DefaultResolver {
    fallback: DefaultResolverContext,
}

impl DefaultResolver {
    pub fn new<I, P>(default_search_path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        Self {
            fallback: DefaultResolverContext::new(default_search_path),
        }
    }

    pub fn type_name() -> TypeName {
        TypeName::new(DEFAULT_RESOLVER_TYPE)
    }

    pub fn default_search_path(&self) -> &[PathBuf] {
        self.fallback.search_paths()
    }

    fn is_file_relative(path: &str) -> bool {
        path.starts_with("./") || path.starts_with("../")
    }

    fn is_search_path(path: &str) -> bool {
        !path.is_empty() && Path::new(path).is_relative() && !Self::is_file_relative(path)
    }

    /// Join a relative `path` to the directory of `anchor`.
    fn anchor_relative(anchor: &ResolvedPath, path: &str) -> PathBuf {
        let anchor = Path::new(anchor.as_str());
        if anchor.is_relative() || Path::new(path).is_absolute() {
            return PathBuf::from(path);
        }
        anchor
            .parent()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|| PathBuf::from(path))
    }

    fn resolve_anchored(anchor: Option<&Path>, path: &str) -> Option<ResolvedPath> {
        let candidate = match anchor {
            Some(dir) => dir.join(path),
            None => PathBuf::from(path),
        };
        candidate
            .exists()
            .then(|| ResolvedPath::new(to_string(&normalize_path(&absolute(&candidate)))))
    }
}

impl Resolver for DefaultResolver {
    fn create_identifier(&self, asset_path: &str, anchor: Option<&ResolvedPath>) -> String {
        if asset_path.is_empty() {
            return String::new();
        }
        let Some(anchor) = anchor.filter(|a| !a.is_empty()) else {
            return to_string(&normalize_path(&absolute(Path::new(asset_path))));
        };

        let anchored = Self::anchor_relative(anchor, asset_path);
        // A search path stays a search path unless the anchored file exists.
        if Self::is_search_path(asset_path) && !anchored.exists() {
            return to_string(&normalize_path(Path::new(asset_path)));
        }
        to_string(&normalize_path(&anchored))
    }

    fn create_identifier_for_new_asset(
        &self,
        asset_path: &str,
        anchor: Option<&ResolvedPath>,
    ) -> String {
        if asset_path.is_empty() {
            return String::new();
        }
        let path = Path::new(asset_path);
        if path.is_absolute() {
            return to_string(&normalize_path(path));
        }
        let anchored = match anchor.filter(|a| !a.is_empty()) {
            Some(anchor) => Self::anchor_relative(anchor, asset_path),
            None => PathBuf::from(asset_path),
        };
        to_string(&normalize_path(&absolute(&anchored)))
    }

    fn resolve(&self, asset_path: &str, context: Option<&ResolverContext>) -> ResolvedPath {
        if asset_path.is_empty() {
            return ResolvedPath::empty();
        }
        if Path::new(asset_path).is_absolute() {
            return Self::resolve_anchored(None, asset_path).unwrap_or_default();
        }

        if let Some(resolved) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::resolve_anchored(Some(&cwd), asset_path))
        {
            return resolved;
        }

        if Self::is_search_path(asset_path) {
            let bound = context.and_then(|ctx| ctx.get::<DefaultResolverContext>());
            for ctx in bound.into_iter().chain(std::iter::once(&self.fallback)) {
                for dir in ctx.search_paths() {
                    if let Some(resolved) = Self::resolve_anchored(Some(dir), asset_path) {
                        return resolved;
                    }
                }
            }
        }
        ResolvedPath::empty()
    }

    fn resolve_for_new_asset(
        &self,
        asset_path: &str,
        _context: Option<&ResolverContext>,
    ) -> ResolvedPath {
        if asset_path.is_empty() {
            return ResolvedPath::empty();
        }
        ResolvedPath::new(to_string(&normalize_path(&absolute(Path::new(asset_path)))))
    }

    fn create_default_context(&self) -> ResolverContext {
        ResolverContext::from_object(DefaultResolverContext::default())
    }

    fn create_default_context_for_asset(&self, asset_path: &str) -> ResolverContext {
        if asset_path.is_empty() {
            return self.create_default_context();
        }
        let asset = normalize_path(&absolute(Path::new(asset_path)));
        let dir = asset.parent().map(Path::to_path_buf).unwrap_or(asset);
        ResolverContext::from_object(DefaultResolverContext::new([dir]))
    }

    fn create_context_from_string(&self, context_str: &str) -> ResolverContext {
        ResolverContext::from_object(DefaultResolverContext::from_path_list(context_str))
    }

    fn is_context_dependent_path(&self, asset_path: &str) -> bool {
        Self::is_search_path(asset_path)
    }

    fn modification_timestamp(&self, _asset_path: &str, resolved_path: &ResolvedPath) -> Timestamp {
        std::fs::metadata(resolved_path.as_str())
            .and_then(|meta| meta.modified())
            .map(Timestamp::from)
            .unwrap_or_default()
    }

    fn open_asset(&self, resolved_path: &ResolvedPath) -> Option<Arc<dyn Asset>> {
        match FilesystemAsset::open(resolved_path.as_str()) {
            Ok(asset) => Some(Arc::new(asset)),
            Err(e) => {
                tracing::debug!("Failed to open {}: {}", resolved_path, e);
                None
            }
        }
    }

    fn open_asset_for_write(
        &self,
        resolved_path: &ResolvedPath,
        mode: WriteMode,
    ) -> ResolverResult<Arc<dyn WritableAsset>> {
        FilesystemWritableAsset::create(resolved_path.as_str(), mode)
            .map(|asset| Arc::new(asset) as Arc<dyn WritableAsset>)
            .map_err(|e| ResolverError::CannotWrite {
                path: resolved_path.to_string(),
                reason: e.to_string(),
            })
    }
}

/// `path` made absolute against the working directory.
pub(super) fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Lexically remove `.` components and fold `..` into its parent.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

fn to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
        assert_eq!(normalize_path(Path::new("./")), PathBuf::from("."));
    }

    #[test]
    fn test_resolve_absolute_path() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("model.usd");
        fs::write(&file, "").unwrap();

        let resolver = DefaultResolver::default();
        let resolved = resolver.resolve(file.to_str().unwrap(), None);
        assert_eq!(resolved.as_str(), file.to_str().unwrap());

        let missing = dir.path().join("missing.usd");
        assert!(resolver.resolve(missing.to_str().unwrap(), None).is_empty());
    }

    #[test]
    fn test_resolve_search_path_via_context_then_fallback() {
        let bound_dir = tempdir().unwrap();
        let fallback_dir = tempdir().unwrap();
        fs::create_dir_all(bound_dir.path().join("foo")).unwrap();
        fs::write(bound_dir.path().join("foo/bar.usd"), "").unwrap();
        fs::write(fallback_dir.path().join("only_fallback.usd"), "").unwrap();

        let resolver = DefaultResolver::new([fallback_dir.path()]);
        let ctx = ResolverContext::from_object(DefaultResolverContext::new([bound_dir.path()]));

        let resolved = resolver.resolve("foo/bar.usd", Some(&ctx));
        assert_eq!(
            PathBuf::from(resolved.as_str()),
            bound_dir.path().join("foo/bar.usd")
        );
        assert!(resolver.resolve("foo/bar.usd", None).is_empty());

        let resolved = resolver.resolve("only_fallback.usd", Some(&ctx));
        assert_eq!(
            PathBuf::from(resolved.as_str()),
            fallback_dir.path().join("only_fallback.usd")
        );
    }

    #[test]
    fn test_create_identifier_anchoring() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("sibling.usd"), "").unwrap();
        let anchor = ResolvedPath::new(dir.path().join("root.usd").to_str().unwrap());
        let resolver = DefaultResolver::default();

        let id = resolver.create_identifier("./sub/../other.usd", Some(&anchor));
        assert_eq!(PathBuf::from(id), dir.path().join("other.usd"));

        // Search path anchored only when the anchored file exists.
        let id = resolver.create_identifier("sibling.usd", Some(&anchor));
        assert_eq!(PathBuf::from(id), dir.path().join("sibling.usd"));
        assert_eq!(resolver.create_identifier("lib/shared.usd", Some(&anchor)), "lib/shared.usd");

        assert_eq!(resolver.create_identifier("/abs/./x.usd", Some(&anchor)), "/abs/x.usd");
        assert_eq!(resolver.create_identifier("", Some(&anchor)), "");
    }

    #[test]
    fn test_context_dependent_paths() {
        let resolver = DefaultResolver::default();
        assert!(resolver.is_context_dependent_path("lib/a.usd"));
        assert!(!resolver.is_context_dependent_path("./a.usd"));
        assert!(!resolver.is_context_dependent_path("/a.usd"));
        assert!(!resolver.is_context_dependent_path(""));
    }

    #[test]
    fn test_default_context_for_asset_is_its_directory() {
        let resolver = DefaultResolver::default();
        let ctx = resolver.create_default_context_for_asset("/shots/s1/shot.usd");
        let search = ctx.get::<DefaultResolverContext>().unwrap();
        assert_eq!(search.search_paths(), &[PathBuf::from("/shots/s1")]);
    }

    #[test]
    fn test_modification_timestamp() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.usd");
        fs::write(&file, "x").unwrap();
        let resolver = DefaultResolver::default();

        let resolved = ResolvedPath::new(file.to_str().unwrap());
        assert!(resolver.modification_timestamp("a.usd", &resolved).is_valid());
        let missing = ResolvedPath::new(dir.path().join("none").to_str().unwrap());
        assert!(!resolver.modification_timestamp("none", &missing).is_valid());
    }
}
