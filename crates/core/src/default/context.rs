use std::path::{Path, PathBuf};

/// Search paths consulted by [`DefaultResolver`](super::DefaultResolver)
/// when resolving bare relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DefaultResolverContext {
    search_paths: Vec<PathBuf>,
}

impl DefaultResolverContext {
    /// Relative entries are made absolute against the working directory;
    /// empty entries are dropped.
    pub fn new<I, P>(search_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let search_paths = search_paths
            .into_iter()
            .filter(|p| !p.as_ref().as_os_str().is_empty())
            .map(|p| super::resolver::absolute(p.as_ref()))
            .collect();
        Self { search_paths }
    }

    /// Parse an OS path list (`:` separated on Unix).
    pub fn from_path_list(list: &str) -> Self {
        Self::new(std::env::split_paths(list))
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_entries_are_dropped() {
        let ctx = DefaultResolverContext::new(["/a", "", "/b"]);
        assert_eq!(
            ctx.search_paths(),
            &[PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn test_relative_entries_become_absolute() {
        let ctx = DefaultResolverContext::new(["rel/dir"]);
        assert!(ctx.search_paths()[0].is_absolute());
        assert!(ctx.search_paths()[0].ends_with("rel/dir"));
    }

    #[test]
    fn test_from_path_list() {
        let list = std::env::join_paths(["/x", "/y"]).unwrap();
        let ctx = DefaultResolverContext::from_path_list(list.to_str().unwrap());
        assert_eq!(ctx.search_paths().len(), 2);
        assert!(DefaultResolverContext::from_path_list("").search_paths().is_empty());
    }
}
