//! The built-in filesystem resolver, always available as the primary
//! resolver of last resort.

mod asset;
mod context;
mod resolver;

pub use asset::{FilesystemAsset, FilesystemWritableAsset};
pub use context::DefaultResolverContext;
pub use resolver::{DEFAULT_RESOLVER_TYPE, DefaultResolver, normalize_path};
