pub mod error;
pub mod models;
pub mod resolver;
pub mod scope;

// Re-export commonly used types
pub use error::{ResolverError, ResolverResult};
pub use models::*;
pub use resolver::AssetResolver;
pub use scope::{ContextBinder, ScopedCache};
