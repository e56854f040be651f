pub mod error;
pub mod logging;
pub mod settings;

pub mod catalog;
pub mod default;
pub mod dispatch;
pub mod path;
pub mod plugin_resolver;
pub mod primary;
pub mod registry;
pub mod scope;
pub mod table;

pub use catalog::{ResolverCatalog, ResolverInfo};
pub use default::{DefaultResolver, DefaultResolverContext};
pub use dispatch::{DispatchingResolver, DispatchingResolverBuilder};
pub use error::{CatalogError, Result};
pub use registry::{InMemoryRegistry, StaticPlugin};
pub use settings::ResolverSettings;
