pub mod asset;
pub mod context;
pub mod path;
pub mod scope_data;

pub use asset::*;
pub use context::*;
pub use path::*;
pub use scope_data::*;
