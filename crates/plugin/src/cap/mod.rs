pub mod package;
pub mod resolver;

pub use package::*;
pub use resolver::*;
