//! Lookup tables from URI schemes and package extensions to backends.

mod package;
mod uri;

pub use package::{PackageEntry, PackageResolverTable};
pub use uri::{UriEntry, UriResolverTable};
