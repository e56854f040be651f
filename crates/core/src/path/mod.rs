//! Lexical helpers for asset paths: package-relative `outer[inner]` notation
//! and URI scheme prefixes. Nothing here touches the filesystem.

mod scheme;
mod syntax;

pub use scheme::{SchemeError, extract_scheme, validate_scheme};
pub use syntax::{is_package_relative, join, join_all, split_inner, split_outer};
