use assetres_plugin::TypeName;
use thiserror::Error;

use crate::path::SchemeError;

/// Configuration problems found while building the resolver tables.
///
/// None of these abort construction; the offending entry is logged and
/// skipped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Failed to find plugin for {0}")]
    NoOwningPlugin(TypeName),
    #[error("'{key}' metadata for {ty} must be {expected}")]
    MetadataShape {
        ty: TypeName,
        key: &'static str,
        expected: &'static str,
    },
    #[error("No '{key}' metadata found for {ty}")]
    MissingMetadata { ty: TypeName, key: &'static str },
    #[error("'{scheme}' for {ty} is not a valid URI scheme: {reason}")]
    InvalidScheme {
        ty: TypeName,
        scheme: String,
        reason: SchemeError,
    },
    #[error("Failed to load plugin {plugin} for {ty}")]
    PluginLoad { plugin: String, ty: TypeName },
    #[error("Failed to manufacture {ty} from plugin {plugin}")]
    Manufacture { plugin: String, ty: TypeName },
}

pub type Result<T> = std::result::Result<T, CatalogError>;
