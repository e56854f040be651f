use thiserror::Error;

/// Usage errors surfaced by the resolver API.
///
/// Resolution failures are never reported through this type; they are
/// expressed as empty results (an empty `ResolvedPath`, an empty context,
/// or a missing asset).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    #[error("No context was bound, cannot unbind context: {0}")]
    NoContextBound(String),
    #[error("Context {given} is not the innermost bound context ({innermost})")]
    ContextUnbindOrder { given: String, innermost: String },
    #[error("Cannot open package-relative paths for write: {0}")]
    PackageWriteUnsupported(String),
    #[error("Cannot write asset to {path}: {reason}")]
    CannotWrite { path: String, reason: String },
    #[error("Failed to open asset {0}")]
    OpenFailed(String),
    #[error("Cache scope data was not produced by this resolver")]
    InvalidCacheScopeData,
    #[error("Binding data was not produced by this resolver")]
    InvalidBindingData,
}

pub type ResolverResult<T> = std::result::Result<T, ResolverError>;
