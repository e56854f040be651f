use crate::cap::{PackageResolver, Resolver};
use std::sync::Arc;

/// Manufactures resolver instances for one registered type.
///
/// Returning `None` signals a construction failure; the dispatcher moves on
/// to the next candidate.
pub trait ResolverFactory: Send + Sync {
    fn create(&self) -> Option<Arc<dyn Resolver>>;
}

impl<F> ResolverFactory for F
where
    F: Fn() -> Option<Arc<dyn Resolver>> + Send + Sync,
{
    fn create(&self) -> Option<Arc<dyn Resolver>> {
        self()
    }
}

/// Manufactures package resolver instances for one registered type.
pub trait PackageResolverFactory: Send + Sync {
    fn create(&self) -> Option<Arc<dyn PackageResolver>>;
}

impl<F> PackageResolverFactory for F
where
    F: Fn() -> Option<Arc<dyn PackageResolver>> + Send + Sync,
{
    fn create(&self) -> Option<Arc<dyn PackageResolver>> {
        self()
    }
}
