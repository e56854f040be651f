//! Backend-facing contracts for asset resolution plugins.
//!
//! Resolver implementations live behind the capability traits in [`cap`];
//! the dispatcher discovers them through a [`TypeRegistry`] and loads their
//! owning plugin through a [`PluginSource`].

pub mod cap;
pub mod factory;
pub mod registry;

pub use cap::*;
pub use factory::{PackageResolverFactory, ResolverFactory};
pub use registry::{CapabilityKind, PluginHandle, PluginSource, TypeName, TypeRegistry, metadata};
