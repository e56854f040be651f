//! Per-thread state owned by a dispatching resolver: the stack of bound
//! contexts and the stack of open cache scopes.
//!
//! Both live in thread-local maps keyed by a dispatcher id, so two
//! dispatchers in one process never see each other's bindings.

mod context_stack;
mod scoped_cache;

pub use context_stack::ContextStack;
pub use scoped_cache::ThreadLocalScopedCache;

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DISPATCHER_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_dispatcher_id() -> u64 {
    NEXT_DISPATCHER_ID.fetch_add(1, Ordering::Relaxed)
}
