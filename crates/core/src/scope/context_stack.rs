use assetres_api::{ResolverContext, ResolverError, ResolverResult};
use std::cell::RefCell;
use std::collections::HashMap;

thread_local! {
    static BOUND: RefCell<HashMap<u64, Vec<ResolverContext>>> = RefCell::new(HashMap::new());
}

/// LIFO stack of contexts bound on the calling thread.
#[derive(Debug)]
pub struct ContextStack {
    owner: u64,
}

impl ContextStack {
    pub fn new(owner: u64) -> Self {
        Self { owner }
    }

    pub fn push(&self, context: ResolverContext) {
        BOUND.with(|bound| {
            bound
                .borrow_mut()
                .entry(self.owner)
                .or_default()
                .push(context)
        });
    }

    /// Pop `context`, which must be the innermost bound context. On error
    /// the stack is left unchanged.
    pub fn pop(&self, context: &ResolverContext) -> ResolverResult<()> {
        BOUND.with(|bound| {
            let mut bound = bound.borrow_mut();
            let stack = bound.get_mut(&self.owner);
            let Some(innermost) = stack.as_ref().and_then(|stack| stack.last()) else {
                return Err(ResolverError::NoContextBound(context.debug_string()));
            };
            if innermost != context {
                return Err(ResolverError::ContextUnbindOrder {
                    given: context.debug_string(),
                    innermost: innermost.debug_string(),
                });
            }
            if let Some(stack) = stack {
                stack.pop();
                if stack.is_empty() {
                    bound.remove(&self.owner);
                }
            }
            Ok(())
        })
    }

    /// The innermost bound context.
    pub fn top(&self) -> Option<ResolverContext> {
        BOUND.with(|bound| {
            bound
                .borrow()
                .get(&self.owner)
                .and_then(|stack| stack.last().cloned())
        })
    }

    pub fn depth(&self) -> usize {
        BOUND.with(|bound| bound.borrow().get(&self.owner).map_or(0, Vec::len))
    }

    /// Forget everything bound on this thread.
    pub fn clear_current_thread(&self) {
        // The thread-local may already be gone during thread teardown.
        let _ = BOUND.try_with(|bound| bound.borrow_mut().remove(&self.owner));
    }
}
