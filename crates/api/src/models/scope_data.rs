use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Opaque per-scope state handed back to a resolver when a scope ends.
///
/// A resolver stores whatever it needs between `begin_cache_scope` and
/// `end_cache_scope` (or between `bind_context` and `unbind_context`) here.
/// Cloning shares the stored value, which is how a cache scope opened on one
/// thread can be joined from another.
#[derive(Clone, Default)]
pub struct ScopeData {
    value: Option<Arc<dyn Any + Send + Sync>>,
}

/// Data carried between `begin_cache_scope` and `end_cache_scope`.
pub type CacheScopeData = ScopeData;

/// Data carried between `bind_context` and `unbind_context`.
pub type BindingData = ScopeData;

impl ScopeData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Store a value, replacing any previous one.
    pub fn set<T: Any + Send + Sync>(&mut self, value: Arc<T>) {
        self.value = Some(value);
    }

    /// Shared handle to the stored value, if it is a `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.value.clone()?.downcast::<T>().ok()
    }

    pub fn holds<T: Any + Send + Sync>(&self) -> bool {
        self.value.as_ref().is_some_and(|value| value.is::<T>())
    }

    pub fn take(&mut self) -> Option<Arc<dyn Any + Send + Sync>> {
        self.value.take()
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}

impl fmt::Debug for ScopeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeData")
            .field("occupied", &self.value.is_some())
            .finish()
    }
}
