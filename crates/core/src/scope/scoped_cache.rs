use assetres_api::{CacheScopeData, ResolverError, ResolverResult};
use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

type ScopeKey = (u64, TypeId);

thread_local! {
    static SCOPES: RefCell<HashMap<ScopeKey, Vec<Arc<dyn Any + Send + Sync>>>> =
        RefCell::new(HashMap::new());
}

/// Nested cache scopes of one cache type, tracked per thread.
///
/// Opening a scope while another is open on the same thread reuses the
/// innermost cache. A scope opened with data filled by an earlier `begin`
/// (possibly on another thread) reuses that cache instead.
pub struct ThreadLocalScopedCache<C> {
    owner: u64,
    _cache: PhantomData<fn() -> C>,
}

impl<C> ThreadLocalScopedCache<C>
where
    C: Default + Send + Sync + 'static,
{
    pub fn new(owner: u64) -> Self {
        Self {
            owner,
            _cache: PhantomData,
        }
    }

    fn key(&self) -> ScopeKey {
        (self.owner, TypeId::of::<C>())
    }

    /// Open a scope and record its cache in `data`.
    pub fn begin(&self, data: &mut CacheScopeData) -> Arc<C> {
        let cache = data
            .get::<C>()
            .or_else(|| self.current())
            .unwrap_or_else(|| Arc::new(C::default()));
        data.set(cache.clone());

        let erased: Arc<dyn Any + Send + Sync> = cache.clone();
        SCOPES.with(|scopes| {
            scopes
                .borrow_mut()
                .entry(self.key())
                .or_default()
                .push(erased)
        });
        cache
    }

    /// Close the innermost scope. `data` must be the data filled by the
    /// matching `begin`.
    pub fn end(&self, data: &CacheScopeData) -> ResolverResult<()> {
        if !self.is_innermost(data) {
            return Err(ResolverError::InvalidCacheScopeData);
        }
        let key = self.key();
        SCOPES.with(|scopes| {
            let mut scopes = scopes.borrow_mut();
            if let Some(stack) = scopes.get_mut(&key) {
                stack.pop();
                if stack.is_empty() {
                    scopes.remove(&key);
                }
            }
        });
        Ok(())
    }

    /// Whether `data` holds the cache of the innermost scope open on this
    /// thread, i.e. whether `end(data)` would succeed.
    pub fn is_innermost(&self, data: &CacheScopeData) -> bool {
        let Some(cache) = data.get::<C>() else {
            return false;
        };
        SCOPES.with(|scopes| {
            scopes
                .borrow()
                .get(&self.key())
                .and_then(|stack| stack.last())
                .is_some_and(|top| std::ptr::addr_eq(Arc::as_ptr(top), Arc::as_ptr(&cache)))
        })
    }

    /// Cache of the innermost open scope on this thread.
    pub fn current(&self) -> Option<Arc<C>> {
        SCOPES.with(|scopes| {
            scopes
                .borrow()
                .get(&self.key())
                .and_then(|stack| stack.last().cloned())
                .and_then(|top| top.downcast::<C>().ok())
        })
    }

    pub fn depth(&self) -> usize {
        SCOPES.with(|scopes| scopes.borrow().get(&self.key()).map_or(0, Vec::len))
    }

    /// Drop every scope this owner has open on the current thread.
    pub fn clear_current_thread(&self) {
        let key = self.key();
        let _ = SCOPES.try_with(|scopes| scopes.borrow_mut().remove(&key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Memo(Mutex<Vec<u32>>);

    #[test]
    fn test_nested_scopes_share_one_cache() {
        let scopes = ThreadLocalScopedCache::<Memo>::new(u64::MAX - 10);
        let mut outer = CacheScopeData::new();
        let first = scopes.begin(&mut outer);
        first.0.lock().unwrap().push(1);

        let mut inner = CacheScopeData::new();
        let second = scopes.begin(&mut inner);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second.0.lock().unwrap(), vec![1]);
        assert_eq!(scopes.depth(), 2);

        scopes.end(&inner).unwrap();
        scopes.end(&outer).unwrap();
        assert!(scopes.current().is_none());

        let mut fresh = CacheScopeData::new();
        let third = scopes.begin(&mut fresh);
        assert!(!Arc::ptr_eq(&first, &third));
        scopes.end(&fresh).unwrap();
    }

    #[test]
    fn test_end_rejects_foreign_data() {
        let scopes = ThreadLocalScopedCache::<Memo>::new(u64::MAX - 11);
        assert_eq!(
            scopes.end(&CacheScopeData::new()),
            Err(ResolverError::InvalidCacheScopeData)
        );

        let mut data = CacheScopeData::new();
        scopes.begin(&mut data);
        let mut other = CacheScopeData::new();
        other.set(Arc::new(Memo::default()));
        assert!(!scopes.is_innermost(&other));
        assert_eq!(scopes.end(&other), Err(ResolverError::InvalidCacheScopeData));
        assert_eq!(scopes.depth(), 1);
        assert!(scopes.is_innermost(&data));
        scopes.end(&data).unwrap();
        assert!(!scopes.is_innermost(&data));
    }

    #[test]
    fn test_data_carries_cache_to_another_thread() {
        let scopes = ThreadLocalScopedCache::<Memo>::new(u64::MAX - 12);
        let mut data = CacheScopeData::new();
        let cache = scopes.begin(&mut data);

        let shared = data.clone();
        std::thread::scope(|s| {
            s.spawn(|| {
                let mut joined = shared.clone();
                let there = scopes.begin(&mut joined);
                assert!(Arc::ptr_eq(&cache, &there));
                scopes.end(&joined).unwrap();
            });
        });
        scopes.end(&data).unwrap();
    }
}
