use assetres_api::{ResolvedPath, ResolverContext, ScopeData};
use dashmap::DashMap;
use std::sync::{Mutex, PoisonError};

/// One `ScopeData` per backend, stored in the data a client holds between
/// the begin and end of a scope.
#[derive(Debug)]
struct Slots(Mutex<Vec<ScopeData>>);

impl Slots {
    fn new(len: usize) -> Self {
        Self(Mutex::new(vec![ScopeData::new(); len]))
    }

    fn get(&self, idx: usize) -> ScopeData {
        let slots = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(idx).cloned().unwrap_or_default()
    }

    fn set(&self, idx: usize, data: ScopeData) {
        let mut slots = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(idx) {
            *slot = data;
        }
    }

    fn len(&self) -> usize {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Per-backend binding data for one `bind_context` call.
#[derive(Debug)]
pub(crate) struct BindingSlots(Slots);

impl BindingSlots {
    pub(crate) fn new(len: usize) -> Self {
        Self(Slots::new(len))
    }

    pub(crate) fn get(&self, idx: usize) -> ScopeData {
        self.0.get(idx)
    }

    pub(crate) fn set(&self, idx: usize, data: ScopeData) {
        self.0.set(idx, data)
    }
}

/// Per-backend cache-scope data, shared by every thread that joins the scope.
#[derive(Debug)]
pub(crate) struct CacheSlots(Slots);

impl CacheSlots {
    pub(crate) fn new(len: usize) -> Self {
        Self(Slots::new(len))
    }

    pub(crate) fn get(&self, idx: usize) -> ScopeData {
        self.0.get(idx)
    }

    pub(crate) fn set(&self, idx: usize, data: ScopeData) {
        self.0.set(idx, data)
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

/// Resolutions remembered while a cache scope is open, for backends that do
/// not cache on their own.
#[derive(Debug, Default)]
pub struct ResolveCache {
    entries: DashMap<(String, Option<ResolverContext>), ResolvedPath>,
}

impl ResolveCache {
    pub fn get(&self, asset_path: &str, context: Option<&ResolverContext>) -> Option<ResolvedPath> {
        self.entries
            .get(&(asset_path.to_string(), context.cloned()))
            .map(|entry| entry.value().clone())
    }

    pub fn insert(&self, asset_path: &str, context: Option<&ResolverContext>, resolved: ResolvedPath) {
        self.entries
            .insert((asset_path.to_string(), context.cloned()), resolved);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
