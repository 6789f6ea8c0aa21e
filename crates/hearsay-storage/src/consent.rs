//! In-memory consent cache — which handles may have their messages captured.
//!
//! The persisted `opt` flag is the source of truth. The cache holds the
//! opted-in handles so the event path never has to hit the store, and every
//! consent-changing command updates it right after committing the flag.

use crate::Store;
use hearsay_core::error::HearsayError;
use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

/// Process-lifetime set of eligible (opted-in) handles. Clones share state.
#[derive(Clone, Default)]
pub struct ConsentCache {
    handles: Arc<RwLock<HashSet<String>>>,
}

impl ConsentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache from persisted consent flags. Returns the number of handles loaded.
    pub async fn load(&self, store: &Store) -> Result<usize, HearsayError> {
        let eligible = store.eligible_handles().await?;
        let count = eligible.len();
        self.write().extend(eligible);
        info!("consent cache loaded with {count} opted-in handles");
        Ok(count)
    }

    pub fn is_eligible(&self, handle: &str) -> bool {
        self.read().contains(handle)
    }

    /// Mark a handle eligible. Idempotent.
    pub fn record_opt_in(&self, handle: &str) {
        self.write().insert(handle.to_string());
    }

    /// Mark a handle ineligible. Idempotent.
    pub fn record_opt_out(&self, handle: &str) {
        self.write().remove(handle);
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // Every mutation is a single insert/remove, so a poisoned lock still holds a valid set.
    fn read(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.handles.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.handles.write().unwrap_or_else(|e| e.into_inner())
    }
}
