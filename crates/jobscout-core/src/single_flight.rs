//! Per-key async locks so only one live scrape runs per cache key.
//!
//! Callers that lose the race wait on the same lock and, once it is released,
//! re-check the cache instead of scraping again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct KeyedLocks {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

#[derive(Default)]
struct Slot {
    lock: Arc<AsyncMutex<()>>,
    // The holder plus everyone still waiting.
    users: usize,
}

/// Counts one user of a key from the moment it asks for the lock until it
/// releases the lock or stops waiting. The last one out removes the key.
struct Registration {
    key: String,
    registry: KeyedLocks,
}

/// Held for the duration of a live scrape. Dropping it releases the key.
pub struct KeyGuard {
    // Unlocks before the registration is dropped.
    _guard: OwnedMutexGuard<()>,
    _registration: Registration,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other holder has `key`, then take it.
    ///
    /// Cancelling the returned future while it waits leaves no trace in the
    /// registry.
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let (lock, registration) = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = slots.entry(key.to_string()).or_default();
            slot.users += 1;
            let registration = Registration {
                key: key.to_string(),
                registry: self.clone(),
            };
            (Arc::clone(&slot.lock), registration)
        };

        let guard = lock.lock_owned().await;

        KeyGuard {
            _guard: guard,
            _registration: registration,
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        let mut slots = self
            .registry
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = slots.get_mut(&self.key) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                slots.remove(&self.key);
            }
        }
    }
}
