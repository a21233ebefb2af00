//! Per-name mutual exclusion for registration attempts.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::actor::normalize_name;

/// One async lock per normalized name.
///
/// Attempts for different names never wait on each other. An entry lives
/// only while some attempt holds or waits for it, including waiters that
/// are cancelled before they get the lock.
#[derive(Debug, Default)]
pub struct NameLocks {
    locks: Mutex<HashMap<String, Slot>>,
}

#[derive(Debug)]
struct Slot {
    mutex: Arc<AsyncMutex<()>>,
    /// Holders plus waiters.
    users: usize,
}

impl NameLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until no other attempt holds `name`, then hold it until the
    /// returned guard is dropped.
    pub async fn lock(&self, name: &str) -> NameGuard<'_> {
        let key = normalize_name(name);
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            let slot = locks.entry(key.clone()).or_insert_with(|| Slot {
                mutex: Arc::new(AsyncMutex::new(())),
                users: 0,
            });
            slot.users += 1;
            Arc::clone(&slot.mutex)
        };

        // Registered before waiting so a dropped future still gives it back.
        let claim = Claim {
            locks: self,
            name: key,
        };
        let guard = mutex.lock_owned().await;
        NameGuard {
            _guard: guard,
            claim,
        }
    }

    /// Number of names currently held or waited for.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, name: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot) = locks.get_mut(name) {
            slot.users -= 1;
            if slot.users == 0 {
                locks.remove(name);
            }
        }
    }
}

/// One holder's or waiter's share of a map entry.
#[derive(Debug)]
struct Claim<'a> {
    locks: &'a NameLocks,
    name: String,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.name);
    }
}

/// Holds a name lock; releases it on drop.
#[derive(Debug)]
pub struct NameGuard<'a> {
    // Fields drop in order: the mutex is unlocked before the entry is released.
    _guard: OwnedMutexGuard<()>,
    claim: Claim<'a>,
}

impl NameGuard<'_> {
    /// The normalized name this guard holds.
    pub fn name(&self) -> &str {
        &self.claim.name
    }
}
