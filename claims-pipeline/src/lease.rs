//! Exclusive per-claim lease.
//!
//! Two orchestrator runs against the same claim id must not interleave
//! (double submission, duplicate events). Runs against different claims
//! proceed concurrently. Map entries are evicted once the last holder or
//! waiter for a claim id is gone, so the map does not grow with the
//! process lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

type LeaseMap = StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>;

#[derive(Default)]
pub struct ClaimLeases {
    inner: Arc<LeaseMap>,
}

/// Held lease over one claim id. Releases on drop, including on error
/// and cancellation paths.
pub struct ClaimLease {
    map: Arc<LeaseMap>,
    claim_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ClaimLease {
    fn drop(&mut self) {
        // Release the lock before inspecting the refcount.
        self.guard.take();
        let mut map = self
            .map
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(cell) = map.get(&self.claim_id) {
            // The map holds the only remaining reference: no holder, no
            // waiters.
            if Arc::strong_count(cell) == 1 {
                map.remove(&self.claim_id);
            }
        }
    }
}

impl ClaimLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until the claim's lease is free.
    pub async fn acquire(&self, claim_id: Uuid) -> ClaimLease {
        let cell = {
            let mut map = self
                .inner
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            Arc::clone(map.entry(claim_id).or_default())
        };
        let guard = cell.lock_owned().await;
        ClaimLease {
            map: Arc::clone(&self.inner),
            claim_id,
            guard: Some(guard),
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn held_lease_blocks_a_second_acquire() {
        let leases = ClaimLeases::new();
        let id = Uuid::new_v4();

        let guard = leases.acquire(id).await;
        assert!(timeout(Duration::from_millis(20), leases.acquire(id))
            .await
            .is_err());
        drop(guard);
        assert!(timeout(Duration::from_millis(20), leases.acquire(id))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn different_claims_do_not_contend() {
        let leases = ClaimLeases::new();
        let _a = leases.acquire(Uuid::new_v4()).await;
        assert!(timeout(Duration::from_millis(20), leases.acquire(Uuid::new_v4()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn released_leases_are_evicted_from_the_map() {
        let leases = ClaimLeases::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let guard_a = leases.acquire(a).await;
        let guard_b = leases.acquire(b).await;
        assert_eq!(leases.tracked(), 2);

        drop(guard_a);
        assert_eq!(leases.tracked(), 1);
        drop(guard_b);
        assert_eq!(leases.tracked(), 0);
    }

    #[tokio::test]
    async fn contended_entries_survive_until_the_last_waiter_releases() {
        let leases = Arc::new(ClaimLeases::new());
        let id = Uuid::new_v4();

        let first = leases.acquire(id).await;
        let waiter = {
            let leases = Arc::clone(&leases);
            tokio::spawn(async move {
                let _second = leases.acquire(id).await;
            })
        };
        // Give the waiter time to register on the entry, then hand over.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(leases.tracked(), 1);
        drop(first);

        waiter.await.unwrap();
        assert_eq!(leases.tracked(), 0);
    }
}
