//! Per-order serialization
//!
//! Work on one order (recalculate, print, write markers back) runs under
//! that order's async mutex; different orders never contend. An entry
//! lives only while someone holds or waits on it.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

#[derive(Debug, Default, Clone)]
pub struct OrderLocks {
    locks: Arc<LockMap>,
}

/// Exclusive access to one order; evicts its map entry on release
#[derive(Debug)]
pub struct OrderGuard {
    order_id: String,
    locks: Arc<LockMap>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for OrderGuard {
    fn drop(&mut self) {
        // The owned guard holds a reference; release it before counting
        self.guard.take();
        // Waiters hold clones taken under the same shard lock
        self.locks
            .remove_if(&self.order_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl OrderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `order_id`
    pub async fn lock(&self, order_id: &str) -> OrderGuard {
        let lock = self
            .locks
            .entry(order_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        // DashMap shard guard is released before awaiting
        let guard = lock.lock_owned().await;
        OrderGuard {
            order_id: order_id.to_string(),
            locks: self.locks.clone(),
            guard: Some(guard),
        }
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
