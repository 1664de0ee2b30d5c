//! Per-sender serialisation of conversation turns.
//!
//! A turn reads the latest state, advances it and appends the result. Two
//! turns for the same sender must not interleave or one of them is lost, so
//! each sender gets an async mutex. Different senders never contend.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use tokio::sync::OwnedMutexGuard;

/// Held for the duration of one turn.
pub struct SenderGuard {
  _guard: OwnedMutexGuard<()>,
}

#[derive(Clone, Default)]
pub struct SenderLocks {
  inner: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl SenderLocks {
  pub fn new() -> Self { Self::default() }

  /// Wait until no other turn for `sender` is running.
  pub async fn lock(&self, sender: &str) -> SenderGuard {
    let lock = {
      let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
      // Entries nobody holds or waits on only have the map's reference.
      map.retain(|_, lock| Arc::strong_count(lock) > 1);
      map.entry(sender.to_owned()).or_default().clone()
    };
    SenderGuard { _guard: lock.lock_owned().await }
  }

  /// Number of senders currently tracked.
  pub fn len(&self) -> usize {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use tokio::time::timeout;

  use super::*;

  const SHORT: Duration = Duration::from_millis(20);

  #[tokio::test]
  async fn same_sender_waits() {
    let locks = SenderLocks::new();
    let held = locks.lock("+15035550100").await;

    assert!(timeout(SHORT, locks.lock("+15035550100")).await.is_err());

    drop(held);
    assert!(timeout(SHORT, locks.lock("+15035550100")).await.is_ok());
  }

  #[tokio::test]
  async fn different_senders_do_not_contend() {
    let locks = SenderLocks::new();
    let _a = locks.lock("+15035550100").await;
    assert!(timeout(SHORT, locks.lock("+15035550101")).await.is_ok());
  }

  #[tokio::test]
  async fn idle_entries_are_pruned() {
    let locks = SenderLocks::new();
    drop(locks.lock("+15035550100").await);
    drop(locks.lock("+15035550101").await);
    let _held = locks.lock("+15035550102").await;
    assert_eq!(locks.len(), 1);
  }
}
