//! Observer handles for cached queries.
//!
//! A `Subscription` is what a view holds while it displays a query. It
//! keeps the entry alive, gets the entry refetched when it is invalidated,
//! and reports changes either by polling in an event loop tick or by
//! awaiting.
//!
//! # Example
//!
//! ```ignore
//! let mut subscription = cache.subscribe(&key);
//! cache.read(&key, fetcher);
//!
//! // In event loop tick
//! if subscription.poll() {
//!     // State changed, re-render from subscription.snapshot()
//! }
//!
//! // Or, outside an event loop
//! let snapshot = subscription.settled().await;
//! ```

use std::sync::Weak;
use tokio::sync::watch;

use crate::cache::{lock, unsubscribe, QueryKey, QuerySnapshot, Store};

/// Registered observer of one cache entry.
///
/// Dropping the last subscription of an entry that is still loading
/// abandons the pending result (the request is not aborted, its result is
/// just ignored).
pub struct Subscription<K: QueryKey, T> {
  key: K,
  changes: watch::Receiver<u64>,
  store: Weak<Store<K, T>>,
}

impl<K: QueryKey, T> Subscription<K, T> {
  pub(crate) fn new(key: K, changes: watch::Receiver<u64>, store: Weak<Store<K, T>>) -> Self {
    Self {
      key,
      changes,
      store,
    }
  }

  /// Current state of the observed entry.
  ///
  /// `None` once the cache itself is gone.
  pub fn snapshot(&self) -> Option<QuerySnapshot<K, T>> {
    let store = self.store.upgrade()?;
    let entries = lock(&store);
    entries.get(self.key.cache_hash()).map(|entry| entry.snapshot())
  }

  /// Check for changes without blocking.
  ///
  /// Returns `true` if the entry changed since the last poll.
  /// Call this in your event loop tick handler.
  pub fn poll(&mut self) -> bool {
    match self.changes.has_changed() {
      Ok(true) => {
        self.changes.borrow_and_update();
        true
      }
      _ => false,
    }
  }

  /// Wait for the next change. Returns false if the entry is gone.
  pub async fn changed(&mut self) -> bool {
    self.changes.changed().await.is_ok()
  }

  /// Wait until the entry is no longer loading.
  pub async fn settled(&mut self) -> Option<QuerySnapshot<K, T>> {
    loop {
      let snapshot = self.snapshot()?;
      if !snapshot.is_loading() {
        return Some(snapshot);
      }
      if !self.changed().await {
        return None;
      }
    }
  }
}

impl<K: QueryKey, T> Drop for Subscription<K, T> {
  fn drop(&mut self) {
    if let Some(store) = self.store.upgrade() {
      unsubscribe(&store, &self.key);
    }
  }
}

impl<K: QueryKey, T> std::fmt::Debug for Subscription<K, T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Subscription")
      .field("key", &self.key)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use crate::cache::testing::{ready, Script, TestKey};
  use crate::cache::{CacheConfig, CacheStatus, QueryCache};
  use crate::error::FetchError;
  use std::time::Duration;

  fn cache() -> QueryCache<TestKey, String> {
    QueryCache::new(CacheConfig::default())
  }

  #[tokio::test]
  async fn test_subscription_success() {
    let cache = cache();
    let key = TestKey::new("products", 1);
    let mut subscription = cache.subscribe(&key);

    assert_eq!(
      subscription.snapshot().map(|s| s.status),
      Some(CacheStatus::Empty)
    );

    cache.read(&key, ready("data"));
    let snapshot = subscription.settled().await.unwrap();

    assert!(snapshot.is_fresh());
    assert_eq!(snapshot.data().map(String::as_str), Some("data"));
  }

  #[tokio::test]
  async fn test_subscription_error() {
    let cache = cache();
    let key = TestKey::new("products", 1);
    let mut subscription = cache.subscribe(&key);
    let script: Script<String> = Script::ready(vec![Err(FetchError::Validation(
      "Something went wrong".to_string(),
    ))]);

    cache.read(&key, script.fetcher());
    let snapshot = subscription.settled().await.unwrap();

    assert!(snapshot.is_error());
    assert_eq!(
      snapshot.error().map(|e| e.to_string()),
      Some("invalid payload: Something went wrong".to_string())
    );
  }

  #[tokio::test]
  async fn test_poll_reports_changes_once() {
    let cache = cache();
    let key = TestKey::new("products", 1);
    let mut subscription = cache.subscribe(&key);
    let mut script = Script::new(1);

    assert!(!subscription.poll());

    cache.read(&key, script.fetcher());
    assert!(subscription.poll());
    assert!(!subscription.poll());

    script.resolve(0, Ok("done".to_string()));
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(subscription.poll());
    assert!(subscription.snapshot().unwrap().is_fresh());
  }

  #[tokio::test]
  async fn test_subscription_outlives_cache() {
    let cache = cache();
    let key = TestKey::new("products", 1);
    let mut subscription = cache.subscribe(&key);
    drop(cache);

    assert!(subscription.snapshot().is_none());
    assert!(subscription.settled().await.is_none());
  }
}
