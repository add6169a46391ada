//! Cache entries and the snapshots handed out to readers.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::watch;

use super::traits::Fetcher;
use crate::error::FetchError;

/// Lifecycle state of a cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
  /// Referenced but never fetched
  Empty,
  /// A fetch is in flight
  Loading,
  /// Last fetch succeeded and nothing invalidated it since
  Fresh,
  /// Data is no longer authoritative and will be refetched on next access
  Stale,
  /// Last fetch failed; any earlier data is still there
  Error,
}

/// Read-only view of an entry at one point in time.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<K, T> {
  pub key: K,
  pub status: CacheStatus,
  pub data: Option<Arc<T>>,
  pub error: Option<FetchError>,
  pub fetched_at: Option<DateTime<Utc>>,
  /// `data` belongs to another key, shown until this one loads
  pub is_placeholder: bool,
}

impl<K, T> QuerySnapshot<K, T> {
  pub fn is_loading(&self) -> bool {
    self.status == CacheStatus::Loading
  }

  pub fn is_fresh(&self) -> bool {
    self.status == CacheStatus::Fresh
  }

  pub fn is_error(&self) -> bool {
    self.status == CacheStatus::Error
  }

  pub fn data(&self) -> Option<&T> {
    self.data.as_deref()
  }

  pub fn error(&self) -> Option<&FetchError> {
    self.error.as_ref()
  }
}

/// One cached query. Only the cache touches these.
pub(crate) struct CacheEntry<K, T> {
  pub key: K,
  pub status: CacheStatus,
  pub data: Option<Arc<T>>,
  pub error: Option<FetchError>,
  pub fetched_at: Option<DateTime<Utc>>,
  /// Generation of the fetch whose result is still awaited
  pub in_flight: Option<u64>,
  /// Bumped whenever a fetch starts or the current one is superseded
  pub generation: u64,
  pub fetcher: Option<Fetcher<T>>,
  pub observers: usize,
  pub last_observed: DateTime<Utc>,
  changes: watch::Sender<u64>,
}

impl<K: Clone, T> CacheEntry<K, T> {
  pub fn new(key: K) -> Self {
    let (changes, _) = watch::channel(0);
    Self {
      key,
      status: CacheStatus::Empty,
      data: None,
      error: None,
      fetched_at: None,
      in_flight: None,
      generation: 0,
      fetcher: None,
      observers: 0,
      last_observed: Utc::now(),
      changes,
    }
  }

  pub fn snapshot(&self) -> QuerySnapshot<K, T> {
    QuerySnapshot {
      key: self.key.clone(),
      status: self.status,
      data: self.data.clone(),
      error: self.error.clone(),
      fetched_at: self.fetched_at,
      is_placeholder: false,
    }
  }

  /// Whether a fresh entry has outlived `stale_time`.
  pub fn is_expired(&self, stale_time: Duration) -> bool {
    match self.fetched_at {
      Some(fetched_at) => Utc::now() - fetched_at >= stale_time,
      None => true,
    }
  }

  /// Whether a `read` should start a fetch.
  pub fn needs_fetch(&self, stale_time: Duration) -> bool {
    match self.status {
      CacheStatus::Loading => false,
      CacheStatus::Fresh => self.is_expired(stale_time),
      CacheStatus::Empty | CacheStatus::Stale | CacheStatus::Error => true,
    }
  }

  /// Drop whatever is in flight so its result is ignored on settlement.
  pub fn supersede(&mut self) {
    self.generation += 1;
    self.in_flight = None;
  }

  pub fn watch(&self) -> watch::Receiver<u64> {
    self.changes.subscribe()
  }

  pub fn notify(&self) {
    self.changes.send_modify(|version| *version += 1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_new_entry_needs_fetch() {
    let entry: CacheEntry<&str, i32> = CacheEntry::new("k");
    assert_eq!(entry.status, CacheStatus::Empty);
    assert!(entry.needs_fetch(Duration::minutes(1)));
  }

  #[test]
  fn test_fresh_entry_expires_after_stale_time() {
    let mut entry: CacheEntry<&str, i32> = CacheEntry::new("k");
    entry.status = CacheStatus::Fresh;
    entry.fetched_at = Some(Utc::now());
    assert!(!entry.needs_fetch(Duration::minutes(1)));
    assert!(entry.needs_fetch(Duration::zero()));

    entry.fetched_at = Some(Utc::now() - Duration::minutes(2));
    assert!(entry.needs_fetch(Duration::minutes(1)));
  }

  #[test]
  fn test_loading_entry_never_needs_fetch() {
    let mut entry: CacheEntry<&str, i32> = CacheEntry::new("k");
    entry.status = CacheStatus::Loading;
    assert!(!entry.needs_fetch(Duration::zero()));
  }

  #[test]
  fn test_notify_reaches_watchers() {
    let entry: CacheEntry<&str, i32> = CacheEntry::new("k");
    let mut rx = entry.watch();
    assert!(!rx.has_changed().unwrap());
    entry.notify();
    assert!(rx.has_changed().unwrap());
    rx.borrow_and_update();
    assert!(!rx.has_changed().unwrap());
  }
}
