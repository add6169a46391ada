//! Query cache that deduplicates fetches and tracks staleness per key.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::entry::{CacheEntry, CacheStatus, QuerySnapshot};
use super::traits::{CacheConfig, Fetcher, QueryKey, ReadOptions};
use crate::error::FetchError;
use crate::query::Subscription;

pub(crate) type Entries<K, T> = HashMap<String, CacheEntry<K, T>>;
pub(crate) type Store<K, T> = Mutex<Entries<K, T>>;

/// Keyed store of query results.
///
/// All bookkeeping happens under one lock that is never held across an
/// await, so transitions for a key never interleave. Fetches run as tokio
/// tasks tagged with the entry's generation; a task whose generation is no
/// longer current settles into nothing.
///
/// Cloning is cheap and every clone shares the same entries.
pub struct QueryCache<K, T> {
  store: Arc<Store<K, T>>,
  config: CacheConfig,
}

impl<K: QueryKey, T: Send + Sync + 'static> QueryCache<K, T> {
  pub fn new(config: CacheConfig) -> Self {
    Self {
      store: Arc::new(Mutex::new(HashMap::new())),
      config,
    }
  }

  /// Return the current state of `key`, starting a fetch if the entry is
  /// empty, stale, expired or failed.
  ///
  /// A read while the key is already loading attaches to the in-flight
  /// task instead of starting another one. Must be called from within a
  /// tokio runtime.
  pub fn read(&self, key: &K, fetcher: Fetcher<T>) -> QuerySnapshot<K, T> {
    self.read_with(key, fetcher, ReadOptions::default())
  }

  pub fn read_with(
    &self,
    key: &K,
    fetcher: Fetcher<T>,
    options: ReadOptions<K>,
  ) -> QuerySnapshot<K, T> {
    let mut entries = lock(&self.store);

    let entry = entries
      .entry(key.cache_hash().to_string())
      .or_insert_with(|| CacheEntry::new(key.clone()));
    entry.fetcher = Some(fetcher);
    entry.last_observed = Utc::now();

    if entry.needs_fetch(self.config.stale_time) {
      start_fetch(&self.store, entry);
    }

    let mut snapshot = entry.snapshot();

    if snapshot.data.is_none() {
      let previous = options
        .keep_previous_from
        .as_ref()
        .and_then(|previous| entries.get(previous.cache_hash()))
        .and_then(|previous| previous.data.clone());

      if let Some(data) = previous {
        snapshot.data = Some(data);
        snapshot.is_placeholder = true;
      }
    }

    snapshot
  }

  /// Read `key` and wait until it settles.
  ///
  /// Holds an observer for the duration of the wait, so the fetch is not
  /// abandoned underneath it.
  pub async fn fetch(&self, key: &K, fetcher: Fetcher<T>) -> Result<Arc<T>, FetchError> {
    let mut subscription = self.subscribe(key);
    let mut snapshot = self.read(key, fetcher.clone());

    loop {
      match snapshot.status {
        CacheStatus::Fresh if snapshot.data.is_some() => {
          return snapshot.data.ok_or(FetchError::Cancelled);
        }
        CacheStatus::Error => {
          return Err(snapshot.error.unwrap_or(FetchError::Cancelled));
        }
        CacheStatus::Loading => {
          if !subscription.changed().await {
            return Err(FetchError::Cancelled);
          }
          snapshot = self.peek(key).ok_or(FetchError::Cancelled)?;
        }
        CacheStatus::Fresh | CacheStatus::Empty | CacheStatus::Stale => {
          snapshot = self.read(key, fetcher.clone());
        }
      }
    }
  }

  /// Current state of `key` without triggering anything.
  pub fn peek(&self, key: &K) -> Option<QuerySnapshot<K, T>> {
    lock(&self.store)
      .get(key.cache_hash())
      .map(CacheEntry::snapshot)
  }

  /// Register an observer for `key`.
  ///
  /// Observed entries are refetched as soon as they are invalidated.
  /// Dropping the last observer of a loading entry abandons its pending
  /// result.
  pub fn subscribe(&self, key: &K) -> Subscription<K, T> {
    let mut entries = lock(&self.store);
    let entry = entries
      .entry(key.cache_hash().to_string())
      .or_insert_with(|| CacheEntry::new(key.clone()));
    entry.observers += 1;
    entry.last_observed = Utc::now();

    Subscription::new(key.clone(), entry.watch(), Arc::downgrade(&self.store))
  }

  /// Start a new fetch for `key` even if one is already running.
  ///
  /// Returns false if the key has never been read (no fetcher known).
  pub fn refetch(&self, key: &K) -> bool {
    let mut entries = lock(&self.store);
    match entries.get_mut(key.cache_hash()) {
      Some(entry) => start_fetch(&self.store, entry),
      None => false,
    }
  }

  /// Mark every entry whose key matches `predicate` as stale.
  ///
  /// Results still in flight for those keys are discarded. Observed
  /// entries are refetched right away, the rest on their next read.
  pub fn invalidate<P>(&self, predicate: P) -> usize
  where
    P: Fn(&K) -> bool,
  {
    let mut entries = lock(&self.store);
    let mut invalidated = 0;

    for entry in entries.values_mut().filter(|entry| predicate(&entry.key)) {
      invalidated += 1;
      entry.supersede();
      entry.status = CacheStatus::Stale;

      if entry.observers > 0 && start_fetch(&self.store, entry) {
        continue;
      }
      entry.notify();
    }

    debug!(invalidated, "invalidated queries");
    invalidated
  }

  /// Drop entries nobody has looked at for `gc_time`.
  pub fn collect_garbage(&self) -> usize {
    let now = Utc::now();
    let gc_time = self.config.gc_time;
    let mut entries = lock(&self.store);
    let before = entries.len();

    entries.retain(|_, entry| {
      entry.observers > 0 || entry.in_flight.is_some() || now - entry.last_observed < gc_time
    });

    let evicted = before - entries.len();
    if evicted > 0 {
      debug!(evicted, remaining = entries.len(), "evicted unobserved queries");
    }
    evicted
  }

  /// Number of entries currently held, observed or not.
  pub fn entry_count(&self) -> usize {
    lock(&self.store).len()
  }
}

impl<K, T> Clone for QueryCache<K, T> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      config: self.config,
    }
  }
}

pub(crate) fn lock<K, T>(store: &Store<K, T>) -> MutexGuard<'_, Entries<K, T>> {
  store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Spawn a fetch for `entry` under a new generation.
fn start_fetch<K: QueryKey, T: Send + Sync + 'static>(
  store: &Arc<Store<K, T>>,
  entry: &mut CacheEntry<K, T>,
) -> bool {
  let Some(fetcher) = entry.fetcher.clone() else {
    return false;
  };

  entry.supersede();
  entry.status = CacheStatus::Loading;
  let generation = entry.generation;
  debug!(query = %entry.key.description(), generation, "fetching");

  let hash = entry.key.cache_hash().to_string();
  let store = Arc::downgrade(store);
  let future = fetcher();

  tokio::spawn(async move {
    let result = future.await;
    if let Some(store) = store.upgrade() {
      settle(&store, &hash, generation, result);
    }
  });

  entry.in_flight = Some(generation);
  entry.notify();
  true
}

/// Apply a finished fetch, unless a newer generation took its place.
fn settle<K: QueryKey, T>(
  store: &Store<K, T>,
  hash: &str,
  generation: u64,
  result: Result<T, FetchError>,
) {
  let mut entries = lock(store);
  let Some(entry) = entries.get_mut(hash) else {
    return;
  };

  if entry.in_flight != Some(generation) {
    debug!(
      query = %entry.key.description(),
      generation,
      current = entry.generation,
      "discarding superseded result"
    );
    return;
  }

  entry.in_flight = None;
  match result {
    Ok(data) => {
      entry.data = Some(Arc::new(data));
      entry.error = None;
      entry.status = CacheStatus::Fresh;
      entry.fetched_at = Some(Utc::now());
    }
    Err(error) => {
      warn!(query = %entry.key.description(), %error, "fetch failed");
      entry.error = Some(error);
      entry.status = CacheStatus::Error;
    }
  }
  entry.notify();
}

/// Release one observer of `key`.
pub(crate) fn unsubscribe<K: QueryKey, T>(store: &Store<K, T>, key: &K) {
  let mut entries = lock(store);
  let Some(entry) = entries.get_mut(key.cache_hash()) else {
    return;
  };

  entry.observers = entry.observers.saturating_sub(1);
  entry.last_observed = Utc::now();

  if entry.observers == 0 && entry.status == CacheStatus::Loading {
    debug!(query = %entry.key.description(), "no observers left, abandoning fetch");
    entry.supersede();
    entry.status = if entry.data.is_some() {
      CacheStatus::Stale
    } else {
      CacheStatus::Empty
    };
    entry.notify();
  }
}
