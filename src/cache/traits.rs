//! Core traits and types for the caching system.

use chrono::Duration;
use futures::future::BoxFuture;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use crate::error::FetchError;

/// Identifies one cached query.
///
/// Two keys that describe the same query must produce the same
/// `cache_hash`, whatever their object identity.
pub trait QueryKey: Clone + Debug + Send + Sync + 'static {
  /// Stable, fixed-length identifier used as the store key
  fn cache_hash(&self) -> &str;

  /// Human-readable label for logs
  fn description(&self) -> String;
}

/// Factory for the future that loads a query's data.
///
/// Called once per fetch generation. Entries keep the last fetcher they
/// were read with so invalidation can refetch observed keys by itself.
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, FetchError>> + Send + Sync>;

/// Wrap an async closure as a [`Fetcher`].
pub fn fetcher<T, F, Fut>(f: F) -> Fetcher<T>
where
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
  Arc::new(move || Box::pin(f()))
}

/// Timing knobs for a [`QueryCache`](super::QueryCache).
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
  /// How long a successful result counts as fresh
  pub stale_time: Duration,
  /// How long an unobserved entry is kept before `collect_garbage` drops it
  pub gc_time: Duration,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_time: Duration::minutes(1),
      gc_time: Duration::minutes(5),
    }
  }
}

/// Extra behaviour for a single `read`.
#[derive(Debug, Clone)]
pub struct ReadOptions<K> {
  /// While the requested key has no data yet, serve this key's data as a
  /// placeholder (keeps the previous page visible during pagination).
  pub keep_previous_from: Option<K>,
}

impl<K> Default for ReadOptions<K> {
  fn default() -> Self {
    Self {
      keep_previous_from: None,
    }
  }
}
