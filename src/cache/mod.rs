//! Generic in-memory query cache.
//!
//! This module knows nothing about the admin backends. It provides:
//! - One entry per query key, with an empty/loading/fresh/stale/error lifecycle
//! - Deduplication of concurrent reads into a single fetch
//! - Stale-while-revalidate: data survives failures and invalidation
//! - Generation-tagged fetches, so late results of superseded fetches are dropped
//! - Predicate-based invalidation and observer-aware refetching

mod entry;
mod layer;
#[cfg(test)]
pub(crate) mod testing;
mod traits;

pub use entry::{CacheStatus, QuerySnapshot};
pub use layer::QueryCache;
pub(crate) use layer::{lock, unsubscribe, Store};
pub use traits::{fetcher, CacheConfig, Fetcher, QueryKey, ReadOptions};
