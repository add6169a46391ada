//! Admin client that serves backend reads through the query cache.

use color_eyre::Result;
use std::sync::Arc;

use crate::cache::{fetcher, CacheConfig, Fetcher, QueryCache, QueryKey, QuerySnapshot, ReadOptions};
use crate::config::Config;
use crate::error::{FetchError, FetchResult};
use crate::mutation::MutationCoordinator;
use crate::query::Subscription;

use super::adapter::{connect, Adapter};
use super::cache::{AdminQueryKey, QueryParams};
use super::types::{DashboardMetrics, PaginatedResult, Record, RecordId, ResourceKind, RevenueSummary};

/// Whatever a query produced; the key's shape decides the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
  Page(PaginatedResult),
  Record(Record),
  Revenue(RevenueSummary),
}

impl QueryData {
  pub fn page(&self) -> Option<&PaginatedResult> {
    match self {
      Self::Page(page) => Some(page),
      _ => None,
    }
  }

  pub fn record(&self) -> Option<&Record> {
    match self {
      Self::Record(record) => Some(record),
      _ => None,
    }
  }

  pub fn revenue(&self) -> Option<&RevenueSummary> {
    match self {
      Self::Revenue(revenue) => Some(revenue),
      _ => None,
    }
  }
}

pub type AdminCache = QueryCache<AdminQueryKey, QueryData>;
pub type AdminSnapshot = QuerySnapshot<AdminQueryKey, QueryData>;
pub type AdminSubscription = Subscription<AdminQueryKey, QueryData>;

/// One adapter and one cache, shared by every view and mutation.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct AdminClient {
  adapter: Arc<dyn Adapter>,
  cache: AdminCache,
}

impl AdminClient {
  pub fn new(config: &Config) -> Result<Self> {
    let adapter = connect(&config.api)?;
    Ok(Self::with_adapter(adapter, config.cache.to_cache_config()))
  }

  pub fn with_adapter(adapter: Arc<dyn Adapter>, config: CacheConfig) -> Self {
    Self {
      adapter,
      cache: QueryCache::new(config),
    }
  }

  pub fn adapter(&self) -> &Arc<dyn Adapter> {
    &self.adapter
  }

  pub fn cache(&self) -> &AdminCache {
    &self.cache
  }

  /// Fetcher that loads `key` through the adapter.
  pub fn fetcher_for(&self, key: &AdminQueryKey) -> Fetcher<QueryData> {
    let adapter = Arc::clone(&self.adapter);
    let key = key.clone();

    fetcher(move || {
      let adapter = Arc::clone(&adapter);
      let key = key.clone();
      async move {
        match (key.kind(), key.params().id()) {
          (ResourceKind::RevenueSummary, _) => adapter.revenue_summary().await.map(QueryData::Revenue),
          (kind, Some(id)) => adapter.fetch_one(kind, id).await.map(QueryData::Record),
          (kind, None) => adapter
            .fetch_list(kind, key.params())
            .await
            .map(QueryData::Page),
        }
      }
    })
  }

  /// Non-blocking read, starting a fetch if needed.
  pub fn read(&self, key: &AdminQueryKey) -> AdminSnapshot {
    self.cache.read(key, self.fetcher_for(key))
  }

  /// Non-blocking read that shows `previous`'s data until `key` has its own.
  pub fn read_keeping(&self, key: &AdminQueryKey, previous: Option<&AdminQueryKey>) -> AdminSnapshot {
    self.cache.read_with(
      key,
      self.fetcher_for(key),
      ReadOptions {
        keep_previous_from: previous.cloned(),
      },
    )
  }

  pub fn subscribe(&self, key: &AdminQueryKey) -> AdminSubscription {
    self.cache.subscribe(key)
  }

  async fn fetch(&self, key: &AdminQueryKey) -> FetchResult<Arc<QueryData>> {
    self.cache.fetch(key, self.fetcher_for(key)).await
  }

  /// One page of a list, served from cache while fresh.
  pub async fn list(&self, kind: ResourceKind, params: QueryParams) -> FetchResult<PaginatedResult> {
    let key = AdminQueryKey::list(kind, params);
    let data = self.fetch(&key).await?;
    data.page().cloned().ok_or_else(|| shape_mismatch(&key))
  }

  pub async fn record(&self, kind: ResourceKind, id: RecordId) -> FetchResult<Record> {
    let key = AdminQueryKey::record(kind, id);
    let data = self.fetch(&key).await?;
    data.record().cloned().ok_or_else(|| shape_mismatch(&key))
  }

  pub async fn revenue(&self) -> FetchResult<RevenueSummary> {
    let key = AdminQueryKey::revenue();
    let data = self.fetch(&key).await?;
    data.revenue().cloned().ok_or_else(|| shape_mismatch(&key))
  }

  /// Headline numbers: list totals come from one-item pages.
  pub async fn dashboard(&self) -> FetchResult<DashboardMetrics> {
    let (products, orders, revenue) = tokio::try_join!(
      self.list(ResourceKind::Products, QueryParams::page(1, 1)),
      self.list(ResourceKind::Orders, QueryParams::page(1, 1)),
      self.revenue(),
    )?;

    Ok(DashboardMetrics {
      total_products: products.total,
      total_orders: orders.total,
      revenue,
    })
  }

  pub fn mutations(&self) -> MutationCoordinator {
    MutationCoordinator::new(Arc::clone(&self.adapter), self.cache.clone())
  }

  pub fn collect_garbage(&self) -> usize {
    self.cache.collect_garbage()
  }
}

fn shape_mismatch(key: &AdminQueryKey) -> FetchError {
  FetchError::Decode {
    url: key.description(),
    reason: "cached value does not match the query".to_string(),
  }
}
