//! Writes through the adapter, followed by cache invalidation.
//!
//! A successful mutation marks every list of the affected kind stale (all
//! pages and filters, since any of them may now be off) together with the
//! mutated record and any kinds derived from it. A failed mutation leaves
//! the cache alone and hands the error back.

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::adapter::Adapter;
use crate::api::cache::AdminQueryKey;
use crate::api::cached_client::AdminCache;
use crate::api::types::{Record, RecordId, ResourceKind};
use crate::error::FetchResult;

/// A write against one resource kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
  Create {
    kind: ResourceKind,
    payload: Record,
  },
  Update {
    kind: ResourceKind,
    id: RecordId,
    payload: Record,
  },
  Delete {
    kind: ResourceKind,
    id: RecordId,
  },
}

impl Mutation {
  pub fn kind(&self) -> ResourceKind {
    match self {
      Self::Create { kind, .. } | Self::Update { kind, .. } | Self::Delete { kind, .. } => *kind,
    }
  }

  /// Record addressed by the mutation, if it already existed.
  pub fn target(&self) -> Option<&RecordId> {
    match self {
      Self::Create { .. } => None,
      Self::Update { id, .. } | Self::Delete { id, .. } => Some(id),
    }
  }

  fn verb(&self) -> &'static str {
    match self {
      Self::Create { .. } => "create",
      Self::Update { .. } => "update",
      Self::Delete { .. } => "delete",
    }
  }

  /// Whether a successful run of this mutation makes `key` outdated.
  pub fn affects(&self, key: &AdminQueryKey) -> bool {
    let kind = self.kind();
    if kind.dependents().contains(&key.kind()) {
      return true;
    }
    if key.kind() != kind {
      return false;
    }
    match key.params().id() {
      None => true,
      Some(id) => self.target() == Some(id),
    }
  }
}

pub struct MutationCoordinator {
  adapter: Arc<dyn Adapter>,
  cache: AdminCache,
}

impl MutationCoordinator {
  pub fn new(adapter: Arc<dyn Adapter>, cache: AdminCache) -> Self {
    Self { adapter, cache }
  }

  /// Run `mutation`. Returns the record the backend answered with, or
  /// `None` for deletes.
  pub async fn mutate(&self, mutation: Mutation) -> FetchResult<Option<Record>> {
    let result = match &mutation {
      Mutation::Create { kind, payload } => self.adapter.create(*kind, payload).await.map(Some),
      Mutation::Update { kind, id, payload } => {
        self.adapter.update(*kind, id, payload).await.map(Some)
      }
      Mutation::Delete { kind, id } => self.adapter.remove(*kind, id).await.map(|_| None),
    };

    match result {
      Ok(record) => {
        let invalidated = self.cache.invalidate(|key| mutation.affects(key));
        info!(
          kind = %mutation.kind(),
          operation = mutation.verb(),
          invalidated,
          "mutation applied"
        );
        Ok(record)
      }
      Err(error) => {
        warn!(kind = %mutation.kind(), operation = mutation.verb(), %error, "mutation failed");
        Err(error)
      }
    }
  }

  pub async fn create(&self, kind: ResourceKind, payload: Record) -> FetchResult<Record> {
    let record = self.mutate(Mutation::Create { kind, payload }).await?;
    Ok(record.unwrap_or_default())
  }

  pub async fn update(&self, kind: ResourceKind, id: RecordId, payload: Record) -> FetchResult<Record> {
    let record = self.mutate(Mutation::Update { kind, id, payload }).await?;
    Ok(record.unwrap_or_default())
  }

  pub async fn delete(&self, kind: ResourceKind, id: RecordId) -> FetchResult<()> {
    self.mutate(Mutation::Delete { kind, id }).await.map(|_| ())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::cache::QueryParams;
  use crate::api::cached_client::AdminClient;
  use crate::api::fake::FakeBackend;
  use crate::cache::{CacheConfig, CacheStatus};
  use crate::error::FetchError;

  fn setup(products: u64, orders: u64) -> (Arc<FakeBackend>, AdminClient) {
    let backend = Arc::new(FakeBackend::seeded(products, orders));
    let client = AdminClient::with_adapter(backend.clone(), CacheConfig::default());
    (backend, client)
  }

  fn status(client: &AdminClient, key: &AdminQueryKey) -> CacheStatus {
    client.cache().peek(key).map(|s| s.status).unwrap_or(CacheStatus::Empty)
  }

  #[test]
  fn test_affects_lists_and_target_record() {
    let update = Mutation::Update {
      kind: ResourceKind::Products,
      id: RecordId::from(7),
      payload: Record::new(),
    };

    let list = AdminQueryKey::list(
      ResourceKind::Products,
      QueryParams::page(3, 10).with_filter(Some("lamp")),
    );
    assert!(update.affects(&list));
    assert!(update.affects(&AdminQueryKey::record(ResourceKind::Products, RecordId::from(7))));
    assert!(!update.affects(&AdminQueryKey::record(ResourceKind::Products, RecordId::from(8))));
    assert!(!update.affects(&AdminQueryKey::list(ResourceKind::Orders, QueryParams::default())));
    assert!(!update.affects(&AdminQueryKey::revenue()));
  }

  #[test]
  fn test_order_mutations_affect_revenue() {
    let delete = Mutation::Delete {
      kind: ResourceKind::Orders,
      id: RecordId::from(1),
    };
    assert!(delete.affects(&AdminQueryKey::revenue()));
    assert!(delete.affects(&AdminQueryKey::list(ResourceKind::Orders, QueryParams::default())));
    assert!(!delete.affects(&AdminQueryKey::list(ResourceKind::Products, QueryParams::default())));
  }

  #[tokio::test]
  async fn test_update_marks_lists_and_record_stale() {
    let (_, client) = setup(20, 0);
    let page_one = AdminQueryKey::list(ResourceKind::Products, QueryParams::page(1, 10));
    let page_two = AdminQueryKey::list(ResourceKind::Products, QueryParams::page(2, 10));
    let record = AdminQueryKey::record(ResourceKind::Products, RecordId::from(7));
    let other = AdminQueryKey::record(ResourceKind::Products, RecordId::from(8));

    client.list(ResourceKind::Products, QueryParams::page(1, 10)).await.unwrap();
    client.list(ResourceKind::Products, QueryParams::page(2, 10)).await.unwrap();
    client.record(ResourceKind::Products, RecordId::from(7)).await.unwrap();
    client.record(ResourceKind::Products, RecordId::from(8)).await.unwrap();

    let updated = client
      .mutations()
      .update(
        ResourceKind::Products,
        RecordId::from(7),
        Record::new().with("price", 99.0),
      )
      .await
      .unwrap();
    assert_eq!(updated.get("price"), Some(&serde_json::json!(99.0)));

    assert_eq!(status(&client, &page_one), CacheStatus::Stale);
    assert_eq!(status(&client, &page_two), CacheStatus::Stale);
    assert_eq!(status(&client, &record), CacheStatus::Stale);
    assert_eq!(status(&client, &other), CacheStatus::Fresh);
  }

  #[tokio::test]
  async fn test_failed_mutation_leaves_cache_untouched() {
    let (backend, client) = setup(20, 0);
    let key = AdminQueryKey::list(ResourceKind::Products, QueryParams::page(1, 10));
    client.list(ResourceKind::Products, QueryParams::page(1, 10)).await.unwrap();

    backend.set_failing(true);
    let result = client
      .mutations()
      .delete(ResourceKind::Products, RecordId::from(1))
      .await;

    assert!(matches!(result, Err(FetchError::Transport { .. })));
    assert_eq!(status(&client, &key), CacheStatus::Fresh);
    assert_eq!(backend.mutation_calls(), 1);
    assert_eq!(backend.list_calls(), 1);
  }

  #[tokio::test]
  async fn test_create_then_list_shows_new_total() {
    let (backend, client) = setup(42, 0);
    let before = client
      .list(ResourceKind::Products, QueryParams::page(1, 10))
      .await
      .unwrap();

    let created = client
      .mutations()
      .create(
        ResourceKind::Products,
        Record::new().with("title", "Desk lamp").with("price", 20.0),
      )
      .await
      .unwrap();
    assert!(created.id().is_some());

    let after = client
      .list(ResourceKind::Products, QueryParams::page(1, 10))
      .await
      .unwrap();
    assert_eq!(after.total, before.total + 1);
    assert_eq!(backend.mutation_calls(), 1);
    assert_eq!(backend.list_calls(), 2);
  }

  #[tokio::test]
  async fn test_invalidation_refetches_observed_list() {
    let (backend, client) = setup(42, 0);
    let key = AdminQueryKey::list(ResourceKind::Products, QueryParams::page(1, 10));
    let mut subscription = client.subscribe(&key);
    client.read(&key);
    subscription.settled().await.unwrap();

    client
      .mutations()
      .delete(ResourceKind::Products, RecordId::from(1))
      .await
      .unwrap();
    assert_eq!(status(&client, &key), CacheStatus::Loading);

    let snapshot = subscription.settled().await.unwrap();
    assert_eq!(snapshot.data().and_then(|d| d.page()).map(|p| p.total), Some(41));
    assert_eq!(backend.list_calls(), 2);
  }
}
