//! Query keys for admin backend calls.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::cache::QueryKey;

use super::types::{RecordId, ResourceKind};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Request parameters of a query.
///
/// Page and limit are at least 1, and an empty filter is the same as no
/// filter, so structurally equal requests always compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryParams {
  page: u32,
  limit: u32,
  filter: Option<String>,
  id: Option<RecordId>,
}

impl QueryParams {
  /// Parameters of one page of a list.
  pub fn page(page: u32, limit: u32) -> Self {
    Self {
      page: page.max(1),
      limit: limit.max(1),
      filter: None,
      id: None,
    }
  }

  /// Parameters addressing a single record.
  pub fn record(id: RecordId) -> Self {
    Self {
      id: Some(id),
      ..Self::page(1, 1)
    }
  }

  pub fn with_filter(mut self, filter: Option<&str>) -> Self {
    self.filter = filter
      .map(str::trim)
      .filter(|f| !f.is_empty())
      .map(String::from);
    self
  }

  pub fn page_number(&self) -> u32 {
    self.page
  }

  pub fn limit(&self) -> u32 {
    self.limit
  }

  pub fn filter(&self) -> Option<&str> {
    self.filter.as_deref()
  }

  pub fn id(&self) -> Option<&RecordId> {
    self.id.as_ref()
  }

  /// Offset of the first item for offset-based backends.
  pub fn skip(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.limit)
  }
}

impl Default for QueryParams {
  fn default() -> Self {
    Self::page(1, DEFAULT_PAGE_SIZE)
  }
}

/// Field order here is the canonical serialization order.
#[derive(Serialize)]
struct CanonicalKey<'a> {
  kind: ResourceKind,
  page: u32,
  limit: u32,
  filter: Option<&'a str>,
  id: Option<&'a RecordId>,
}

/// Cache key for one admin query: a resource kind plus its parameters.
#[derive(Debug, Clone)]
pub struct AdminQueryKey {
  kind: ResourceKind,
  params: QueryParams,
  hash: String,
}

impl AdminQueryKey {
  pub fn new(kind: ResourceKind, params: QueryParams) -> Self {
    let canonical = CanonicalKey {
      kind,
      page: params.page,
      limit: params.limit,
      filter: params.filter(),
      id: params.id(),
    };
    // Plain strings and integers cannot fail to serialize
    let input = serde_json::to_string(&canonical).unwrap_or_default();

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let hash = hex::encode(hasher.finalize());

    Self { kind, params, hash }
  }

  pub fn list(kind: ResourceKind, params: QueryParams) -> Self {
    Self::new(kind, params)
  }

  pub fn record(kind: ResourceKind, id: RecordId) -> Self {
    Self::new(kind, QueryParams::record(id))
  }

  pub fn revenue() -> Self {
    Self::new(ResourceKind::RevenueSummary, QueryParams::default())
  }

  pub fn kind(&self) -> ResourceKind {
    self.kind
  }

  pub fn params(&self) -> &QueryParams {
    &self.params
  }
}

impl PartialEq for AdminQueryKey {
  fn eq(&self, other: &Self) -> bool {
    self.hash == other.hash
  }
}

impl Eq for AdminQueryKey {}

impl QueryKey for AdminQueryKey {
  fn cache_hash(&self) -> &str {
    &self.hash
  }

  fn description(&self) -> String {
    let p = &self.params;
    match (&p.id, &p.filter) {
      (Some(id), _) => format!("{} {}", self.kind, id),
      (None, Some(filter)) => format!(
        "{} page {} (limit {}) matching '{}'",
        self.kind, p.page, p.limit, filter
      ),
      (None, None) => format!("{} page {} (limit {})", self.kind, p.page, p.limit),
    }
  }
}
