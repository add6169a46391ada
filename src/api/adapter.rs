//! Backend strategies behind one `Adapter` interface.
//!
//! The two backends disagree on pagination (offset vs page), on where
//! search lives, and on envelope field names. Each strategy plans its
//! requests with a pure function and normalizes the answer into a
//! [`PaginatedResult`], so callers never branch on the backend.

use async_trait::async_trait;
use color_eyre::Result;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::config::{ApiConfig, BackendMode};
use crate::error::{FetchError, FetchResult};

use super::api_types::{revenue_from_orders, ApiListEnvelope, ApiRevenueResponse};
use super::cache::QueryParams;
use super::client::{build_url, HttpClient};
use super::types::{PaginatedResult, Record, RecordId, ResourceKind, RevenueSummary};

/// Orders fetched to approximate revenue on backends without analytics
const REVENUE_SAMPLE_SIZE: u32 = 100;

/// Abstract resource operations, independent of the backend protocol.
///
/// Implementations never cache; every call reaches the backend.
#[async_trait]
pub trait Adapter: Send + Sync {
  fn mode(&self) -> BackendMode;

  async fn fetch_list(&self, kind: ResourceKind, params: &QueryParams) -> FetchResult<PaginatedResult>;

  async fn fetch_one(&self, kind: ResourceKind, id: &RecordId) -> FetchResult<Record>;

  async fn create(&self, kind: ResourceKind, payload: &Record) -> FetchResult<Record>;

  async fn update(&self, kind: ResourceKind, id: &RecordId, payload: &Record) -> FetchResult<Record>;

  async fn remove(&self, kind: ResourceKind, id: &RecordId) -> FetchResult<()>;

  async fn revenue_summary(&self) -> FetchResult<RevenueSummary>;
}

/// Build the adapter selected by configuration.
pub fn connect(api: &ApiConfig) -> Result<Arc<dyn Adapter>> {
  let http = HttpClient::new(api.base_url())?;
  info!(mode = %api.mode, base = %http.base(), "using backend");

  let adapter: Arc<dyn Adapter> = match api.mode {
    BackendMode::Catalog => Arc::new(CatalogAdapter::new(http)),
    BackendMode::Service => Arc::new(ServiceAdapter::new(http)),
  };
  Ok(adapter)
}

/// A planned list call
#[derive(Debug, Clone, PartialEq)]
pub struct ListRequest {
  pub segments: Vec<&'static str>,
  pub query: Vec<(&'static str, String)>,
  /// Envelope field holding the items
  pub field: &'static str,
}

// ============================================================================
// Mode A: external read-mostly catalog
// ============================================================================

/// Catalog backend: offset pagination, a separate search endpoint, and an
/// envelope that does not confirm page or limit.
pub struct CatalogAdapter {
  http: HttpClient,
}

impl CatalogAdapter {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }

  fn collection(kind: ResourceKind, operation: &'static str) -> FetchResult<&'static str> {
    match kind {
      ResourceKind::Products => Ok("products"),
      ResourceKind::Orders => Ok("carts"),
      ResourceKind::RevenueSummary => Err(FetchError::Unsupported { kind, operation }),
    }
  }

  pub fn list_request(kind: ResourceKind, params: &QueryParams) -> FetchResult<ListRequest> {
    let collection = Self::collection(kind, "list")?;
    let mut query = vec![
      ("limit", params.limit().to_string()),
      ("skip", params.skip().to_string()),
    ];

    let segments = match (kind, params.filter()) {
      (_, None) => vec![collection],
      (ResourceKind::Products, Some(filter)) => {
        query.insert(0, ("q", filter.to_string()));
        vec![collection, "search"]
      }
      (_, Some(_)) => {
        return Err(FetchError::Unsupported {
          kind,
          operation: "search",
        })
      }
    };

    Ok(ListRequest {
      segments,
      query,
      field: collection,
    })
  }
}

#[async_trait]
impl Adapter for CatalogAdapter {
  fn mode(&self) -> BackendMode {
    BackendMode::Catalog
  }

  async fn fetch_list(&self, kind: ResourceKind, params: &QueryParams) -> FetchResult<PaginatedResult> {
    let request = Self::list_request(kind, params)?;
    let envelope: ApiListEnvelope = self.http.get(&request.segments, &request.query).await?;

    envelope
      .into_echoed(request.field, params.page_number(), params.limit())
      .map_err(|reason| list_decode_error(&self.http, &request, reason))
  }

  async fn fetch_one(&self, kind: ResourceKind, id: &RecordId) -> FetchResult<Record> {
    let collection = Self::collection(kind, "get")?;
    get_record(&self.http, kind, collection, id).await
  }

  async fn create(&self, kind: ResourceKind, payload: &Record) -> FetchResult<Record> {
    let collection = Self::collection(kind, "create")?;
    let segments = [collection, "add"];
    let value: Value = self.http.post(&segments, payload).await?;
    into_record(&self.http, &segments, value)
  }

  async fn update(&self, kind: ResourceKind, id: &RecordId, payload: &Record) -> FetchResult<Record> {
    let collection = Self::collection(kind, "update")?;
    put_record(&self.http, kind, collection, id, payload).await
  }

  async fn remove(&self, kind: ResourceKind, id: &RecordId) -> FetchResult<()> {
    let collection = Self::collection(kind, "delete")?;
    delete_record(&self.http, kind, collection, id).await
  }

  async fn revenue_summary(&self) -> FetchResult<RevenueSummary> {
    let orders = self
      .fetch_list(
        ResourceKind::Orders,
        &QueryParams::page(1, REVENUE_SAMPLE_SIZE),
      )
      .await?;
    Ok(revenue_from_orders(&orders.items))
  }
}

// ============================================================================
// Mode B: bespoke service
// ============================================================================

/// Service backend: every parameter is a query parameter on one endpoint,
/// and the envelope confirms page and limit.
pub struct ServiceAdapter {
  http: HttpClient,
}

impl ServiceAdapter {
  pub fn new(http: HttpClient) -> Self {
    Self { http }
  }

  fn collection(kind: ResourceKind, operation: &'static str) -> FetchResult<&'static str> {
    match kind {
      ResourceKind::Products => Ok("products"),
      ResourceKind::Orders => Ok("orders"),
      ResourceKind::RevenueSummary => Err(FetchError::Unsupported { kind, operation }),
    }
  }

  pub fn list_request(kind: ResourceKind, params: &QueryParams) -> FetchResult<ListRequest> {
    let collection = Self::collection(kind, "list")?;
    let mut query = vec![
      ("page", params.page_number().to_string()),
      ("limit", params.limit().to_string()),
    ];
    if let Some(filter) = params.filter() {
      query.push(("q", filter.to_string()));
    }

    Ok(ListRequest {
      segments: vec![collection],
      query,
      field: collection,
    })
  }
}

#[async_trait]
impl Adapter for ServiceAdapter {
  fn mode(&self) -> BackendMode {
    BackendMode::Service
  }

  async fn fetch_list(&self, kind: ResourceKind, params: &QueryParams) -> FetchResult<PaginatedResult> {
    let request = Self::list_request(kind, params)?;
    let envelope: ApiListEnvelope = self.http.get(&request.segments, &request.query).await?;

    envelope
      .into_confirmed(request.field, params.page_number(), params.limit())
      .map_err(|reason| list_decode_error(&self.http, &request, reason))
  }

  async fn fetch_one(&self, kind: ResourceKind, id: &RecordId) -> FetchResult<Record> {
    let collection = Self::collection(kind, "get")?;
    get_record(&self.http, kind, collection, id).await
  }

  async fn create(&self, kind: ResourceKind, payload: &Record) -> FetchResult<Record> {
    let collection = Self::collection(kind, "create")?;
    let segments = [collection];
    let value: Value = self.http.post(&segments, payload).await?;
    into_record(&self.http, &segments, value)
  }

  async fn update(&self, kind: ResourceKind, id: &RecordId, payload: &Record) -> FetchResult<Record> {
    let collection = Self::collection(kind, "update")?;
    put_record(&self.http, kind, collection, id, payload).await
  }

  async fn remove(&self, kind: ResourceKind, id: &RecordId) -> FetchResult<()> {
    let collection = Self::collection(kind, "delete")?;
    delete_record(&self.http, kind, collection, id).await
  }

  async fn revenue_summary(&self) -> FetchResult<RevenueSummary> {
    let segments = ["analytics", "revenue-monthly"];
    let resp: ApiRevenueResponse = self.http.get(&segments, &[]).await?;

    RevenueSummary::try_from(resp).map_err(|reason| {
      FetchError::decode(build_url(self.http.base(), &segments, &[]).as_str(), reason)
    })
  }
}

// ============================================================================
// Single-record calls, identical on both backends
// ============================================================================

async fn get_record(
  http: &HttpClient,
  kind: ResourceKind,
  collection: &str,
  id: &RecordId,
) -> FetchResult<Record> {
  let segments = [collection, id.as_str()];
  let value: Value = http
    .get(&segments, &[])
    .await
    .map_err(|e| e.not_found_as(kind, id))?;
  into_record(http, &segments, value)
}

async fn put_record(
  http: &HttpClient,
  kind: ResourceKind,
  collection: &str,
  id: &RecordId,
  payload: &Record,
) -> FetchResult<Record> {
  let segments = [collection, id.as_str()];
  let value: Value = http
    .put(&segments, payload)
    .await
    .map_err(|e| e.not_found_as(kind, id))?;
  into_record(http, &segments, value)
}

async fn delete_record(
  http: &HttpClient,
  kind: ResourceKind,
  collection: &str,
  id: &RecordId,
) -> FetchResult<()> {
  http
    .delete(&[collection, id.as_str()])
    .await
    .map_err(|e| e.not_found_as(kind, id))
}

fn into_record(http: &HttpClient, segments: &[&str], value: Value) -> FetchResult<Record> {
  Record::from_value(value).ok_or_else(|| {
    FetchError::decode(
      build_url(http.base(), segments, &[]).as_str(),
      "record is not a JSON object",
    )
  })
}

fn list_decode_error(http: &HttpClient, request: &ListRequest, reason: String) -> FetchError {
  FetchError::decode(
    build_url(http.base(), &request.segments, &request.query).as_str(),
    reason,
  )
}
