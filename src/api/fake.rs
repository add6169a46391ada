//! In-memory backend for tests, with call counters and a failure switch.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::config::BackendMode;
use crate::error::{FetchError, FetchResult};

use super::adapter::Adapter;
use super::api_types::revenue_from_orders;
use super::cache::QueryParams;
use super::types::{PaginatedResult, Record, RecordId, ResourceKind, RevenueSummary};

#[derive(Default)]
struct Tables {
  products: Vec<Record>,
  orders: Vec<Record>,
  next_id: u64,
}

impl Tables {
  fn table(&mut self, kind: ResourceKind) -> FetchResult<&mut Vec<Record>> {
    match kind {
      ResourceKind::Products => Ok(&mut self.products),
      ResourceKind::Orders => Ok(&mut self.orders),
      ResourceKind::RevenueSummary => Err(FetchError::Unsupported {
        kind,
        operation: "table",
      }),
    }
  }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
  tables: Mutex<Tables>,
  list_calls: AtomicUsize,
  record_calls: AtomicUsize,
  mutation_calls: AtomicUsize,
  failing: AtomicBool,
}

impl FakeBackend {
  /// `products` products and `orders` orders with ids starting at 1.
  pub fn seeded(products: u64, orders: u64) -> Self {
    let tables = Tables {
      products: (1..=products)
        .map(|id| {
          Record::new()
            .with("id", id)
            .with("title", format!("Product {}", id))
            .with("price", id as f64 * 1.5)
            .with("stock", 10)
            .with("category", if id % 2 == 0 { "lamps" } else { "chairs" })
        })
        .collect(),
      orders: (1..=orders)
        .map(|id| {
          Record::new()
            .with("id", id)
            .with("totalProducts", 1)
            .with("total", 100.0)
            .with("discountedTotal", json!(90.0))
        })
        .collect(),
      next_id: products.max(orders) + 1,
    };

    Self {
      tables: Mutex::new(tables),
      ..Self::default()
    }
  }

  pub fn list_calls(&self) -> usize {
    self.list_calls.load(Ordering::SeqCst)
  }

  pub fn record_calls(&self) -> usize {
    self.record_calls.load(Ordering::SeqCst)
  }

  pub fn mutation_calls(&self) -> usize {
    self.mutation_calls.load(Ordering::SeqCst)
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  fn check(&self, url: &str) -> FetchResult<()> {
    if self.failing.load(Ordering::SeqCst) {
      Err(FetchError::Transport {
        url: format!("fake://{}", url),
        status: Some(503),
        reason: "503 Service Unavailable".to_string(),
      })
    } else {
      Ok(())
    }
  }
}

fn matches(record: &Record, filter: Option<&str>) -> bool {
  let Some(filter) = filter else {
    return true;
  };
  record
    .get("title")
    .and_then(|title| title.as_str())
    .map(|title| title.to_lowercase().contains(&filter.to_lowercase()))
    .unwrap_or(false)
}

fn position(table: &[Record], id: &RecordId) -> Option<usize> {
  table.iter().position(|record| record.id().as_ref() == Some(id))
}

#[async_trait]
impl Adapter for FakeBackend {
  fn mode(&self) -> BackendMode {
    BackendMode::Service
  }

  async fn fetch_list(&self, kind: ResourceKind, params: &QueryParams) -> FetchResult<PaginatedResult> {
    self.list_calls.fetch_add(1, Ordering::SeqCst);
    self.check(kind.as_str())?;

    let mut tables = self.tables.lock().unwrap();
    let matching: Vec<&Record> = tables
      .table(kind)?
      .iter()
      .filter(|record| matches(record, params.filter()))
      .collect();

    Ok(PaginatedResult {
      total: matching.len() as u64,
      items: matching
        .into_iter()
        .skip(params.skip() as usize)
        .take(params.limit() as usize)
        .cloned()
        .collect(),
      page: params.page_number(),
      limit: params.limit(),
    })
  }

  async fn fetch_one(&self, kind: ResourceKind, id: &RecordId) -> FetchResult<Record> {
    self.record_calls.fetch_add(1, Ordering::SeqCst);
    self.check(kind.as_str())?;

    let mut tables = self.tables.lock().unwrap();
    let table = tables.table(kind)?;
    position(table, id)
      .map(|i| table[i].clone())
      .ok_or_else(|| FetchError::NotFound {
        kind,
        id: id.clone(),
      })
  }

  async fn create(&self, kind: ResourceKind, payload: &Record) -> FetchResult<Record> {
    self.mutation_calls.fetch_add(1, Ordering::SeqCst);
    self.check(kind.as_str())?;

    let mut tables = self.tables.lock().unwrap();
    let id = tables.next_id;
    tables.next_id += 1;

    let record = payload.clone().with("id", id);
    tables.table(kind)?.push(record.clone());
    Ok(record)
  }

  async fn update(&self, kind: ResourceKind, id: &RecordId, payload: &Record) -> FetchResult<Record> {
    self.mutation_calls.fetch_add(1, Ordering::SeqCst);
    self.check(kind.as_str())?;

    let mut tables = self.tables.lock().unwrap();
    let table = tables.table(kind)?;
    let i = position(table, id).ok_or_else(|| FetchError::NotFound {
      kind,
      id: id.clone(),
    })?;

    let mut record = table[i].clone();
    for (field, value) in payload.fields() {
      record = record.with(field, value.clone());
    }
    table[i] = record.clone();
    Ok(record)
  }

  async fn remove(&self, kind: ResourceKind, id: &RecordId) -> FetchResult<()> {
    self.mutation_calls.fetch_add(1, Ordering::SeqCst);
    self.check(kind.as_str())?;

    let mut tables = self.tables.lock().unwrap();
    let table = tables.table(kind)?;
    let i = position(table, id).ok_or_else(|| FetchError::NotFound {
      kind,
      id: id.clone(),
    })?;
    table.remove(i);
    Ok(())
  }

  async fn revenue_summary(&self) -> FetchResult<RevenueSummary> {
    self.record_calls.fetch_add(1, Ordering::SeqCst);
    self.check("analytics")?;

    let tables = self.tables.lock().unwrap();
    Ok(revenue_from_orders(&tables.orders))
  }
}
