//! Serde-deserializable types matching backend responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::types::{Order, PaginatedResult, Record, RevenueSummary};

// ============================================================================
// List envelopes
// ============================================================================

/// List response of either backend.
///
/// The catalog answers `{ products | carts, total, skip, limit }`, the
/// service `{ products | orders, total, page, limit }`. The array field
/// depends on the resource and stays in `rest` until extracted.
#[derive(Debug, Deserialize)]
pub struct ApiListEnvelope {
  pub total: u64,
  #[serde(default)]
  pub page: Option<u32>,
  #[serde(default)]
  pub limit: Option<u32>,
  #[serde(flatten)]
  pub rest: Map<String, Value>,
}

impl ApiListEnvelope {
  /// Remove and validate the resource array.
  pub fn take_items(&mut self, field: &str) -> Result<Vec<Record>, String> {
    let items = match self.rest.remove(field) {
      Some(Value::Array(items)) => items,
      Some(_) => return Err(format!("field '{}' is not an array", field)),
      None => return Err(format!("missing field '{}'", field)),
    };

    items
      .into_iter()
      .enumerate()
      .map(|(i, item)| {
        Record::from_value(item).ok_or_else(|| format!("item {} of '{}' is not an object", i, field))
      })
      .collect()
  }

  /// Repackage with `page`/`limit` echoed from the request.
  pub fn into_echoed(mut self, field: &str, page: u32, limit: u32) -> Result<PaginatedResult, String> {
    let items = self.take_items(field)?;
    Ok(PaginatedResult {
      items,
      total: self.total,
      page,
      limit,
    })
  }

  /// Repackage trusting the server's `page`/`limit`, falling back to the
  /// request's values when the server leaves them out.
  pub fn into_confirmed(
    mut self,
    field: &str,
    page: u32,
    limit: u32,
  ) -> Result<PaginatedResult, String> {
    let items = self.take_items(field)?;
    Ok(PaginatedResult {
      items,
      total: self.total,
      page: self.page.unwrap_or(page).max(1),
      limit: self.limit.unwrap_or(limit).max(1),
    })
  }
}

// ============================================================================
// Analytics
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiRevenueResponse {
  pub monthly: Vec<f64>,
}

impl TryFrom<ApiRevenueResponse> for RevenueSummary {
  type Error = String;

  fn try_from(resp: ApiRevenueResponse) -> Result<Self, Self::Error> {
    let len = resp.monthly.len();
    let monthly: [f64; 12] = resp
      .monthly
      .try_into()
      .map_err(|_| format!("expected 12 monthly values, got {}", len))?;
    Ok(RevenueSummary { monthly })
  }
}

/// Spread order totals over months for backends without an analytics
/// endpoint. The month is derived from the order id, so this is only a
/// stand-in for real order dates.
pub fn revenue_from_orders(orders: &[Record]) -> RevenueSummary {
  let mut monthly = [0.0; 12];

  for order in orders.iter().filter_map(|r| r.parse::<Order>().ok()) {
    let Some(id) = order.id.as_u64().filter(|id| *id > 0) else {
      continue;
    };
    let month = ((id - 1) % 12) as usize;
    monthly[month] += order.amount();
  }

  RevenueSummary { monthly }
}
