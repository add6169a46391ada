use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// What a query or mutation is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
  Products,
  Orders,
  RevenueSummary,
}

impl ResourceKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Products => "products",
      Self::Orders => "orders",
      Self::RevenueSummary => "revenue-summary",
    }
  }

  /// Kinds whose cached results are derived from this one.
  pub fn dependents(&self) -> &'static [ResourceKind] {
    match self {
      Self::Orders => &[ResourceKind::RevenueSummary],
      _ => &[],
    }
  }
}

impl fmt::Display for ResourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Backend identifier of a single record.
///
/// The catalog backend uses integers, the service may use strings; both
/// are kept as their textual form since they only ever end up in a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  fn from_value(value: &Value) -> Option<Self> {
    match value {
      Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
      Value::Number(n) => Some(Self(n.to_string())),
      _ => None,
    }
  }
}

impl fmt::Display for RecordId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<u64> for RecordId {
  fn from(id: u64) -> Self {
    Self(id.to_string())
  }
}

impl From<&str> for RecordId {
  fn from(id: &str) -> Self {
    Self(id.to_string())
  }
}

/// A single backend record, kept as the JSON object the server sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
  pub fn new() -> Self {
    Self::default()
  }

  /// Wrap a JSON value, rejecting anything that is not an object.
  pub fn from_value(value: Value) -> Option<Self> {
    match value {
      Value::Object(map) => Some(Self(map)),
      _ => None,
    }
  }

  pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
    self.0.insert(field.to_string(), value.into());
    self
  }

  pub fn get(&self, field: &str) -> Option<&Value> {
    self.0.get(field)
  }

  /// The record id, from `id` or Mongo-style `_id`.
  pub fn id(&self) -> Option<RecordId> {
    self
      .0
      .get("id")
      .or_else(|| self.0.get("_id"))
      .and_then(RecordId::from_value)
  }

  pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.0.iter()
  }

  /// Parse the record into one of the typed views below.
  pub fn parse<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
    serde_json::from_value(Value::Object(self.0.clone()))
  }
}

/// Canonical list result, whichever backend produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedResult {
  pub items: Vec<Record>,
  /// Size of the full matching set on the server, not of `items`
  pub total: u64,
  pub page: u32,
  pub limit: u32,
}

impl PaginatedResult {
  /// Number of pages implied by `total`, at least one.
  pub fn total_pages(&self) -> u32 {
    total_pages(self.total, self.limit)
  }
}

pub fn total_pages(total: u64, limit: u32) -> u32 {
  let limit = u64::from(limit.max(1));
  total.div_ceil(limit).clamp(1, u64::from(u32::MAX)) as u32
}

/// Monthly revenue, January first
#[derive(Debug, Clone, PartialEq)]
pub struct RevenueSummary {
  pub monthly: [f64; 12],
}

impl RevenueSummary {
  pub fn total(&self) -> f64 {
    self.monthly.iter().sum()
  }
}

/// Headline numbers for the dashboard view
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardMetrics {
  pub total_products: u64,
  pub total_orders: u64,
  pub revenue: RevenueSummary,
}

// ============================================================================
// Typed views over records
// ============================================================================

/// Product as listed in the admin tables
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
  #[serde(alias = "_id")]
  pub id: Value,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub price: f64,
  #[serde(default)]
  pub stock: i64,
  #[serde(default)]
  pub category: String,
}

/// Order (a cart, on the catalog backend)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  #[serde(alias = "_id")]
  pub id: Value,
  #[serde(default)]
  pub total_products: u64,
  #[serde(default)]
  pub total: Option<f64>,
  #[serde(default)]
  pub discounted_total: Option<f64>,
}

impl Order {
  /// What the customer paid: the discounted total if known, else the total.
  pub fn amount(&self) -> f64 {
    self.discounted_total.or(self.total).unwrap_or(0.0)
  }
}
