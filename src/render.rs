//! Plain-text tables for command output.

use std::fmt::Write;

use crate::api::types::{DashboardMetrics, Order, PaginatedResult, Product, Record};

const MONTHS: [&str; 12] = [
  "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

fn id_text(id: &serde_json::Value) -> String {
  match id {
    serde_json::Value::String(s) => s.clone(),
    other => other.to_string(),
  }
}

fn footer(out: &mut String, page: &PaginatedResult) {
  let _ = writeln!(
    out,
    "Page {} of {} ({} total)",
    page.page,
    page.total_pages(),
    page.total
  );
}

pub fn products(page: &PaginatedResult) -> String {
  let mut out = String::new();
  let _ = writeln!(
    out,
    "{:<8} {:<32} {:<16} {:>10} {:>6}",
    "ID", "TITLE", "CATEGORY", "PRICE", "STOCK"
  );

  let rows: Vec<Product> = page.items.iter().filter_map(|r| r.parse().ok()).collect();
  for p in &rows {
    let _ = writeln!(
      out,
      "{:<8} {:<32} {:<16} {:>10} {:>6}",
      truncate(&id_text(&p.id), 8),
      truncate(&p.title, 32),
      truncate(&p.category, 16),
      format!("${:.2}", p.price),
      p.stock
    );
  }
  if rows.is_empty() {
    let _ = writeln!(out, "No products found");
  }

  footer(&mut out, page);
  out
}

pub fn orders(page: &PaginatedResult) -> String {
  let mut out = String::new();
  let _ = writeln!(
    out,
    "{:<10} {:>8} {:>12} {:>12}",
    "ORDER", "PRODUCTS", "TOTAL", "DISCOUNTED"
  );

  let rows: Vec<Order> = page.items.iter().filter_map(|r| r.parse().ok()).collect();
  for o in &rows {
    let _ = writeln!(
      out,
      "{:<10} {:>8} {:>12} {:>12}",
      truncate(&id_text(&o.id), 10),
      o.total_products,
      format!("${:.2}", o.total.unwrap_or(0.0)),
      format!("${:.2}", o.amount())
    );
  }
  if rows.is_empty() {
    let _ = writeln!(out, "No orders");
  }

  footer(&mut out, page);
  out
}

/// Every field of a record, one per line, in key order.
pub fn record(record: &Record) -> String {
  let mut fields: Vec<_> = record.fields().collect();
  fields.sort_by(|a, b| a.0.cmp(b.0));

  let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
  let mut out = String::new();
  for (name, value) in fields {
    let text = match value {
      serde_json::Value::String(s) => s.clone(),
      other => other.to_string(),
    };
    let _ = writeln!(out, "{:<width$}  {}", name, truncate(&text, 100), width = width);
  }
  out
}

pub fn dashboard(metrics: &DashboardMetrics) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "Total products  {}", metrics.total_products);
  let _ = writeln!(out, "Total orders    {}", metrics.total_orders);
  let _ = writeln!(out, "Revenue         ${:.2}", metrics.revenue.total());
  let _ = writeln!(out);

  let peak = metrics
    .revenue
    .monthly
    .iter()
    .cloned()
    .fold(0.0_f64, f64::max);
  for (month, value) in MONTHS.iter().zip(metrics.revenue.monthly.iter()) {
    let bar = if peak > 0.0 {
      "#".repeat(((value / peak) * 30.0).round().max(0.0) as usize)
    } else {
      String::new()
    };
    let _ = writeln!(out, "{} {:>12} {}", month, format!("${:.2}", value), bar);
  }
  out
}
