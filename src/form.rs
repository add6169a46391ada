//! Product form: the fields an admin can edit, checked before any request.

use crate::api::types::{Product, Record};
use crate::error::{FetchError, FetchResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductForm {
  pub title: String,
  pub description: Option<String>,
  pub price: f64,
  pub stock: i64,
  pub category: String,
}

/// Field overrides for an edit; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
  pub title: Option<String>,
  pub description: Option<String>,
  pub price: Option<f64>,
  pub stock: Option<i64>,
  pub category: Option<String>,
}

impl ProductForm {
  /// Prefill from an existing product.
  pub fn from_product(product: &Product) -> Self {
    Self {
      title: product.title.clone(),
      description: product.description.clone(),
      price: product.price,
      stock: product.stock,
      category: product.category.clone(),
    }
  }

  pub fn apply(mut self, changes: ProductChanges) -> Self {
    if let Some(title) = changes.title {
      self.title = title;
    }
    if let Some(description) = changes.description {
      self.description = Some(description);
    }
    if let Some(price) = changes.price {
      self.price = price;
    }
    if let Some(stock) = changes.stock {
      self.stock = stock;
    }
    if let Some(category) = changes.category {
      self.category = category;
    }
    self
  }

  /// Reject the form with every problem found, not just the first.
  pub fn validate(&self) -> FetchResult<()> {
    let mut problems = Vec::new();

    if self.title.trim().chars().count() < 2 {
      problems.push("title is required (at least 2 characters)");
    }
    if !self.price.is_finite() || self.price < 0.0 {
      problems.push("price must be >= 0");
    }
    if self.stock < 0 {
      problems.push("stock must be >= 0");
    }
    if self.category.trim().chars().count() < 2 {
      problems.push("category is required (at least 2 characters)");
    }

    if problems.is_empty() {
      Ok(())
    } else {
      Err(FetchError::Validation(problems.join("; ")))
    }
  }

  /// Validated payload for create or update.
  pub fn to_record(&self) -> FetchResult<Record> {
    self.validate()?;

    let mut record = Record::new()
      .with("title", self.title.trim())
      .with("price", self.price)
      .with("stock", self.stock)
      .with("category", self.category.trim());
    if let Some(description) = self.description.as_deref() {
      record = record.with("description", description);
    }
    Ok(record)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lamp() -> ProductForm {
    ProductForm {
      title: "Desk lamp".to_string(),
      description: None,
      price: 19.9,
      stock: 3,
      category: "lighting".to_string(),
    }
  }

  #[test]
  fn test_valid_form_builds_payload() {
    let record = lamp().to_record().unwrap();
    assert_eq!(record.get("title").and_then(|v| v.as_str()), Some("Desk lamp"));
    assert_eq!(record.get("stock").and_then(|v| v.as_i64()), Some(3));
    assert!(record.get("description").is_none());
  }

  #[test]
  fn test_invalid_form_lists_all_problems() {
    let form = ProductForm {
      title: " x ".to_string(),
      price: -1.0,
      stock: -2,
      category: String::new(),
      ..lamp()
    };

    let Err(FetchError::Validation(message)) = form.validate() else {
      panic!("expected a validation error");
    };
    assert!(message.contains("title"));
    assert!(message.contains("price"));
    assert!(message.contains("stock"));
    assert!(message.contains("category"));
  }

  #[test]
  fn test_zero_price_and_stock_are_allowed() {
    let form = ProductForm {
      price: 0.0,
      stock: 0,
      ..lamp()
    };
    assert!(form.validate().is_ok());
  }

  #[test]
  fn test_changes_override_prefilled_values() {
    let product: Product = Record::new()
      .with("id", 1)
      .with("title", "Chair")
      .with("price", 40.0)
      .with("stock", 2)
      .with("category", "furniture")
      .parse()
      .unwrap();

    let form = ProductForm::from_product(&product).apply(ProductChanges {
      price: Some(35.0),
      ..ProductChanges::default()
    });
    assert_eq!(form.title, "Chair");
    assert_eq!(form.price, 35.0);
    assert!(form.validate().is_ok());
  }
}
