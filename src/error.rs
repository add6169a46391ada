//! Typed failures of the data layer.

use thiserror::Error;

use crate::api::types::{RecordId, ResourceKind};

/// Why a fetch or mutation did not produce a value.
///
/// Errors are `Clone` because the query cache keeps the last one in the
/// entry and hands it to every observer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
  /// Network failure or a non-success HTTP status
  #[error("request to {url} failed: {reason}")]
  Transport {
    url: String,
    status: Option<u16>,
    reason: String,
  },

  /// Response body does not have the expected envelope shape
  #[error("unexpected response from {url}: {reason}")]
  Decode { url: String, reason: String },

  /// Single-record operation on an id the backend does not know
  #[error("{kind} {id} not found")]
  NotFound { kind: ResourceKind, id: RecordId },

  /// Payload rejected before it reached the backend
  #[error("invalid payload: {0}")]
  Validation(String),

  #[error("{operation} is not supported for {kind}")]
  Unsupported {
    kind: ResourceKind,
    operation: &'static str,
  },

  /// The observer went away before the result settled
  #[error("query was cancelled")]
  Cancelled,
}

pub type FetchResult<T> = Result<T, FetchError>;

impl FetchError {
  pub fn transport(url: impl Into<String>, reason: impl ToString) -> Self {
    FetchError::Transport {
      url: url.into(),
      status: None,
      reason: reason.to_string(),
    }
  }

  pub fn decode(url: impl Into<String>, reason: impl ToString) -> Self {
    FetchError::Decode {
      url: url.into(),
      reason: reason.to_string(),
    }
  }

  /// HTTP status carried by a transport failure, if the server answered.
  pub fn status(&self) -> Option<u16> {
    match self {
      FetchError::Transport { status, .. } => *status,
      _ => None,
    }
  }

  /// Turn a 404 on a single-record endpoint into `NotFound`.
  pub fn not_found_as(self, kind: ResourceKind, id: &RecordId) -> Self {
    if self.status() == Some(404) {
      FetchError::NotFound {
        kind,
        id: id.clone(),
      }
    } else {
      self
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_display() {
    let error = FetchError::NotFound {
      kind: ResourceKind::Products,
      id: RecordId::from(9),
    };
    assert_eq!(error.to_string(), "products 9 not found");

    let unsupported = FetchError::Unsupported {
      kind: ResourceKind::Orders,
      operation: "search",
    };
    assert_eq!(unsupported.to_string(), "search is not supported for orders");
  }

  #[test]
  fn test_not_found_mapping_only_applies_to_404() {
    let id = RecordId::from(1);
    let missing = FetchError::Transport {
      url: "http://x/products/1".into(),
      status: Some(404),
      reason: "404 Not Found".into(),
    };
    assert!(matches!(
      missing.not_found_as(ResourceKind::Products, &id),
      FetchError::NotFound { .. }
    ));

    let server = FetchError::Transport {
      url: "http://x/products/1".into(),
      status: Some(500),
      reason: "500 Internal Server Error".into(),
    };
    assert_eq!(
      server.clone().not_found_as(ResourceKind::Products, &id),
      server
    );
  }
}
