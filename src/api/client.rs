use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{FetchError, FetchResult};

use super::types::Record;

/// Thin HTTP wrapper shared by both backend adapters.
///
/// Maps every non-success outcome to a `FetchError` and never caches.
#[derive(Clone)]
pub struct HttpClient {
  http: reqwest::Client,
  base: Url,
}

impl HttpClient {
  pub fn new(base_url: &str) -> Result<Self> {
    let base =
      Url::parse(base_url).map_err(|e| eyre!("Invalid API base URL '{}': {}", base_url, e))?;
    if base.cannot_be_a_base() {
      return Err(eyre!("Invalid API base URL '{}': not a base URL", base_url));
    }

    let http = reqwest::Client::builder()
      .user_agent(concat!("adminq/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  pub fn base(&self) -> &Url {
    &self.base
  }

  pub async fn get<T: DeserializeOwned>(
    &self,
    segments: &[&str],
    query: &[(&str, String)],
  ) -> FetchResult<T> {
    let url = build_url(&self.base, segments, query);
    let body = self.send(Method::GET, url.clone(), None).await?;
    decode(&url, &body)
  }

  pub async fn post<T: DeserializeOwned>(&self, segments: &[&str], payload: &Record) -> FetchResult<T> {
    let url = build_url(&self.base, segments, &[]);
    let body = self.send(Method::POST, url.clone(), Some(payload)).await?;
    decode(&url, &body)
  }

  pub async fn put<T: DeserializeOwned>(&self, segments: &[&str], payload: &Record) -> FetchResult<T> {
    let url = build_url(&self.base, segments, &[]);
    let body = self.send(Method::PUT, url.clone(), Some(payload)).await?;
    decode(&url, &body)
  }

  /// DELETE, ignoring whatever body comes back.
  pub async fn delete(&self, segments: &[&str]) -> FetchResult<()> {
    let url = build_url(&self.base, segments, &[]);
    self.send(Method::DELETE, url, None).await?;
    Ok(())
  }

  async fn send(&self, method: Method, url: Url, payload: Option<&Record>) -> FetchResult<Vec<u8>> {
    debug!(%method, %url, "request");

    let mut request = self.http.request(method, url.clone());
    if let Some(payload) = payload {
      let body = serde_json::to_vec(payload).map_err(|e| FetchError::Validation(e.to_string()))?;
      request = request
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body);
    }

    let response = request
      .send()
      .await
      .map_err(|e| FetchError::transport(url.as_str(), e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(status_error(&url, status));
    }

    let body = response
      .bytes()
      .await
      .map_err(|e| FetchError::transport(url.as_str(), e))?;

    Ok(body.to_vec())
  }
}

/// Append path segments and query pairs to `base`, keeping any base path.
pub fn build_url(base: &Url, segments: &[&str], query: &[(&str, String)]) -> Url {
  let mut url = base.clone();
  if let Ok(mut path) = url.path_segments_mut() {
    path.pop_if_empty().extend(segments);
  }
  if !query.is_empty() {
    let mut pairs = url.query_pairs_mut();
    for (name, value) in query {
      pairs.append_pair(name, value);
    }
  }
  url
}

fn status_error(url: &Url, status: StatusCode) -> FetchError {
  FetchError::Transport {
    url: url.to_string(),
    status: Some(status.as_u16()),
    reason: status.to_string(),
  }
}

fn decode<T: DeserializeOwned>(url: &Url, body: &[u8]) -> FetchResult<T> {
  serde_json::from_slice(body).map_err(|e| FetchError::decode(url.as_str(), e))
}
