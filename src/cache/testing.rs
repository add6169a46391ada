//! Test helpers: a simple key type and fetchers whose results the test controls.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use super::traits::{fetcher, Fetcher, QueryKey};
use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TestKey {
  pub group: &'static str,
  pub id: u32,
  hash: String,
}

impl TestKey {
  pub fn new(group: &'static str, id: u32) -> Self {
    Self {
      group,
      id,
      hash: format!("{}:{}", group, id),
    }
  }
}

impl QueryKey for TestKey {
  fn cache_hash(&self) -> &str {
    &self.hash
  }

  fn description(&self) -> String {
    format!("{} #{}", self.group, self.id)
  }
}

/// Fetcher that always succeeds with `value`.
pub(crate) fn ready(value: &str) -> Fetcher<String> {
  let value = value.to_string();
  fetcher(move || {
    let value = value.clone();
    async move { Ok(value) }
  })
}

/// Fetcher whose n-th call yields the n-th scripted result.
pub(crate) struct Script<T> {
  senders: Vec<Option<oneshot::Sender<Result<T, FetchError>>>>,
  calls: Arc<AtomicUsize>,
  fetcher: Fetcher<T>,
}

impl<T: Send + 'static> Script<T> {
  /// `steps` pending calls, each settled later through [`Script::resolve`].
  pub fn new(steps: usize) -> Self {
    let (senders, receivers): (Vec<_>, VecDeque<_>) = (0..steps)
      .map(|_| {
        let (tx, rx) = oneshot::channel();
        (Some(tx), rx)
      })
      .unzip();

    let receivers = Arc::new(Mutex::new(receivers));
    let calls = Arc::new(AtomicUsize::new(0));

    let fetcher = {
      let calls = Arc::clone(&calls);
      fetcher(move || {
        calls.fetch_add(1, Ordering::SeqCst);
        let next = receivers.lock().unwrap().pop_front();
        async move {
          match next {
            Some(rx) => rx.await.unwrap_or(Err(FetchError::Cancelled)),
            None => Err(FetchError::Cancelled),
          }
        }
      })
    };

    Self {
      senders,
      calls,
      fetcher,
    }
  }

  /// Calls that settle immediately with the given results, in order.
  pub fn ready(results: Vec<Result<T, FetchError>>) -> Self {
    let mut script = Self::new(results.len());
    for (step, result) in results.into_iter().enumerate() {
      script.resolve(step, result);
    }
    script
  }

  pub fn fetcher(&self) -> Fetcher<T> {
    Arc::clone(&self.fetcher)
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn resolve(&mut self, step: usize, result: Result<T, FetchError>) {
    if let Some(tx) = self.senders[step].take() {
      let _ = tx.send(result);
    }
  }
}
