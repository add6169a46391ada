//! Paging and search state for list views.

use tracing::debug;

use crate::api::cache::{AdminQueryKey, QueryParams};
use crate::api::cached_client::{AdminClient, AdminSnapshot, AdminSubscription};
use crate::api::types::{total_pages, ResourceKind};
use crate::cache::QueryKey;

/// Page, page size and filter of one list view, plus the last total seen.
#[derive(Debug, Clone, PartialEq)]
pub struct Pager {
  page: u32,
  limit: u32,
  filter: Option<String>,
  total: Option<u64>,
}

impl Pager {
  pub fn new(limit: u32) -> Self {
    Self {
      page: 1,
      limit: limit.max(1),
      filter: None,
      total: None,
    }
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn filter(&self) -> Option<&str> {
    self.filter.as_deref()
  }

  /// Pages implied by the last known total; 1 until a total is known.
  pub fn total_pages(&self) -> u32 {
    self.total.map_or(1, |total| total_pages(total, self.limit))
  }

  pub fn params(&self) -> QueryParams {
    QueryParams::page(self.page, self.limit).with_filter(self.filter.as_deref())
  }

  /// Go to `page`, clamped to the known page range. Returns whether the
  /// page changed.
  pub fn set_page(&mut self, page: u32) -> bool {
    let page = page.clamp(1, self.total_pages());
    let changed = page != self.page;
    self.page = page;
    changed
  }

  pub fn next_page(&mut self) -> bool {
    self.set_page(self.page.saturating_add(1))
  }

  pub fn prev_page(&mut self) -> bool {
    self.set_page(self.page.saturating_sub(1))
  }

  /// Change the filter; any change goes back to the first page.
  pub fn set_filter(&mut self, filter: Option<&str>) -> bool {
    let filter = filter.map(str::trim).filter(|f| !f.is_empty()).map(String::from);
    if filter == self.filter {
      return false;
    }
    self.filter = filter;
    self.page = 1;
    self.total = None;
    true
  }

  /// Change the page size; any change goes back to the first page.
  pub fn set_limit(&mut self, limit: u32) -> bool {
    let limit = limit.max(1);
    if limit == self.limit {
      return false;
    }
    self.limit = limit;
    self.page = 1;
    true
  }

  /// Record the total reported by the backend and pull the page back
  /// into range if the total shrank. Returns whether the page changed.
  pub fn observe_total(&mut self, total: u64) -> bool {
    self.total = Some(total);
    self.set_page(self.page)
  }
}

/// A list view's live query: follows the pager, keeping the previous
/// page on screen while the next one loads.
pub struct ListController {
  client: AdminClient,
  kind: ResourceKind,
  pager: Pager,
  key: AdminQueryKey,
  previous: Option<AdminQueryKey>,
  subscription: AdminSubscription,
}

impl ListController {
  pub fn new(client: AdminClient, kind: ResourceKind, limit: u32) -> Self {
    let pager = Pager::new(limit);
    let key = AdminQueryKey::list(kind, pager.params());
    let subscription = client.subscribe(&key);

    let controller = Self {
      client,
      kind,
      pager,
      key,
      previous: None,
      subscription,
    };
    controller.client.read(&controller.key);
    controller
  }

  pub fn kind(&self) -> ResourceKind {
    self.kind
  }

  pub fn pager(&self) -> &Pager {
    &self.pager
  }

  /// Current view state; triggers a fetch if the entry went stale.
  pub fn snapshot(&mut self) -> AdminSnapshot {
    let snapshot = self.client.read_keeping(&self.key, self.previous.as_ref());
    if self.observe(&snapshot) {
      return self.client.read_keeping(&self.key, self.previous.as_ref());
    }
    snapshot
  }

  /// Wait until the current key has settled and return its state.
  pub async fn settled(&mut self) -> Option<AdminSnapshot> {
    self.subscription.settled().await?;
    Some(self.snapshot())
  }

  /// Whether the current query changed since the last call.
  pub fn poll(&mut self) -> bool {
    self.subscription.poll()
  }

  /// Fetch the current page again, keeping its data on screen meanwhile.
  pub fn refresh(&mut self) {
    if !self.client.cache().refetch(&self.key) {
      self.client.read(&self.key);
    }
  }

  pub fn next_page(&mut self) -> bool {
    let changed = self.pager.next_page();
    self.follow(changed)
  }

  pub fn prev_page(&mut self) -> bool {
    let changed = self.pager.prev_page();
    self.follow(changed)
  }

  pub fn set_page(&mut self, page: u32) -> bool {
    let changed = self.pager.set_page(page);
    self.follow(changed)
  }

  pub fn set_filter(&mut self, filter: Option<&str>) -> bool {
    let changed = self.pager.set_filter(filter);
    self.follow(changed)
  }

  pub fn set_limit(&mut self, limit: u32) -> bool {
    let changed = self.pager.set_limit(limit);
    self.follow(changed)
  }

  /// Track the backend's total. Returns whether that moved the view to
  /// another page.
  fn observe(&mut self, snapshot: &AdminSnapshot) -> bool {
    if snapshot.is_placeholder {
      return false;
    }
    match snapshot.data().and_then(|d| d.page()) {
      Some(page) => {
        let changed = self.pager.observe_total(page.total);
        self.follow(changed)
      }
      None => false,
    }
  }

  /// Move the subscription to the pager's current key.
  fn follow(&mut self, changed: bool) -> bool {
    if !changed {
      return false;
    }

    let key = AdminQueryKey::list(self.kind, self.pager.params());
    debug!(query = %key.description(), "list parameters changed");

    let subscription = self.client.subscribe(&key);
    let outgoing = std::mem::replace(&mut self.key, key);
    // An outgoing key that never loaded has nothing to show in the meantime
    if self.client.cache().peek(&outgoing).is_some_and(|s| s.data.is_some()) {
      self.previous = Some(outgoing);
    }
    // Old subscription is released only after the new one holds its entry
    drop(std::mem::replace(&mut self.subscription, subscription));
    self.client.read_keeping(&self.key, self.previous.as_ref());
    true
  }
}
