use crate::api::cache::QueryParams;
use crate::api::cached_client::{AdminClient, AdminSnapshot};
use crate::api::types::{Product, RecordId, ResourceKind};
use crate::cache::{CacheStatus, QueryKey};
use crate::commands::{self, Action, COMMANDS};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::form::{ProductChanges, ProductForm};
use crate::pager::ListController;
use crate::render;
use color_eyre::{eyre::eyre, Result};
use std::time::Duration;
use tracing::info;

/// Main application state
pub struct App {
  client: AdminClient,
  config: Config,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let client = AdminClient::new(&config)?;
    info!(mode = %client.adapter().mode(), "client ready");
    Ok(Self { client, config })
  }

  fn params(&self, page: u32, limit: Option<u32>, search: Option<&str>) -> QueryParams {
    QueryParams::page(page, limit.unwrap_or_else(|| self.config.page_size())).with_filter(search)
  }

  pub async fn products(&self, page: u32, limit: Option<u32>, search: Option<&str>) -> Result<()> {
    let page = self
      .client
      .list(ResourceKind::Products, self.params(page, limit, search))
      .await?;
    print!("{}", render::products(&page));
    Ok(())
  }

  pub async fn orders(&self, page: u32, limit: Option<u32>) -> Result<()> {
    let page = self
      .client
      .list(ResourceKind::Orders, self.params(page, limit, None))
      .await?;
    print!("{}", render::orders(&page));
    Ok(())
  }

  pub async fn product(&self, id: &str) -> Result<()> {
    let record = self
      .client
      .record(ResourceKind::Products, RecordId::new(id))
      .await?;
    print!("{}", render::record(&record));
    Ok(())
  }

  pub async fn create(&self, form: ProductForm) -> Result<()> {
    let payload = form.to_record()?;
    let created = self
      .client
      .mutations()
      .create(ResourceKind::Products, payload)
      .await?;

    let title = created
      .get("title")
      .and_then(|t| t.as_str())
      .unwrap_or_default();
    match created.id() {
      Some(id) => println!("Created product {} '{}'", id, title),
      None => println!("Created product '{}'", title),
    }
    Ok(())
  }

  /// Load the product, apply `changes`, validate the result, and save it.
  pub async fn update(&self, id: &str, changes: ProductChanges) -> Result<()> {
    let id = RecordId::new(id);
    let current: Product = self
      .client
      .record(ResourceKind::Products, id.clone())
      .await?
      .parse()
      .map_err(|e| eyre!("Product {} has an unexpected shape: {}", id, e))?;

    let payload = ProductForm::from_product(&current).apply(changes).to_record()?;
    self
      .client
      .mutations()
      .update(ResourceKind::Products, id.clone(), payload)
      .await?;

    println!("Updated product {}", id);
    Ok(())
  }

  pub async fn delete(&self, id: &str) -> Result<()> {
    let id = RecordId::new(id);
    self
      .client
      .mutations()
      .delete(ResourceKind::Products, id.clone())
      .await?;
    println!("Deleted product {}", id);
    Ok(())
  }

  pub async fn dashboard(&self) -> Result<()> {
    let metrics = self.client.dashboard().await?;
    print!("{}", render::dashboard(&metrics));
    Ok(())
  }

  /// Interactive list browser: one command per line, page redrawn whenever
  /// its query settles.
  pub async fn browse(&self, kind: ResourceKind, limit: Option<u32>) -> Result<()> {
    if kind == ResourceKind::RevenueSummary {
      return Err(eyre!("{} cannot be browsed", kind));
    }

    let limit = limit.unwrap_or_else(|| self.config.page_size());
    let mut list = ListController::new(self.client.clone(), kind, limit);
    let mut events = EventHandler::new(Duration::from_millis(250));
    info!(%kind, limit, "browsing");

    println!("Browsing {} (type 'help' for commands)", kind);
    if let Some(snapshot) = list.settled().await {
      draw(&list, &snapshot);
    }

    while let Some(event) = events.next().await {
      match event {
        Event::Line(line) => match commands::parse(&line) {
          Ok(Action::Quit) => break,
          Ok(Action::Help) => print_help(),
          Ok(action) => {
            if !apply(&mut list, action) {
              println!("(no change)");
            }
            let snapshot = list.snapshot();
            draw(&list, &snapshot);
          }
          Err(message) => println!("{}", message),
        },
        Event::Tick => {
          if list.poll() {
            let snapshot = list.snapshot();
            if !snapshot.is_loading() {
              draw(&list, &snapshot);
            }
          }
          self.client.collect_garbage();
        }
        Event::Eof => break,
      }
    }

    info!(cached = self.client.cache().entry_count(), "browse finished");
    Ok(())
  }
}

fn apply(list: &mut ListController, action: Action) -> bool {
  match action {
    Action::Next => list.next_page(),
    Action::Prev => list.prev_page(),
    Action::Page(page) => list.set_page(page),
    Action::Search(filter) => list.set_filter(filter.as_deref()),
    Action::Limit(limit) => list.set_limit(limit),
    Action::Refresh => {
      list.refresh();
      true
    }
    Action::Help | Action::Quit => false,
  }
}

fn draw(list: &ListController, snapshot: &AdminSnapshot) {
  let pager = list.pager();
  if let Some(filter) = pager.filter() {
    println!("Filter: '{}'", filter);
  }

  match snapshot.status {
    CacheStatus::Loading if snapshot.is_placeholder => {
      println!("Loading page {} (showing previous page)...", pager.page());
    }
    CacheStatus::Loading if snapshot.data.is_none() => {
      println!("Loading...");
      return;
    }
    CacheStatus::Loading => println!("Refreshing..."),
    CacheStatus::Error => {
      if let Some(error) = snapshot.error() {
        println!("Failed to load {}: {}", snapshot.key.description(), error);
      }
    }
    CacheStatus::Empty | CacheStatus::Fresh | CacheStatus::Stale => {}
  }

  if let Some(page) = snapshot.data().and_then(|d| d.page()) {
    let text = match list.kind() {
      ResourceKind::Orders => render::orders(page),
      _ => render::products(page),
    };
    print!("{}", text);
  }
  if let Some(fetched_at) = snapshot.fetched_at {
    let note = if snapshot.is_fresh() || snapshot.is_loading() {
      ""
    } else if snapshot.is_error() {
      " (refresh failed)"
    } else {
      " (stale)"
    };
    println!(
      "Loaded at {}{}",
      fetched_at.with_timezone(&chrono::Local).format("%H:%M:%S"),
      note
    );
  }
}

fn print_help() {
  for cmd in COMMANDS {
    println!("  {:<16} {}", cmd.usage, cmd.description);
  }
}
