mod api;
mod app;
mod cache;
mod commands;
mod config;
mod error;
mod event;
mod form;
mod logging;
mod mutation;
mod pager;
mod query;
mod render;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use color_eyre::Result;
use std::path::PathBuf;

use crate::api::types::ResourceKind;
use crate::form::{ProductChanges, ProductForm};

#[derive(Parser, Debug)]
#[command(name = "adminq")]
#[command(about = "A terminal client for e-commerce admin backends")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/adminq/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List products
  Products {
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    /// Rows per page (default: page_size from config)
    #[arg(short, long)]
    limit: Option<u32>,
    /// Free-text filter
    #[arg(short, long)]
    search: Option<String>,
  },
  /// Show one product
  Product { id: String },
  /// Create a product
  Create {
    #[command(flatten)]
    fields: NewProduct,
  },
  /// Edit a product; fields left out keep their current value
  Update {
    id: String,
    #[command(flatten)]
    fields: ProductEdits,
  },
  /// Delete a product
  Delete { id: String },
  /// List orders
  Orders {
    #[arg(short, long, default_value_t = 1)]
    page: u32,
    #[arg(short, long)]
    limit: Option<u32>,
  },
  /// Totals and monthly revenue
  Dashboard,
  /// Page through a list interactively
  Browse {
    #[arg(value_enum, default_value_t = Listing::Products)]
    kind: Listing,
    #[arg(short, long)]
    limit: Option<u32>,
  },
}

#[derive(ClapArgs, Debug)]
struct NewProduct {
  #[arg(long)]
  title: String,
  #[arg(long)]
  description: Option<String>,
  #[arg(long, default_value_t = 0.0)]
  price: f64,
  #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
  stock: i64,
  #[arg(long)]
  category: String,
}

#[derive(ClapArgs, Debug)]
struct ProductEdits {
  #[arg(long)]
  title: Option<String>,
  #[arg(long)]
  description: Option<String>,
  #[arg(long, allow_negative_numbers = true)]
  price: Option<f64>,
  #[arg(long, allow_negative_numbers = true)]
  stock: Option<i64>,
  #[arg(long)]
  category: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Listing {
  Products,
  Orders,
}

impl From<Listing> for ResourceKind {
  fn from(listing: Listing) -> Self {
    match listing {
      Listing::Products => ResourceKind::Products,
      Listing::Orders => ResourceKind::Orders,
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(&config.log_dir())?;

  let app = app::App::new(config)?;

  match args.command {
    Command::Products {
      page,
      limit,
      search,
    } => app.products(page, limit, search.as_deref()).await,
    Command::Product { id } => app.product(&id).await,
    Command::Create { fields } => {
      app
        .create(ProductForm {
          title: fields.title,
          description: fields.description,
          price: fields.price,
          stock: fields.stock,
          category: fields.category,
        })
        .await
    }
    Command::Update { id, fields } => {
      app
        .update(
          &id,
          ProductChanges {
            title: fields.title,
            description: fields.description,
            price: fields.price,
            stock: fields.stock,
            category: fields.category,
          },
        )
        .await
    }
    Command::Delete { id } => app.delete(&id).await,
    Command::Orders { page, limit } => app.orders(page, limit).await,
    Command::Dashboard => app.dashboard().await,
    Command::Browse { kind, limit } => app.browse(kind.into(), limit).await,
  }
}
