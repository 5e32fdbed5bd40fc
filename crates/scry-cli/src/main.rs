//! `scry`: command-line front end for the Scry review scheduler.
//!
//! # Usage
//!
//! ```
//! scry card add --owner <UUID> --content '{"front":"hola","back":"hello"}'
//! scry next --learner <UUID>
//! scry answer --learner <UUID> --card <UUID> --outcome good
//! scry postpone --learner <UUID> --card <UUID> --days 3
//! ```
//!
//! Results are printed to stdout as JSON.

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use scry_core::{
  review::{ReviewError, ReviewWorkflow},
  scheduler::Scheduler,
};
use scry_store_sqlite::SqliteStore;
use serde::Serialize;
use settings::AppConfig;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "scry", author, version, about = "Spaced-repetition review scheduler")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "scry.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Manage cards.
  Card {
    #[command(subcommand)]
    action: CardAction,
  },
  /// Show the learner's next due card.
  Next {
    #[arg(long)]
    learner: Uuid,
  },
  /// Record a review answer (again, hard, good or easy).
  Answer {
    #[arg(long)]
    learner: Uuid,
    #[arg(long)]
    card:    Uuid,
    #[arg(long)]
    outcome: String,
  },
  /// Push a card's due date back by whole days.
  Postpone {
    #[arg(long)]
    learner: Uuid,
    #[arg(long)]
    card:    Uuid,
    #[arg(long, allow_negative_numbers = true)]
    days:    i64,
  },
}

#[derive(Subcommand, Debug)]
enum CardAction {
  /// Create a card owned by `--owner` with opaque JSON content.
  Add {
    #[arg(long)]
    owner:   Uuid,
    #[arg(long)]
    content: serde_json::Value,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = AppConfig::load(&cli.config)?;
  let scheduler = Scheduler::new(cfg.params()?).context("invalid scheduler parameters")?;

  let store_path = cfg.store_path();
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  tracing::debug!(path = ?store_path, "store opened");

  let workflow = ReviewWorkflow::new(Arc::new(store.clone()), scheduler);

  match cli.command {
    Command::Card { action: CardAction::Add { owner, content } } => {
      let card = store
        .create_card(owner, content)
        .await
        .context("failed to create card")?;
      print_json(&card)
    }
    Command::Next { learner } => match workflow.get_next_card(learner).await {
      Ok(card) => print_json(&card),
      Err(ReviewError::NoCardsDue) => {
        println!("no cards due");
        Ok(())
      }
      Err(e) => Err(e.into()),
    },
    Command::Answer { learner, card, outcome } => {
      let stats = workflow.submit_answer(learner, card, &outcome).await?;
      print_json(&stats)
    }
    Command::Postpone { learner, card, days } => {
      let stats = workflow.postpone_card(learner, card, days).await?;
      print_json(&stats)
    }
  }
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
