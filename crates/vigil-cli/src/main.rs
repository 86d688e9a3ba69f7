//! `vigil`: compliance deadline reports over a registry snapshot.
//!
//! # Usage
//!
//! ```text
//! vigil --snapshot demos/snapshot.json master
//! vigil --snapshot demos/snapshot.json --today 2024-03-01 events --state CRITICO
//! vigil --config vigil.toml --json summary
//! ```

mod report;
mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vigil_core::{
  Category, ExpirationState,
  events::{self, EventFilter},
  master,
  registry::CategoryRegistry,
};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "vigil", version, about = "Compliance deadline tracker")]
struct Cli {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "vigil.toml")]
  config: PathBuf,

  /// Registry snapshot (JSON). Overrides `snapshot` from the config.
  #[arg(short, long, value_name = "FILE")]
  snapshot: Option<PathBuf>,

  /// Evaluation date (default: today, UTC).
  #[arg(long, value_name = "YYYY-MM-DD")]
  today: Option<NaiveDate>,

  /// Print JSON instead of text.
  #[arg(long)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// State of every deadline field, record by record.
  Status {
    /// Only this category (e.g. `worklift`, `safety_instrument`).
    #[arg(long)]
    category: Option<Category>,
  },
  /// Recompute the master list.
  Master,
  /// Due events in date order.
  Events {
    /// Case-insensitive text in the title or module name.
    #[arg(long)]
    search: Option<String>,
    /// Exact state, e.g. `VENCIDO`, `POR_VENCER`.
    #[arg(long)]
    state: Option<ExpirationState>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    from: Option<NaiveDate>,
    #[arg(long, value_name = "YYYY-MM-DD")]
    until: Option<NaiveDate>,
  },
  /// Dashboard counts over every deadline field.
  Summary,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  // CLI flag wins over the config file.
  let snapshot_path = cli
    .snapshot
    .clone()
    .or_else(|| settings.snapshot.clone())
    .ok_or_else(|| anyhow!("no snapshot given (use --snapshot or set `snapshot` in the config)"))?;
  let registry = load_snapshot(&snapshot_path)?;

  let now = Utc::now();
  let today = cli.today.unwrap_or_else(|| now.date_naive());
  let rules = settings.event_rules();
  tracing::info!(snapshot = %snapshot_path.display(), %today, "loaded registry");

  match cli.command {
    Command::Status { category } => {
      let rows: Vec<_> = events::deadline_statuses(&registry, today, &rules)
        .into_iter()
        .filter(|row| category.is_none_or(|c| row.category == c))
        .collect();
      emit(cli.json, &rows, || report::statuses(&rows))
    }
    Command::Master => {
      let items = match &settings.master_catalog {
        Some(names) => master::seed_from(names.iter().cloned()),
        None => master::seed(),
      };
      let items = master::recompute(&items, &registry, now);
      emit(cli.json, &items, || report::master(&items))
    }
    Command::Events {
      search,
      state,
      from,
      until,
    } => {
      let all = events::collect_events(&registry, today, &rules);
      let filter = EventFilter {
        text: search,
        state,
        from,
        until,
      };
      let selected: Vec<_> = filter.apply(&all).collect();
      emit(cli.json, &selected, || report::events(&selected))
    }
    Command::Summary => {
      let summary = events::dashboard_summary(&registry, today, &rules);
      emit(cli.json, &summary, || report::summary(&summary))
    }
  }
}

fn load_snapshot(path: &std::path::Path) -> Result<CategoryRegistry> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading snapshot {}", path.display()))?;
  CategoryRegistry::from_json(&raw)
    .with_context(|| format!("parsing snapshot {}", path.display()))
}

fn emit<T: Serialize + ?Sized>(
  json: bool,
  value: &T,
  text: impl FnOnce() -> String,
) -> Result<()> {
  if json {
    println!(
      "{}",
      serde_json::to_string_pretty(value).context("serialising output")?
    );
  } else {
    print!("{}", text());
  }
  Ok(())
}
