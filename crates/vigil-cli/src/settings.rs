//! Layered settings: optional TOML file, then `VIGIL_*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use vigil_core::events::{DEFAULT_PRESSURE_TEST_VALIDITY_MONTHS, EventRules};

/// Runtime settings, deserialised from `vigil.toml` and the environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Registry snapshot to load when `--snapshot` is not given.
  pub snapshot:                      Option<PathBuf>,
  pub pressure_test_validity_months: u32,
  /// Replaces the built-in master catalog when set.
  pub master_catalog:                Option<Vec<String>>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      snapshot:                      None,
      pressure_test_validity_months: DEFAULT_PRESSURE_TEST_VALIDITY_MONTHS,
      master_catalog:                None,
    }
  }
}

impl Settings {
  /// Read `path` (if it exists) and overlay the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("VIGIL").try_parsing(true))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise Settings")
  }

  pub fn event_rules(&self) -> EventRules {
    EventRules {
      pressure_test_validity_months: self.pressure_test_validity_months,
    }
  }
}
