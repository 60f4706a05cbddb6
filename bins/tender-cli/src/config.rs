use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use backend_memory::{MemoryBackendConfig, MemoryUser};
use live_list::MovementFilter;
use tender_api::{InventoryRecord, OverflowPolicy};

use crate::error::CliError;

#[derive(Parser)]
#[command(name = "tender-cli", about = "Live inventory history against an in-process backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a script of entry actions while a live view follows the table
    Replay(ReplayArgs),
    /// Print the stored history, optionally filtered
    History(HistoryArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ReplayArgs {
    /// Path to the TOML config file
    #[arg(long, default_value = "tender.toml", env = "TENDER_CONFIG")]
    pub config: PathBuf,
    /// JSON script of steps to run
    #[arg(long)]
    pub script: PathBuf,
    /// Sign in as this user (default: first configured user)
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long, requires = "email")]
    pub password: Option<String>,
    /// How long to wait for the live view to catch up, in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub wait_ms: u64,
}

#[derive(Args, Clone, Debug)]
pub struct HistoryArgs {
    #[arg(long, default_value = "tender.toml", env = "TENDER_CONFIG")]
    pub config: PathBuf,
    /// Substring of material, issuer or id
    #[arg(long, default_value = "")]
    pub search: String,
    /// in | out | all
    #[arg(long, default_value = "all")]
    pub movement: MovementFilter,
}

// ---- TOML Config ----

#[derive(Debug, Deserialize)]
pub struct TenderConfig {
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default = "default_public_url_base")]
    pub public_url_base: String,
    /// Rows shown by the recent-history view.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Feed subscription buffer of the live view.
    #[serde(default = "default_feed_buffer")]
    pub feed_buffer: usize,
    #[serde(default = "default_feed_overflow")]
    pub feed_overflow: OverflowPolicy,
    /// Deliver every feed change twice.
    #[serde(default)]
    pub duplicate_delivery: bool,
    /// JSON array of rows loaded before anything runs. Relative to the
    /// config file.
    #[serde(default)]
    pub seed: Option<PathBuf>,
    #[serde(default)]
    pub users: Vec<MemoryUser>,
}

fn default_table() -> String {
    "inventory_logs".into()
}
fn default_bucket() -> String {
    "inventory-files".into()
}
fn default_public_url_base() -> String {
    "https://storage.local/object/public".into()
}
fn default_history_limit() -> usize {
    5
}
fn default_feed_buffer() -> usize {
    256
}
fn default_feed_overflow() -> OverflowPolicy {
    OverflowPolicy::BackPressure
}

impl TenderConfig {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::Config {
            context: "read",
            detail: format!("'{}': {e}", path.display()),
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::Config {
            context: "parse",
            detail: format!("'{}': {e}", path.display()),
        })?;
        config.validate()?;
        if let (Some(seed), Some(dir)) = (config.seed.as_mut(), path.parent()) {
            if seed.is_relative() {
                *seed = dir.join(&*seed);
            }
        }
        Ok(config)
    }

    fn validate(&self) -> Result<(), CliError> {
        if self.history_limit == 0 {
            return Err(CliError::Config {
                context: "validate",
                detail: "history_limit must be at least 1".into(),
            });
        }
        if self.feed_buffer == 0 {
            return Err(CliError::Config {
                context: "validate",
                detail: "feed_buffer must be at least 1".into(),
            });
        }
        Ok(())
    }

    pub fn backend_config(&self) -> MemoryBackendConfig {
        MemoryBackendConfig {
            public_url_base: self.public_url_base.clone(),
            duplicate_delivery: self.duplicate_delivery,
            tables: vec![self.table.clone()],
            buckets: vec![self.bucket.clone()],
            ..Default::default()
        }
    }

    pub fn load_seed(&self) -> Result<Vec<InventoryRecord>, CliError> {
        let Some(path) = &self.seed else {
            return Ok(Vec::new());
        };
        let content = std::fs::read_to_string(path).map_err(|e| CliError::Config {
            context: "seed",
            detail: format!("'{}': {e}", path.display()),
        })?;
        serde_json::from_str(&content).map_err(|e| CliError::Config {
            context: "seed",
            detail: format!("'{}': {e}", path.display()),
        })
    }
}
