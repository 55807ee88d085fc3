//! Configuration loading and representation.
//!
//! | variable                   | values                   | default     |
//! |----------------------------|--------------------------|-------------|
//! | `CARDBOARD_BATCH_MODE`     | `fail_fast`, `atomic`    | `fail_fast` |
//! | `CARDBOARD_AUTO_PROVISION` | `true`, `false`          | `false`     |
//! | `CARDBOARD_LOG_FORMAT`     | `json`, `pretty`         | `json`      |
//! | `CARDBOARD_LOG_FILTER`     | tracing filter directive | `info`      |
//!
//! `RUST_LOG`, when set, still overrides the log filter.

use anyhow::{Context, bail};

use cardboard_inventory::BatchMode;
use cardboard_observability::{LogConfig, LogFormat};

pub const BATCH_MODE_VAR: &str = "CARDBOARD_BATCH_MODE";
pub const AUTO_PROVISION_VAR: &str = "CARDBOARD_AUTO_PROVISION";
pub const LOG_FORMAT_VAR: &str = "CARDBOARD_LOG_FORMAT";
pub const LOG_FILTER_VAR: &str = "CARDBOARD_LOG_FILTER";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    /// Failure semantics of bulk add/remove operations.
    pub batch_mode: BatchMode,
    /// Create an owner's inventory on first access instead of reporting it missing.
    pub auto_provision: bool,
    pub log: LogConfig,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::default();

        if let Some(raw) = lookup(BATCH_MODE_VAR) {
            settings.batch_mode = parse_batch_mode(&raw)
                .with_context(|| format!("invalid {BATCH_MODE_VAR}"))?;
        }
        if let Some(raw) = lookup(AUTO_PROVISION_VAR) {
            settings.auto_provision =
                parse_bool(&raw).with_context(|| format!("invalid {AUTO_PROVISION_VAR}"))?;
        }
        if let Some(raw) = lookup(LOG_FORMAT_VAR) {
            settings.log.format = raw
                .parse::<LogFormat>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("invalid {LOG_FORMAT_VAR}"))?;
        }
        if let Some(raw) = lookup(LOG_FILTER_VAR) {
            if !raw.trim().is_empty() {
                settings.log.filter = raw.trim().to_string();
            }
        }

        Ok(settings)
    }

    pub fn with_batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }

    pub fn with_auto_provision(mut self, enabled: bool) -> Self {
        self.auto_provision = enabled;
        self
    }
}

fn parse_batch_mode(raw: &str) -> anyhow::Result<BatchMode> {
    match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "fail_fast" => Ok(BatchMode::FailFast),
        "atomic" => Ok(BatchMode::Atomic),
        other => bail!("unknown batch mode '{other}' (expected fail_fast or atomic)"),
    }
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("expected a boolean, got '{other}'"),
    }
}
