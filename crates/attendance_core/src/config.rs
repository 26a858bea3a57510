//! Import and logging configuration.
//!
//! # Responsibility
//! - Hold the knobs callers set before running an import.
//! - Keep defaults matching the historical all-or-nothing import behavior.

use crate::logging::default_log_level;
use crate::reader::layout::ColumnLayout;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// What an import does when some rows carry field errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorPolicy {
    /// Any row error fails the import before anything is written.
    #[default]
    AbortBatch,
    /// Rows with errors are reported and left out; the rest are committed.
    SkipRow,
}

impl RowErrorPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AbortBatch => "abort-batch",
            Self::SkipRow => "skip-row",
        }
    }
}

impl Display for RowErrorPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RowErrorPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "abort-batch" | "abortbatch" => Ok(Self::AbortBatch),
            "skip-row" | "skiprow" => Ok(Self::SkipRow),
            other => Err(format!(
                "unsupported row error policy `{other}`; expected abort-batch|skip-row"
            )),
        }
    }
}

/// Settings for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportConfig {
    pub on_row_error: RowErrorPolicy,
    /// Column positions of the export being read.
    pub layout: ColumnLayout,
}

/// Settings for the process log backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error` (case-insensitive).
    pub level: String,
    /// Absolute directory for rolling log files; stderr when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ImportConfig, RowErrorPolicy};
    use crate::reader::layout::ColumnLayout;

    #[test]
    fn default_policy_aborts_the_batch() {
        let config = ImportConfig::default();
        assert_eq!(config.on_row_error, RowErrorPolicy::AbortBatch);
        assert_eq!(config.layout, ColumnLayout::meetup_export());
    }

    #[test]
    fn policy_parses_cli_and_config_spellings() {
        assert_eq!(
            "skip-row".parse::<RowErrorPolicy>().unwrap(),
            RowErrorPolicy::SkipRow
        );
        assert_eq!(
            "abort_batch".parse::<RowErrorPolicy>().unwrap(),
            RowErrorPolicy::AbortBatch
        );
        assert_eq!(
            "SkipRow".parse::<RowErrorPolicy>().unwrap(),
            RowErrorPolicy::SkipRow
        );
        assert!("retry".parse::<RowErrorPolicy>().is_err());
    }

    #[test]
    fn policy_serializes_in_snake_case() {
        let json = serde_json::to_string(&RowErrorPolicy::SkipRow).unwrap();
        assert_eq!(json, "\"skip_row\"");

        let decoded: RowErrorPolicy = serde_json::from_str("\"abort_batch\"").unwrap();
        assert_eq!(decoded, RowErrorPolicy::AbortBatch);
    }
}
