//! Report type definitions.

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output format for comparison reports
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Auto-detect: summary if TTY, full text report otherwise
    #[default]
    Auto,
    /// Brief colored summary
    Summary,
    /// Machine-readable change list (input of `analyze`)
    Json,
    /// Full text report with file contents
    Text,
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Summary => write!(f, "summary"),
            Self::Json => write!(f, "json"),
            Self::Text => write!(f, "text"),
        }
    }
}
