//! CLI command handlers.
//!
//! This module provides testable command handlers that are invoked by main.rs.
//! Each handler implements the business logic for a specific CLI subcommand
//! and returns the process exit code.

mod analyze;
mod check;
mod compare;
mod state;

pub use analyze::run_analyze;
pub use check::run_check;
pub use compare::{build_engine, compare_on_pool, output_comparison, run_compare};
pub use state::{run_state_clear, run_state_show};

// Re-export config types used by handlers
pub use crate::config::{AnalyzeConfig, CheckConfig, CompareRunConfig};

use crate::config::{AppConfig, Validatable};
use anyhow::Result;

/// Reject invalid configuration before doing any work.
pub(crate) fn ensure_valid(config: &AppConfig) -> Result<()> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }
    let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
    anyhow::bail!("invalid configuration:\n  {}", details.join("\n  "))
}
