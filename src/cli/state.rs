//! State command handlers.
//!
//! Inspect and clear persisted comparison state.

use crate::config::AppConfig;
use crate::diff::ComparisonStateStore;
use crate::pipeline::exit_codes;
use anyhow::Result;

/// Show the stored state for a version pair.
pub fn run_state_show(app: &AppConfig, old_version: &str, new_version: &str) -> Result<i32> {
    let store = ComparisonStateStore::new(app.state.resolved_dir());
    let path = store.state_path(old_version, new_version)?;

    let Some(state) = store.load(old_version, new_version) else {
        println!("No usable state for {old_version} -> {new_version}");
        println!("  expected at {}", path.display());
        return Ok(exit_codes::SUCCESS);
    };

    let now = chrono::Utc::now().timestamp_millis();
    let saved_at = chrono::DateTime::from_timestamp_millis(state.timestamp_millis)
        .map_or_else(|| state.timestamp_millis.to_string(), |t| t.to_rfc3339());
    println!("State for {old_version} -> {new_version}");
    println!("  path:     {}", path.display());
    println!("  saved at: {saved_at}");
    println!("  age:      {}s", state.age(now).as_secs());
    println!(
        "  status:   {}",
        if state.is_stale(app.state.ttl(), now) {
            "stale (next comparison will be full)"
        } else {
            "fresh"
        }
    );
    println!("  files:    {}", state.len());
    Ok(exit_codes::SUCCESS)
}

/// Clear one pair's state, or every state file when no pair is given.
pub fn run_state_clear(app: &AppConfig, pair: Option<(&str, &str)>) -> Result<i32> {
    let store = ComparisonStateStore::new(app.state.resolved_dir());
    match pair {
        Some((old_version, new_version)) => {
            if store.remove(old_version, new_version)? {
                println!("Removed state for {old_version} -> {new_version}");
            } else {
                println!("No state stored for {old_version} -> {new_version}");
            }
        }
        None => {
            let removed = store.clear()?;
            println!(
                "Removed {removed} state file(s) from {}",
                store.dir().display()
            );
        }
    }
    Ok(exit_codes::SUCCESS)
}
