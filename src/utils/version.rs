//! Version identifier validation.

use regex::Regex;
use std::sync::OnceLock;

/// Maximum accepted length of a version identifier.
const MAX_VERSION_ID_LEN: usize = 128;

fn version_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9._+-]+$").expect("valid version id regex"))
}

/// Check that a version identifier is safe to embed in file names.
///
/// Accepts identifiers like `1.20.1`, `23w13a`, `1.21-pre2` or `b1.7.3`.
pub fn validate_version_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("version identifier is empty".to_string());
    }
    if id.len() > MAX_VERSION_ID_LEN {
        return Err(format!(
            "version identifier exceeds {MAX_VERSION_ID_LEN} characters"
        ));
    }
    if id == "." || id == ".." {
        return Err(format!("'{id}' is not a valid version identifier"));
    }
    if !version_id_pattern().is_match(id) {
        return Err(format!(
            "'{id}' contains characters outside [A-Za-z0-9._+-]"
        ));
    }
    Ok(())
}
