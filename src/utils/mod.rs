//! Shared utilities.

mod duration;
mod fs;
mod hash;
mod version;

pub use duration::parse_duration;
pub use fs::{atomic_write_bytes, key_to_path, relative_key, system_time_millis};
pub use hash::{sha256_hex, sha256_reader};
pub use version::validate_version_id;
