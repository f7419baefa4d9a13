//! Filesystem path resolution for the Cadence data directory.

use std::path::PathBuf;

/// Resolve the data directory.
///
/// Priority: `CADENCE_DATA_DIR` env var, then `~/.cadence`, then `./.cadence`
/// as a last resort.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CADENCE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".cadence");
    }

    PathBuf::from(".cadence")
}
