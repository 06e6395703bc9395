//! Path utilities for clusterforge.
//!
//! All data lives under `~/.clusterforge/`:
//! - `~/.clusterforge/config.toml` - configuration
//! - `~/.clusterforge/state.json` - applied operations and outputs

use std::path::PathBuf;

/// Returns the clusterforge home directory (`~/.clusterforge/`).
pub fn home_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clusterforge")
}

/// Returns the default config file path (`~/.clusterforge/config.toml`).
pub fn default_config() -> PathBuf {
    home_dir().join("config.toml")
}

/// Returns the default state file path (`~/.clusterforge/state.json`).
pub fn default_state() -> PathBuf {
    home_dir().join("state.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_under_clusterforge_home() {
        assert!(home_dir().to_string_lossy().contains(".clusterforge"));
        assert!(default_config().ends_with(".clusterforge/config.toml"));
        assert!(default_state().ends_with(".clusterforge/state.json"));
    }
}
