//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings. Every
//! section is optional; a missing file or section means defaults.
//!
//! # Example
//!
//! ```no_run
//! use clusterforge::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("clusterforge.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::cluster::{is_size, ClusterConfig, VmConfig};
use super::logging::LoggingConfig;
use crate::domain::NodeSet;
use crate::error::{ConfigError, Result};

/// How commands are run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Shell invoked as `<shell> -c <command>`.
    pub shell: String,
    /// Upper bound for a single command. VM launch and snap install are slow.
    pub timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            shell: "/bin/sh".into(),
            timeout_secs: 900,
        }
    }
}

impl ExecutorConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where the state file lives.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Defaults to `~/.clusterforge/state.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging and tracing configuration.
    pub logging: LoggingConfig,

    /// Node count and naming.
    pub cluster: ClusterConfig,

    /// VM shape passed to `multipass launch`.
    pub vm: VmConfig,

    /// Command execution.
    pub executor: ExecutorConfig,

    /// State file location.
    pub state: StateConfig,
}

impl Config {
    /// Parse and validate configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::InvalidValue`] when a value fails validation.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadFile`] when the file cannot be read, plus
    /// everything [`Config::parse_toml`] returns.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load configuration, falling back to defaults when the file does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`] for a file that exists.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check values that serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] or
    /// [`ConfigError::MissingField`] for the first offending value.
    pub fn validate(&self) -> Result<()> {
        if self.cluster.nodes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cluster.nodes",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        NodeSet::new(1, &self.cluster.node_prefix).map_err(|e| ConfigError::InvalidValue {
            field: "cluster.node_prefix",
            reason: e.to_string(),
        })?;

        for (field, value) in [("vm.memory", &self.vm.memory), ("vm.disk", &self.vm.disk)] {
            if !is_size(value) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("'{value}' is not a size such as 8G"),
                }
                .into());
            }
        }
        if self.vm.image.trim().is_empty() || self.vm.image.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                field: "vm.image",
                reason: "must be a single image name".to_string(),
            }
            .into());
        }

        if self.executor.shell.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "executor.shell",
            }
            .into());
        }
        if self.executor.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "executor.timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: "must be 'pretty' or 'json'".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Initialize logging from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Configured state path, or the default under the home directory.
    #[must_use]
    pub fn state_path(&self, default: impl FnOnce() -> PathBuf) -> PathBuf {
        self.state.path.clone().unwrap_or_else(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.cluster.nodes, 3);
        assert_eq!(config.cluster.node_prefix, "microk8s-node");
        assert_eq!(config.vm.memory, "8G");
        assert_eq!(config.executor.shell, "/bin/sh");
        assert!(config.state.path.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse_toml(
            r#"
            [cluster]
            nodes = 2
            node_prefix = "lab-"

            [vm]
            memory = "4G"

            [executor]
            timeout_secs = 30

            [state]
            path = "/tmp/state.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.cluster.nodes, 2);
        assert_eq!(config.cluster.node_prefix, "lab-");
        assert_eq!(config.vm.memory, "4G");
        assert_eq!(config.vm.disk, "20G");
        assert_eq!(config.executor.timeout(), Duration::from_secs(30));
        assert_eq!(
            config.state_path(|| PathBuf::from("unused")),
            PathBuf::from("/tmp/state.json")
        );
    }

    #[test]
    fn rejects_bad_prefix() {
        let err = Config::parse_toml("[cluster]\nnode_prefix = \"bad prefix\"").unwrap_err();
        assert!(err.to_string().contains("cluster.node_prefix"));
    }

    #[test]
    fn rejects_bad_sizes() {
        let err = Config::parse_toml("[vm]\ndisk = \"lots\"").unwrap_err();
        assert!(err.to_string().contains("vm.disk"));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(Config::parse_toml("[executor]\ntimeout_secs = 0").is_err());
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Config::parse_toml("[logging]\nformat = \"xml\"").is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(Config::parse_toml("[cluster\nnodes = 2").is_err());
    }
}
