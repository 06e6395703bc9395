//! Handler for the `config` command group.

use std::fs;
use std::path::Path;

use serde_json::json;

use crate::adapter::inbound::cli::{output, Context};
use crate::error::{ConfigError, Result};
use crate::infrastructure::config::settings::Config;

/// Default config template with documentation.
const CONFIG_TEMPLATE: &str = include_str!("../../../../clusterforge.toml.example");

/// Execute `config init`.
pub fn execute_init(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(ConfigError::InvalidValue {
            field: "config",
            reason: "file already exists (use --force to overwrite)".to_string(),
        }
        .into());
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, CONFIG_TEMPLATE)?;
    output::section("Config Initialized");
    output::success("Created configuration file");
    output::field("Path", path.display());
    output::section("Next Steps");
    output::note(&format!("1. Edit {} with your VM shape", path.display()));
    output::note(&format!("2. Run: clusterforge plan -c {}", path.display()));
    output::note(&format!("3. Run: clusterforge up -c {}", path.display()));
    Ok(())
}

/// Execute `config show`.
pub fn execute_show(context: &Context) -> Result<()> {
    let config = &context.config;
    if output::is_json() {
        output::json_output(json!({
            "command": "config.show",
            "config": config,
            "statePath": context.state_path.display().to_string(),
        }));
        return Ok(());
    }

    output::section("Effective Configuration");
    output::field("State", context.state_path.display());

    output::section("Cluster");
    output::field("Nodes", config.cluster.nodes);
    output::field("Node prefix", &config.cluster.node_prefix);
    output::field("Master", format!("{}0", config.cluster.node_prefix));

    output::section("VM");
    output::field("Memory", &config.vm.memory);
    output::field("Disk", &config.vm.disk);
    output::field("Image", &config.vm.image);

    output::section("Executor");
    output::field("Shell", &config.executor.shell);
    output::field("Timeout", format!("{}s", config.executor.timeout_secs));

    output::section("Logging");
    output::field("Level", &config.logging.level);
    output::field("Format", &config.logging.format);
    Ok(())
}

/// Execute `config validate`. Unlike the other commands a missing file is
/// an error here.
pub fn execute_validate(path: &Path) -> Result<()> {
    let config = Config::load(path)?;
    if output::is_json() {
        output::json_output(json!({
            "command": "config.validate",
            "path": path.display().to_string(),
            "valid": true,
        }));
        return Ok(());
    }

    output::section("Config Validation");
    output::field("Path", path.display());
    output::success("Config file is valid");
    output::field("Nodes", config.cluster.nodes);
    output::field(
        "Next",
        format!("clusterforge plan -c {}", path.display()),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn template_parses_and_validates() {
        let config = Config::parse_toml(CONFIG_TEMPLATE).unwrap();
        assert_eq!(config.cluster.node_prefix, "microk8s-node");
    }

    #[test]
    fn init_writes_template() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        execute_init(&path, false).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "# mine\n").unwrap();

        assert!(execute_init(&path, false).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "# mine\n");

        execute_init(&path, true).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), CONFIG_TEMPLATE);
    }

    #[test]
    fn validate_requires_the_file() {
        let dir = TempDir::new().unwrap();
        assert!(execute_validate(&dir.path().join("absent.toml")).is_err());
    }
}
