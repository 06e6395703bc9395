//! Command-line interface definitions.
//!
//! Defines the CLI structure for clusterforge using `clap`. Every command
//! reads the same configuration file and state file; global flags control
//! output formatting.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::paths;

/// Provision and form a microk8s cluster on local multipass VMs
#[derive(Parser, Debug)]
#[command(name = "clusterforge")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value_os_t = paths::default_config())]
    pub config: PathBuf,

    /// Path to the state file (overrides `[state] path`)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision nodes, install microk8s and form the cluster
    Up(NodesArgs),

    /// Show the operations `up` would declare without running anything
    Plan(NodesArgs),

    /// Undo everything recorded in the state file
    Destroy(DestroyArgs),

    /// Show the outputs of the last `up`
    Outputs(OutputsArgs),

    /// Create, inspect and validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `clusterforge config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a documented configuration file.
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Display the effective configuration with defaults applied.
    Show,
    /// Validate the configuration file.
    Validate,
}

/// Arguments for `up` and `plan`.
#[derive(Parser, Debug)]
pub struct NodesArgs {
    /// Number of nodes; node 0 is the master (defaults to `[cluster] nodes`)
    pub nodes: Option<usize>,
}

/// Arguments for `destroy`.
#[derive(Parser, Debug)]
pub struct DestroyArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for `outputs`.
#[derive(Parser, Debug)]
pub struct OutputsArgs {
    /// Print the cluster credential instead of a placeholder
    #[arg(long)]
    pub show_secrets: bool,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn cli_name() {
        assert_eq!(Cli::command().get_name(), "clusterforge");
    }

    #[test]
    fn parse_up_with_count() {
        let cli = Cli::try_parse_from(["clusterforge", "up", "3"]).unwrap();
        match cli.command {
            Commands::Up(args) => assert_eq!(args.nodes, Some(3)),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_plan_without_count() {
        let cli = Cli::try_parse_from(["clusterforge", "plan"]).unwrap();
        assert!(matches!(cli.command, Commands::Plan(NodesArgs { nodes: None })));
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["clusterforge", "destroy", "--yes", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Destroy(DestroyArgs { yes: true })));
    }

    #[test]
    fn parse_outputs_show_secrets() {
        let cli = Cli::try_parse_from(["clusterforge", "outputs", "--show-secrets"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Outputs(OutputsArgs { show_secrets: true })
        ));
    }

    #[test]
    fn parse_config_validate_with_path() {
        let cli =
            Cli::try_parse_from(["clusterforge", "config", "validate", "--config", "x.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        assert!(matches!(cli.command, Commands::Config(ConfigCommand::Validate)));
    }

    #[test]
    fn parse_config_init_force() {
        let cli = Cli::try_parse_from(["clusterforge", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigCommand::Init { force: true })
        ));
    }

    #[test]
    fn parse_color_never() {
        let cli = Cli::try_parse_from(["clusterforge", "--color", "never", "plan"]).unwrap();
        assert!(matches!(cli.color, ColorChoice::Never));
    }

    #[test]
    fn rejects_non_numeric_count() {
        assert!(Cli::try_parse_from(["clusterforge", "up", "three"]).is_err());
    }
}
