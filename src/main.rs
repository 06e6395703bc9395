use clap::Parser;
use clusterforge::adapter::inbound::cli::command::{Cli, Commands, ConfigCommand};
use clusterforge::adapter::inbound::cli::output::{self, OutputConfig};
use clusterforge::adapter::inbound::cli::{config, destroy, outputs, plan, up, Context};
use clusterforge::error::Result;
use tracing::debug;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::set_color(&cli.color);
    output::configure(OutputConfig::new(cli.json, cli.quiet, cli.verbose));

    if let Err(e) = run(cli).await {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Config(ConfigCommand::Init { force }) => {
            return config::execute_init(&cli.config, *force);
        }
        Commands::Config(ConfigCommand::Validate) => {
            return config::execute_validate(&cli.config);
        }
        _ => {}
    }

    let context = Context::load(&cli)?;
    context
        .config
        .logging
        .clone()
        .with_verbosity(cli.verbose)
        .init();
    debug!(config = %cli.config.display(), state = %context.state_path.display(), "loaded configuration");

    match cli.command {
        Commands::Up(args) => up::execute(&context, args.nodes).await,
        Commands::Plan(args) => plan::execute(&context, args.nodes).await,
        Commands::Destroy(args) => destroy::execute(&context, args.yes).await,
        Commands::Outputs(args) => outputs::execute(&context, args.show_secrets).await,
        Commands::Config(ConfigCommand::Show) => config::execute_show(&context),
        Commands::Config(ConfigCommand::Init { .. } | ConfigCommand::Validate) => Ok(()),
    }
}
