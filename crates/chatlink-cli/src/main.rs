//! chatlink CLI entry point

use clap::Parser;
use tracing::{error, info};

use chatlink_cli::{
    app::ChatlinkApp,
    cli::Cli,
    commands::CommandDispatcher,
    config::AppConfig,
    error::{CliError, Result},
};
use chatlink_runtime::Notice;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Load configuration
    let mut config = load_configuration(&cli)?;

    // Initialize logging
    setup_logging(cli.verbose || config.cli.verbose);

    // Override state directory if specified
    if let Some(data_dir) = &cli.data_dir {
        config.state.state_dir = Some(data_dir.into());
    }

    let app = ChatlinkApp::new(config)?;

    // Execute the command
    if let Err(e) = CommandDispatcher::execute(cli, app).await {
        match &e {
            CliError::Chatlink(inner) => eprintln!("{}", Notice::from_error(inner)),
            other => eprintln!("{}", other),
        }
        error!("Command execution failed: {}", e);
        std::process::exit(1);
    }

    info!("chatlink CLI exited successfully");
    Ok(())
}

/// Setup logging based on verbosity level
fn setup_logging(verbose: bool) {
    let log_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults
fn load_configuration(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(config_path) => Ok(AppConfig::load_from_file(config_path)?),
        None => Ok(AppConfig::default()),
    }
}
