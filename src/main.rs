//! Chatmate - AI chat assistant CLI
//!
#![doc = "Main entry point for the Chatmate application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatmate::cli::{Cli, Commands};
use chatmate::commands;
use chatmate::config::Config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        commands::report_error(&e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let mut config = Config::load(config_path)?;

    if let Some(db_path) = &cli.storage_path {
        tracing::info!("Using storage DB override: {}", db_path);
        config.storage.path = Some(db_path.into());
    }

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Chat { agent, resume } => {
            tracing::info!("Starting interactive chat with {}", agent);
            if let Some(r) = &resume {
                tracing::debug!("Resuming session: {}", r);
            }
            commands::chat::run_chat(config, agent, resume).await
        }
        Commands::Ask {
            agent,
            image,
            no_stream,
            prompt,
        } => {
            tracing::debug!("Asking {} (image: {})", agent, image.is_some());
            commands::ask::run_ask(config, agent, prompt.join(" "), image, !no_stream).await
        }
        Commands::Sessions { command } => {
            commands::sessions::handle_sessions(config, command).await
        }
        Commands::Agents { command } => commands::agents::handle_agents(config, command).await,
        Commands::Auth { command } => commands::account::handle_auth(config, command).await,
        Commands::Theme { command } => commands::theme::handle_theme(config, command),
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so they never mix with command output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "chatmate=debug" } else { "chatmate=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
