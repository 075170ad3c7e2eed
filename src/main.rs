mod api;
mod commands;
mod config;
mod credential;
mod error;
mod provisioner;
mod session;
mod transcript;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "replica-chat")]
#[command(version)]
#[command(about = "Chat with a hosted conversational replica", long_about = None)]
struct Cli {
    /// Organization secret (overrides the config file and environment)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive chat (default)
    Chat,
    /// Send a single message and print the reply
    Ask { message: String },
    /// Show the effective configuration
    Config,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Log filter used when neither `-v` nor `RUST_LOG` is given.
const DEFAULT_LOG_FILTER: &str = "warn";
const VERBOSE_LOG_FILTER: &str = "replica_chat=debug";

fn init_logging(verbose: bool) {
    let default_filter = if verbose { VERBOSE_LOG_FILTER } else { DEFAULT_LOG_FILTER };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load()?;
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    let credential = config.resolve_credential(cli.api_key.as_deref());

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => commands::chat(&config, credential).await,
        Commands::Ask { message } => commands::ask(&config, credential, &message).await,
        Commands::Config => commands::show_config(&config, credential.as_ref()),
        Commands::Init { force } => commands::init_config(force),
    }
}
