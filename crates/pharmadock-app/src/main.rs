//! PharmaDock: chat-driven molecular docking.
//! Entry point for the `pharmadock` binary.

mod backends;
mod server;
mod terminal;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pharmadock_config::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pharmadock", version, about = "Chat-driven molecular docking")]
struct Cli {
    /// Config file (default: $PHARMADOCK_CONFIG or ./pharmadock.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the web server (default)
    Serve {
        /// Listen address, overrides server.bind and PHARMADOCK_BIND
        #[arg(long)]
        bind: Option<String>,
    },
    /// Chat with a running server from the terminal
    Chat {
        /// Server URL, overrides client.server_url
        #[arg(long)]
        server: Option<String>,
    },
    /// Play the landing banner and load the demo complex
    Demo,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("pharmadock=debug,info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command.unwrap_or(Command::Serve { bind: None }) {
        Command::Serve { bind } => {
            info!("PharmaDock {} starting up...", env!("CARGO_PKG_VERSION"));
            let bind_addr = bind
                .or_else(|| std::env::var("PHARMADOCK_BIND").ok())
                .unwrap_or_else(|| config.server.bind.clone());
            let state = server::build_state(&config).await?;
            pharmadock_web::serve(state, &bind_addr).await
        }
        Command::Chat { server } => {
            let url = server.unwrap_or_else(|| config.client.server_url.clone());
            terminal::run_chat(&config, &url).await
        }
        Command::Demo => terminal::run_demo(&config).await,
    }
}
