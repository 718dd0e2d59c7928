use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sluice_chain::{ClientSet, SimulatedChainClient};
use sluice_node::config::NodeConfig;
use sluice_node::{app, harness, logging};
use sluice_types::{Address, TokenAmount};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "sluice")]
#[command(about = "Task-gated reward-issuance engine", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine with the local console harness
    Start {
        /// Data directory for persisted state
        #[arg(short, long)]
        data_dir: Option<PathBuf>,
    },

    /// Write a default configuration file
    Init {
        /// Output directory for the configuration
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;

    match cli.command {
        Commands::Init { output } => init_config(&output),
        Commands::Start { data_dir } => start(cli.config.as_deref(), data_dir).await,
    }
}

fn init_config(output: &std::path::Path) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let path = output.join("sluice.toml");
    NodeConfig::default().save_to_file(&path)?;
    info!(path = %path.display(), "⚙️ Default configuration written");
    Ok(())
}

async fn start(config_path: Option<&std::path::Path>, data_dir: Option<PathBuf>) -> Result<()> {
    let mut config = match config_path {
        Some(path) => NodeConfig::from_file(path)?,
        None => {
            warn!("No configuration file given, using defaults");
            NodeConfig::default()
        }
    };
    if let Some(dir) = data_dir {
        config.node.data_dir = dir;
    }
    if let Ok(dir) = std::env::var("SLUICE_DATA_DIR") {
        config.node.data_dir = PathBuf::from(dir);
    }

    // The console harness stands in for the messaging transport and the
    // chain clients. Deployments embed `app::build_engine` with their own
    // capability implementations instead.
    let clients = simulated_clients(&config).await?;
    app::report_connectivity(&config, &clients).await?;

    let messenger = Arc::new(harness::ConsoleMessenger::new());
    let engine = app::build_engine(&config, clients, messenger)?;

    harness::run(engine).await
}

async fn simulated_clients(config: &NodeConfig) -> Result<ClientSet> {
    let sender = Address::parse(&config.payout.sender_address)
        .map_err(|e| anyhow::anyhow!("Invalid payout.sender_address: {}", e))?;

    let mut clients = ClientSet::new();
    for (id, _) in config.networks()?.iter() {
        let client = Arc::new(SimulatedChainClient::new());
        // Seed the simulated treasury so purchase and balance flows have
        // something to report.
        client
            .fund(&sender, TokenAmount::from_display(100.0).unwrap_or(TokenAmount::ZERO))
            .await;
        clients.insert(id.clone(), client);
    }
    warn!("Using simulated chain clients; payouts are not broadcast anywhere");
    Ok(clients)
}
