use std::path::PathBuf;

use clap::Parser;
use dotenvy::dotenv;
use mural_node::config;
use mural_node::NodeSettings;
use tokio::signal;

#[derive(Parser)]
#[command(name = "mural-node", version, about = "One node of the distributed mural")]
struct Cli {
    /// Node identifier shown to clients (e.g. Node1)
    #[arg(long)]
    id: String,
    /// TCP request port; HTTP is served on this port + 1000
    #[arg(long)]
    port: u16,
    /// Peer TCP ports; defaults to the other members of the configured cluster
    #[arg(long, value_delimiter = ',')]
    peers: Option<Vec<u16>>,
    /// Persist the message wall in this SQLite file
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let node_config = config::load_config(&cli.config);
    let peer_ports = cli
        .peers
        .clone()
        .unwrap_or_else(|| node_config.peers_of(cli.port));

    let settings = NodeSettings {
        id: cli.id.clone(),
        peers: node_config.peer_addrs(&peer_ports),
        users: node_config.users.clone(),
        db_path: cli.db.clone(),
        peer_timeout: node_config.peer_timeout(),
    };

    log::info!("Starting {} on port {} (peers: {:?})", cli.id, cli.port, peer_ports);
    let handle = mural_node::launch(&node_config.host, cli.port, settings).await?;

    if let Err(err) = signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {err}");
    }
    log::info!(
        "Received shutdown signal, stopping {} ({} messages on the wall)",
        cli.id,
        handle.node().message_count()
    );
    handle.shutdown().await;

    Ok(())
}
