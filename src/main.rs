mod cluster;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;

#[derive(Parser)]
#[command(
    name = "mural",
    version,
    about = "Distributed mural: run the default node cluster or the terminal client"
)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Start every node of the configured cluster in this process
    Cluster {
        /// Path to JSON node config file
        #[arg(long, default_value = mural_node::config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
        config: String,
        /// Persist each node's wall as <DIR>/<node id>.db
        #[arg(long, value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },
    /// Run the terminal client
    Client {
        /// Path to JSON client config file
        #[arg(long, default_value = mural_client::config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    match Cli::parse().mode {
        Mode::Cluster { config, data_dir } => {
            let node_config = mural_node::config::load_config(&config);
            let handles = match cluster::start(&node_config, data_dir.as_deref()).await {
                Ok(handles) => handles,
                Err(err) => {
                    log::error!("Failed to start the cluster: {err}");
                    return Err(err.into());
                }
            };

            if let Err(err) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {err}");
            }
            log::info!("Received shutdown signal, stopping {} nodes", handles.len());
            cluster::stop(handles).await;
        }
        Mode::Client { config } => {
            let client_config = mural_client::config::load_config(&config);
            if let Err(err) = mural_client::app::run(client_config).await {
                log::error!("Client terminated: {err}");
                return Err(err.into());
            }
        }
    }

    Ok(())
}
