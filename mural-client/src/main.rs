use clap::Parser;
use dotenvy::dotenv;
use mural_client::config;

#[derive(Parser)]
#[command(name = "mural-client", version, about = "Terminal client of the distributed mural")]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let client_config = config::load_config(&cli.config);

    if let Err(err) = mural_client::app::run(client_config).await {
        log::error!("Client terminated: {err}");
        return Err(err.into());
    }
    Ok(())
}
