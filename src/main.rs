//! Fairflip API Server Binary
//!
//! Loads configuration, builds the session registry and serves the game API.

use clap::Parser;
use fairflip::{
    api::{init_tracing, ApiServer},
    config::generate_sample_config,
    ConfigLoader, SeedGenerator, SessionRegistry,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fairflip")]
#[command(about = "Provably fair coin flip and dice server", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(long)]
    port: Option<u16>,

    /// Write a sample configuration to this path and exit
    #[arg(long)]
    generate_config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if let Some(path) = args.generate_config {
        generate_sample_config(&path)?;
        println!("📝 Sample configuration written to {}", path);
        return Ok(());
    }

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_path(path);
    }
    let mut config = loader.load()?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    loader.validate(&config)?;

    init_tracing(&config.logging.filter);
    info!(
        "Seed size: {} bytes, session limit: {}",
        config.sessions.seed_bytes, config.sessions.max_active_sessions
    );

    let registry = Arc::new(SessionRegistry::new(
        SeedGenerator::new(config.sessions.seed_bytes),
        config.sessions.max_active_sessions,
    ));

    ApiServer::new(config.server, registry).run().await
}
