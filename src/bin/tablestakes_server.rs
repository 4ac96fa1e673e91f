use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use tablestakes::config::AppConfig;
use tablestakes::server::{run_server, ServerConfig};

const LOG_TARGET: &str = "bin::tablestakes_server";

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    let config = AppConfig::parse();
    init_tracing(&config.log_level)?;

    let bind = config
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_addr))?;

    tracing::info!(target: LOG_TARGET, bind_addr = %config.bind_addr, "starting tablestakes server");

    run_server(ServerConfig {
        bind,
        submit_channel_capacity: config.outbound_queue_messages,
        broadcast_channel_capacity: config.outbound_queue_messages * 4,
        app: config,
    })
    .await
}

fn load_dotenv() {
    let manifest_env_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    fmt::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}
