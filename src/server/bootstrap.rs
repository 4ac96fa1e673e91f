use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::AppConfig;
use crate::db;
use crate::game::coordinator::{GameCoordinator, GameCoordinatorConfig};
use crate::gateway::GatewayState;
use crate::tokio_tools::spawn_named_task;

use super::routes::TableStakesServer;

const LOG_TARGET: &str = "server::bootstrap";

pub struct ServerConfig {
    pub bind: SocketAddr,
    pub submit_channel_capacity: usize,
    pub broadcast_channel_capacity: usize,
    pub app: AppConfig,
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    let connection = db::connect(&config.app.database_url)
        .await
        .context("failed to connect to database")?;

    let coordinator_config = GameCoordinatorConfig {
        connection: connection.clone(),
        submit_channel_capacity: config.submit_channel_capacity,
        broadcast_channel_capacity: config.broadcast_channel_capacity,
        turn_timer: config.app.turn_timer(),
    };
    let coordinator = GameCoordinator::spawn(coordinator_config)
        .await
        .context("failed to spawn game coordinator")?;
    let coordinator = Arc::new(coordinator);

    let gateway = Arc::new(GatewayState::new(&config.app, connection));
    spawn_named_task(
        "gateway-heartbeat",
        crate::gateway::heartbeat::run(Arc::clone(&gateway), config.app.heartbeat_interval()),
    );
    spawn_named_task(
        "gateway-fanout",
        crate::gateway::bridge::run_fanout(Arc::clone(&gateway)),
    );
    spawn_named_task(
        "gateway-game-bridge",
        crate::gateway::bridge::run_game_bridge(Arc::clone(&gateway), Arc::clone(&coordinator)),
    );
    spawn_named_task(
        "hand-turn-timer",
        run_turn_timer(Arc::clone(&coordinator)),
    );

    let server = TableStakesServer::new(Arc::clone(&coordinator), gateway);
    let router = server.into_router();

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let local_addr = listener.local_addr()?;
    info!(target: LOG_TARGET, %local_addr, "tablestakes server listening");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited with error")
}

async fn run_turn_timer(coordinator: Arc<GameCoordinator>) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
    loop {
        interval.tick().await;
        coordinator.tick(std::time::Instant::now()).await;
    }
}

async fn shutdown_signal() {
    use tracing::warn;

    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target: LOG_TARGET, %err, "failed to install ctrl-c handler");
    }
    info!(target: LOG_TARGET, "shutdown signal received");
}
