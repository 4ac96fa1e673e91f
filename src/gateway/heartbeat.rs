use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::interval;
use tracing::{info, warn};

use super::handler::publish_and_deliver;
use super::protocol::{ChannelKey, ChannelKind, ServerMessage};
use super::GatewayState;

const LOG_TARGET: &str = "gateway::heartbeat";

/// Periodic reap of connections that have gone quiet past the configured
/// heartbeat timeout, and of users idle long enough to demote to `away`.
/// Ping/Pong here is reap-scan driven rather than server-pushed: a client
/// sends `Ping` on its own cadence and the gateway answers with `Pong`
/// (see `handler::handle_client_message`), so this loop only needs to
/// notice the *absence* of that traffic.
pub async fn run(gateway: Arc<GatewayState>, sweep_interval: Duration) {
    let mut ticker = interval(sweep_interval);
    info!(target: LOG_TARGET, timeout_secs = gateway.heartbeat_timeout.as_secs(), "heartbeat supervisor started");

    loop {
        ticker.tick().await;
        reap_stale_connections(&gateway, Instant::now());
        sweep_idle_presence(&gateway, Instant::now()).await;
    }
}

fn reap_stale_connections(gateway: &GatewayState, now: Instant) {
    let stale = gateway
        .connections
        .stale_connections(now, gateway.heartbeat_timeout);
    for connection_id in stale {
        let user_id = gateway.connections.user_of(connection_id);
        warn!(target: LOG_TARGET, %connection_id, ?user_id, "reaping stale connection");
        gateway.connections.remove(connection_id);
        gateway.subscriptions.drop_connection(connection_id);
    }
}

async fn sweep_idle_presence(gateway: &GatewayState, now: Instant) {
    let changed = gateway.presence.sweep_idle(now);
    for (user_id, status) in changed {
        let channel = ChannelKey::new(ChannelKind::Lobby, 0);
        let seq = gateway.fabric.next_seq(&channel);
        publish_and_deliver(
            gateway,
            channel,
            ServerMessage::Presence { user_id, status },
            seq,
        )
        .await;
    }
}
