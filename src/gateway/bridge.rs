use std::sync::Arc;

use tracing::{info, warn};

use crate::game::coordinator::GameCoordinator;

use super::handler::{deliver_locally, publish_and_deliver};
use super::protocol::{ChannelKey, ChannelKind, ServerMessage};
use super::GatewayState;

const LOG_TARGET: &str = "gateway::bridge";

/// Bridges the coordinator's in-memory broadcast of applied table events into
/// the gateway's channel fabric. One task per instance; every table event is
/// sourced as this instance (`gateway.instance_id`) to the fabric so it fans
/// out uniformly to every other instance's `run_fanout` loop, including this
/// one's — local delivery happens directly below rather than by looping back
/// through the bus, which would add a needless round trip.
pub async fn run_game_bridge(gateway: Arc<GatewayState>, coordinator: Arc<GameCoordinator>) {
    let mut events = coordinator.subscribe();
    info!(target: LOG_TARGET, "game bridge started");

    loop {
        match events.recv().await {
            Ok(broadcast) => {
                let channel = ChannelKey::new(ChannelKind::Table, broadcast.hand_id);
                let seq = gateway.fabric.next_seq(&channel);
                let patch = ServerMessage::TablePatch {
                    table_id: broadcast.hand_id,
                    seq,
                    patch: broadcast.event,
                };
                publish_and_deliver(&gateway, channel, patch, seq).await;
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(target: LOG_TARGET, skipped, "game bridge lagged behind the coordinator broadcast");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                info!(target: LOG_TARGET, "coordinator broadcast closed; game bridge exiting");
                break;
            }
        }
    }
}

/// Drains the shared fabric and delivers every envelope not authored by this
/// instance to this instance's locally subscribed connections. Envelopes this
/// instance itself published were already delivered synchronously by
/// `publish_and_deliver`, so re-delivering them here would duplicate them for
/// local subscribers.
pub async fn run_fanout(gateway: Arc<GatewayState>) {
    let mut envelopes = gateway.fabric.subscribe();
    info!(target: LOG_TARGET, "fan-out loop started");

    loop {
        match envelopes.recv().await {
            Ok(envelope) => {
                if envelope.source_id == gateway.instance_id {
                    continue;
                }
                deliver_locally(&gateway, &envelope.channel, &envelope.payload);
            }
            Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(target: LOG_TARGET, skipped, "fan-out loop lagged behind the fabric bus");
            }
            Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                info!(target: LOG_TARGET, "fabric bus closed; fan-out loop exiting");
                break;
            }
        }
    }
}
