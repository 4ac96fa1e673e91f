use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use tracing::{info, warn};

use crate::ledger::types::HandId;

use super::routes::ServerContext;

const LOG_TARGET: &str = "server::ws";

/// Upgrades a connection and streams every `GameEvent` the coordinator
/// publishes for `hand_id` until the socket closes or the broadcast channel
/// lags past the client's capacity.
pub async fn hand_feed(
    State(ctx): State<Arc<ServerContext>>,
    Path(hand_id): Path<HandId>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| stream_hand_feed(socket, ctx, hand_id))
}

async fn stream_hand_feed(mut socket: WebSocket, ctx: Arc<ServerContext>, hand_id: HandId) {
    let mut receiver = ctx.coordinator.subscribe();
    info!(target: LOG_TARGET, hand_id, "websocket subscriber attached");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {
                        // Clients don't send game actions over this feed; actions go
                        // through the REST endpoint so they get a synchronous result.
                        continue;
                    }
                    Some(Err(err)) => {
                        warn!(target: LOG_TARGET, hand_id, %err, "websocket read error");
                        break;
                    }
                }
            }
            broadcast = receiver.recv() => {
                match broadcast {
                    Ok(msg) if msg.hand_id == hand_id => {
                        let payload = match serde_json::to_string(&msg.event) {
                            Ok(payload) => payload,
                            Err(err) => {
                                warn!(target: LOG_TARGET, hand_id, %err, "failed to encode event");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(target: LOG_TARGET, hand_id, skipped, "subscriber lagged; some events were dropped");
                        continue;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    info!(target: LOG_TARGET, hand_id, "websocket subscriber detached");
}
