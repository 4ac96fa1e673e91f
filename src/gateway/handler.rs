use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use tracing::{info, warn};

use crate::db::entity::{hands, seats};
use crate::engine::nl::actions::PlayerAction;
use crate::engine::nl::types::SeatId;
use crate::game::coordinator::GameCoordinator;
use crate::ledger::query::{HandMessagesQuery, SequenceBounds};
use crate::ledger::types::HandId;
use crate::server::routes::ServerContext;

use super::chat::ChatError;
use super::connection::ConnectionPhase;
use super::error::ErrorCode;
use super::presence::PresenceStatus;
use super::protocol::{
    ChannelKey, ChannelKind, ClientMessage, ConnectionId, FabricEnvelope, ResumeCursor,
    ServerMessage, TableId,
};
use super::rate_limit::ActionKind;
use super::GatewayState;

const LOG_TARGET: &str = "gateway::handler";

#[derive(Debug, Deserialize)]
pub struct AuthQuery {
    pub token: String,
}

/// Upgrades a connection into the full gateway protocol: authenticate,
/// multiplex `{table, chat, lobby}` channels, and stream ordered events from
/// the coordinator and from other gateway instances via the fabric.
pub async fn gateway_ws(
    State(ctx): State<Arc<ServerContext>>,
    Query(auth): Query<AuthQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, ctx, auth.token))
}

async fn handle_connection(mut socket: WebSocket, ctx: Arc<ServerContext>, token: String) {
    let gateway = Arc::clone(&ctx.gateway);

    let claims = match gateway.auth.verify(&token) {
        Ok(claims) => claims,
        Err(_) => {
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: 4001,
                    reason: "auth_denied".into(),
                })))
                .await;
            return;
        }
    };
    let user_id = claims.user_id;
    let connection_id = ConnectionId::new_v4();
    let (mut outbound, backpressured) =
        gateway
            .connections
            .register(connection_id, user_id, gateway.instance_id.clone());
    gateway
        .connections
        .set_phase(connection_id, ConnectionPhase::Authenticated);

    if gateway.presence.connect(user_id) == Some(PresenceStatus::Online) {
        publish_presence(&gateway, user_id, PresenceStatus::Online).await;
    }

    let welcome = ServerMessage::Welcome {
        session_id: connection_id,
        server_time: chrono::Utc::now(),
    };
    if gateway.connections.try_send(connection_id, welcome).is_err() {
        cleanup_connection(&gateway, connection_id, user_id).await;
        return;
    }

    info!(target: LOG_TARGET, %connection_id, user_id, "gateway connection authenticated");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        gateway.presence.touch(user_id);
                        handle_client_message(&gateway, &ctx.coordinator, connection_id, user_id, &text).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        warn!(target: LOG_TARGET, %connection_id, %err, "websocket read error");
                        break;
                    }
                }
            }
            outgoing = outbound.recv() => {
                match outgoing {
                    Some(message) => {
                        let payload = match serde_json::to_string(&message) {
                            Ok(payload) => payload,
                            Err(err) => {
                                warn!(target: LOG_TARGET, %connection_id, %err, "failed to encode outbound message");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        if backpressured.load(Ordering::SeqCst) {
                            let _ = socket.send(Message::Close(Some(CloseFrame {
                                code: 4002,
                                reason: "backpressure".into(),
                            }))).await;
                        }
                        break;
                    }
                }
            }
        }
    }

    cleanup_connection(&gateway, connection_id, user_id).await;
    info!(target: LOG_TARGET, %connection_id, user_id, "gateway connection closed");
}

async fn handle_client_message(
    gateway: &GatewayState,
    coordinator: &Arc<GameCoordinator>,
    connection_id: ConnectionId,
    user_id: i64,
    text: &str,
) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => {
            send_error(
                gateway,
                connection_id,
                ErrorCode::Forbidden,
                format!("malformed message: {err}"),
                None,
            );
            return;
        }
    };

    match message {
        ClientMessage::Ping => {
            gateway.connections.touch_pong(connection_id);
            let _ = gateway.connections.try_send(connection_id, ServerMessage::Pong);
        }
        ClientMessage::Subscribe { channel, scope_id } => {
            handle_subscribe(gateway, coordinator, connection_id, user_id, channel, scope_id).await;
        }
        ClientMessage::Unsubscribe { channel, scope_id } => {
            gateway
                .subscriptions
                .unsubscribe(connection_id, &ChannelKey::new(channel, scope_id));
        }
        ClientMessage::ChatSend { table_id, text } => {
            handle_chat_send(gateway, connection_id, user_id, table_id, text).await;
        }
        ClientMessage::Action {
            table_id,
            hand_id,
            action,
        } => {
            handle_action(gateway, coordinator, connection_id, user_id, table_id, hand_id, action)
                .await;
        }
        ClientMessage::Resume { cursors } => {
            handle_resume(gateway, coordinator, connection_id, cursors).await;
        }
    }
}

/// Table and chat channels are open to any authenticated connection in this
/// private-instance deployment (no public discovery; see the scope's
/// non-goals) — spectator rights are the default, not an exception. Seat
/// membership is still enforced where it has teeth: submitting an action
/// requires an actual seat lookup, below.
fn authorize_subscribe(_channel: ChannelKind) -> bool {
    true
}

async fn handle_subscribe(
    gateway: &GatewayState,
    coordinator: &Arc<GameCoordinator>,
    connection_id: ConnectionId,
    user_id: i64,
    channel: ChannelKind,
    scope_id: i64,
) {
    if let Err(wait_ms) = gateway
        .rate_limiter
        .try_acquire(user_id, channel, ActionKind::Subscribe)
    {
        send_error(
            gateway,
            connection_id,
            ErrorCode::RateLimited,
            "subscribe rate limit exceeded".to_string(),
            Some(wait_ms),
        );
        return;
    }

    if !authorize_subscribe(channel) {
        send_error(
            gateway,
            connection_id,
            ErrorCode::Forbidden,
            "not authorized for this channel".to_string(),
            None,
        );
        return;
    }

    let key = ChannelKey::new(channel, scope_id);
    gateway.subscriptions.subscribe(connection_id, key);
    gateway
        .connections
        .set_phase(connection_id, ConnectionPhase::Subscribed);

    match channel {
        ChannelKind::Table => {
            if let Some(state) = coordinator.snapshot(scope_id) {
                let version = latest_sequence(coordinator, scope_id).await;
                let board = coordinator.board(scope_id);
                let seat = seat_for_user_in_hand(&coordinator.connection(), scope_id, user_id).await;
                let hole_cards = seat.and_then(|s| coordinator.hole_cards(scope_id, s));
                let _ = gateway.connections.try_send(
                    connection_id,
                    ServerMessage::Snapshot {
                        table_id: scope_id,
                        version,
                        state,
                        board,
                        hole_cards,
                    },
                );
            }
        }
        ChannelKind::Chat => {
            if let Ok(history) = gateway.chat.recent(scope_id).await {
                for message in history {
                    if gateway.connections.try_send(connection_id, message).is_err() {
                        break;
                    }
                }
            }
        }
        ChannelKind::Lobby => {}
    }
}

async fn latest_sequence(coordinator: &GameCoordinator, hand_id: HandId) -> i64 {
    let query = HandMessagesQuery::new(coordinator.event_store());
    let bounds = SequenceBounds { from: 0, to: None };
    match query.execute(hand_id, bounds).await {
        Ok(messages) => messages.last().map(|message| message.sequence).unwrap_or(0),
        Err(_) => 0,
    }
}

async fn handle_chat_send(
    gateway: &GatewayState,
    connection_id: ConnectionId,
    user_id: i64,
    table_id: TableId,
    text: String,
) {
    if let Err(wait_ms) =
        gateway
            .rate_limiter
            .try_acquire(user_id, ChannelKind::Chat, ActionKind::Chat)
    {
        send_error(
            gateway,
            connection_id,
            ErrorCode::RateLimited,
            "chat rate limit exceeded".to_string(),
            Some(wait_ms),
        );
        return;
    }

    let channel = ChannelKey::new(ChannelKind::Chat, table_id);
    let seq = gateway.fabric.next_seq(&channel);
    match gateway.chat.send(table_id, user_id, text, seq).await {
        Ok(message) => publish_and_deliver(gateway, channel, message, seq).await,
        Err(ChatError::Muted) => send_error(
            gateway,
            connection_id,
            ErrorCode::Forbidden,
            "you are muted at this table".to_string(),
            None,
        ),
        Err(ChatError::Database) => send_error(
            gateway,
            connection_id,
            ErrorCode::Forbidden,
            "chat message could not be stored".to_string(),
            None,
        ),
    }
}

async fn handle_action(
    gateway: &GatewayState,
    coordinator: &Arc<GameCoordinator>,
    connection_id: ConnectionId,
    user_id: i64,
    table_id: TableId,
    hand_id: HandId,
    action: PlayerAction,
) {
    if let Err(wait_ms) =
        gateway
            .rate_limiter
            .try_acquire(user_id, ChannelKind::Table, ActionKind::HandAction)
    {
        send_error(
            gateway,
            connection_id,
            ErrorCode::RateLimited,
            "action rate limit exceeded".to_string(),
            Some(wait_ms),
        );
        return;
    }

    let Some(seat) = seat_for_user(&coordinator.connection(), table_id, user_id).await else {
        send_error(
            gateway,
            connection_id,
            ErrorCode::Forbidden,
            "no seat at this table".to_string(),
            None,
        );
        return;
    };

    // The coordinator's own broadcast bridge (see `gateway::bridge`) fans
    // the events this produces out to subscribers; nothing further to do on
    // success here.
    if let Err(err) = coordinator.submit_action(hand_id, seat, action).await {
        send_error(
            gateway,
            connection_id,
            ErrorCode::EngineRejected,
            err.to_string(),
            None,
        );
    }
}

async fn seat_for_user(
    connection: &DatabaseConnection,
    table_id: TableId,
    user_id: i64,
) -> Option<SeatId> {
    let row = seats::Entity::find()
        .filter(seats::Column::TableId.eq(table_id))
        .filter(seats::Column::PlayerId.eq(user_id))
        .one(connection)
        .await
        .ok()
        .flatten()?;
    Some(row.seat_no as SeatId)
}

/// Resolves a hand's table first, then looks up the user's seat at that
/// table. The `table` channel's `scope_id` is a `hand_id` (see the gateway's
/// resolved channel-scope convention), so subscribe-time seat lookups must
/// hop through `hands` before they can reuse the `table_id`-keyed query.
async fn seat_for_user_in_hand(
    connection: &DatabaseConnection,
    hand_id: HandId,
    user_id: i64,
) -> Option<SeatId> {
    let hand = hands::Entity::find_by_id(hand_id)
        .one(connection)
        .await
        .ok()
        .flatten()?;
    seat_for_user(connection, hand.table_id, user_id).await
}

async fn handle_resume(
    gateway: &GatewayState,
    coordinator: &Arc<GameCoordinator>,
    connection_id: ConnectionId,
    cursors: Vec<ResumeCursor>,
) {
    for cursor in cursors {
        match cursor.channel {
            ChannelKind::Table => {
                let bounds = SequenceBounds {
                    from: cursor.last_seq as i64 + 1,
                    to: None,
                };
                let query = HandMessagesQuery::new(coordinator.event_store());
                if let Ok(messages) = query.execute(cursor.scope_id, bounds).await {
                    for message in messages {
                        let patch = ServerMessage::TablePatch {
                            table_id: cursor.scope_id,
                            seq: message.sequence as u64,
                            patch: message.event,
                        };
                        if gateway.connections.try_send(connection_id, patch).is_err() {
                            break;
                        }
                    }
                }
            }
            ChannelKind::Chat => {
                if let Ok(history) = gateway.chat.recent(cursor.scope_id).await {
                    for message in history {
                        let after_cursor =
                            matches!(&message, ServerMessage::ChatMessage { seq, .. } if *seq > cursor.last_seq);
                        if after_cursor && gateway.connections.try_send(connection_id, message).is_err() {
                            break;
                        }
                    }
                }
            }
            ChannelKind::Lobby => {}
        }
        gateway
            .subscriptions
            .subscribe(connection_id, ChannelKey::new(cursor.channel, cursor.scope_id));
    }
}

fn send_error(
    gateway: &GatewayState,
    connection_id: ConnectionId,
    code: ErrorCode,
    message: String,
    retry_after_ms: Option<u64>,
) {
    let _ = gateway.connections.try_send(
        connection_id,
        ServerMessage::Error {
            code,
            message,
            retry_after_ms,
        },
    );
}

async fn cleanup_connection(gateway: &GatewayState, connection_id: ConnectionId, user_id: i64) {
    gateway.connections.remove(connection_id);
    gateway.subscriptions.drop_connection(connection_id);
    if let Some(status) = gateway.presence.disconnect(user_id) {
        publish_presence(gateway, user_id, status).await;
    }
}

async fn publish_presence(gateway: &GatewayState, user_id: i64, status: PresenceStatus) {
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

/// Delivers `payload` to this instance's locally connected subscribers of
/// `channel` and publishes it to the fabric, sourced as this instance, so
/// other instances deliver it too. Used for gateway-originated messages
/// (chat, presence); game-originated table patches are bridged separately
/// (see `bridge::run_game_bridge`) and rely on the shared fan-out loop
/// instead, since they aren't sourced from any one gateway instance.
pub(crate) async fn publish_and_deliver(
    gateway: &GatewayState,
    channel: ChannelKey,
    payload: ServerMessage,
    seq: u64,
) {
    deliver_locally(gateway, &channel, &payload);
    let envelope = FabricEnvelope {
        channel,
        payload,
        source_id: gateway.instance_id.clone(),
        seq,
    };
    if let Err(err) = gateway.fabric.publish(envelope).await {
        warn!(target: LOG_TARGET, %err, "failed to publish envelope to fabric");
    }
}

/// Sends `payload` to every connection on this instance subscribed to
/// `channel`. A connection whose outbound queue is already full is closed
/// with `backpressure` and its subscriptions are dropped rather than left
/// to accumulate a growing backlog.
pub(crate) fn deliver_locally(gateway: &GatewayState, channel: &ChannelKey, payload: &ServerMessage) {
    for connection_id in gateway.subscriptions.subscribers(channel) {
        if gateway.connections.try_send(connection_id, payload.clone()).is_err() {
            gateway.connections.mark_backpressured(connection_id);
            gateway.subscriptions.drop_connection(connection_id);
        }
    }
}
