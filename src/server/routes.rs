use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};

use crate::game::coordinator::GameCoordinator;
use crate::gateway::handler::gateway_ws;
use crate::gateway::GatewayState;
use crate::ledger::query::{HandMessagesQuery, LatestSnapshotQuery, SequenceBounds};
use crate::ledger::types::HandId;

use super::dto::{
    HandMessageDto, HandMessagesResponse, LiveHandSnapshotResponse, PersistedSnapshotResponse,
    SubmitActionRequest, SubmitActionResponse,
};
use super::error::ApiError;
use super::ws::hand_feed;

pub struct ServerContext {
    pub coordinator: Arc<GameCoordinator>,
    pub gateway: Arc<GatewayState>,
}

pub struct TableStakesServer {
    router: Router,
}

impl TableStakesServer {
    pub fn new(coordinator: Arc<GameCoordinator>, gateway: Arc<GatewayState>) -> Self {
        let context = Arc::new(ServerContext {
            coordinator,
            gateway,
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let router = Router::new()
            .route("/hands/:hand_id/actions", post(submit_action))
            .route("/hands/:hand_id/snapshot", get(get_live_snapshot))
            .route(
                "/hands/:hand_id/snapshot/persisted",
                get(get_persisted_snapshot),
            )
            .route("/hands/:hand_id/messages", get(get_hand_messages))
            .route("/hands/:hand_id/feed", get(hand_feed))
            .route("/ws", get(gateway_ws))
            .with_state(Arc::clone(&context))
            .layer(middleware::from_fn(super::logging::log_requests))
            .layer(cors);

        Self { router }
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

async fn submit_action(
    State(ctx): State<Arc<ServerContext>>,
    Path(hand_id): Path<HandId>,
    Json(payload): Json<SubmitActionRequest>,
) -> Result<Json<SubmitActionResponse>, ApiError> {
    let transition = ctx
        .coordinator
        .submit_action(hand_id, payload.seat, payload.action)
        .await?;
    Ok(Json(SubmitActionResponse::from_transition(transition)))
}

async fn get_live_snapshot(
    State(ctx): State<Arc<ServerContext>>,
    Path(hand_id): Path<HandId>,
) -> Result<Json<LiveHandSnapshotResponse>, ApiError> {
    let state = ctx
        .coordinator
        .snapshot(hand_id)
        .ok_or(ApiError::NotFound)?;
    Ok(Json(LiveHandSnapshotResponse { hand_id, state }))
}

async fn get_persisted_snapshot(
    State(ctx): State<Arc<ServerContext>>,
    Path(hand_id): Path<HandId>,
) -> Result<Json<PersistedSnapshotResponse>, ApiError> {
    let query = LatestSnapshotQuery::new(ctx.coordinator.connection());
    let snapshot = query.execute(hand_id).await?;
    Ok(Json(PersistedSnapshotResponse { snapshot }))
}

#[derive(Debug, Default, Deserialize)]
struct MessagesQueryParams {
    from_sequence: Option<i64>,
    to_sequence: Option<i64>,
}

async fn get_hand_messages(
    State(ctx): State<Arc<ServerContext>>,
    Path(hand_id): Path<HandId>,
    Query(query): Query<MessagesQueryParams>,
) -> Result<Json<HandMessagesResponse>, ApiError> {
    let bounds = SequenceBounds {
        from: query.from_sequence.unwrap_or(0),
        to: query.to_sequence,
    };
    let messages_query = HandMessagesQuery::new(ctx.coordinator.event_store());
    let messages = messages_query.execute(hand_id, bounds).await?;

    Ok(Json(HandMessagesResponse {
        hand_id,
        messages: messages.into_iter().map(HandMessageDto::from).collect(),
    }))
}
