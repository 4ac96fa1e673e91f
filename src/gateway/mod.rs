pub mod auth;
pub mod bridge;
pub mod chat;
pub mod connection;
pub mod error;
pub mod fabric;
pub mod handler;
pub mod heartbeat;
pub mod presence;
pub mod protocol;
pub mod rate_limit;
pub mod subscription;

use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

use auth::AuthVerifier;
use chat::ChatHub;
use connection::ConnectionRegistry;
use fabric::{FabricClient, InProcessFabric};
use presence::PresenceTracker;
use rate_limit::{BucketLimits, RateLimiter};
use subscription::SubscriptionRouter;

pub use error::{ErrorCode, GatewayError};
pub use protocol::{
    ChannelKey, ChannelKind, ClientMessage, ConnectionId, FabricEnvelope, ResumeCursor,
    ServerMessage, TableId,
};

/// Process-wide gateway state shared by every connection handler task: the
/// local connection/subscription registries that serve the hot fan-out path
/// without a network hop, plus the shared pub/sub fabric, presence, chat,
/// and rate limiting from the component design.
pub struct GatewayState {
    pub instance_id: String,
    pub connections: ConnectionRegistry,
    pub subscriptions: SubscriptionRouter,
    pub fabric: Arc<dyn FabricClient>,
    pub presence: PresenceTracker,
    pub chat: ChatHub,
    pub rate_limiter: RateLimiter,
    pub auth: AuthVerifier,
    pub heartbeat_timeout: Duration,
}

impl GatewayState {
    pub fn new(config: &AppConfig, connection: DatabaseConnection) -> Self {
        Self {
            instance_id: config
                .instance_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            connections: ConnectionRegistry::new(config.outbound_queue_messages),
            subscriptions: SubscriptionRouter::new(),
            fabric: Arc::new(InProcessFabric::new(config.outbound_queue_messages * 8)),
            presence: PresenceTracker::new(config.presence_away_after()),
            chat: ChatHub::new(connection, config.chat_retention()),
            rate_limiter: RateLimiter::new(BucketLimits {
                capacity: 20.0,
                refill_per_sec: 5.0,
            }),
            auth: AuthVerifier::Static {
                secret: config.ws_auth_secret.clone(),
            },
            heartbeat_timeout: config.heartbeat_timeout(),
        }
    }
}
