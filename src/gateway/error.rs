use thiserror::Error;

/// Error codes carried on the wire in `ServerMessage::Error`, drawn from a
/// closed taxonomy the client can match on without parsing prose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    AuthDenied,
    RateLimited,
    Backpressure,
    NotSubscribed,
    Forbidden,
    EngineRejected,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("authentication denied")]
    AuthDenied,
    #[error("not authorized for this channel")]
    Forbidden,
    #[error("not subscribed to this channel")]
    NotSubscribed,
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("outbound queue exceeded its bound")]
    Backpressure,
    #[error(transparent)]
    Coordinator(#[from] crate::game::coordinator::CoordinatorError),
}

impl GatewayError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GatewayError::AuthDenied => ErrorCode::AuthDenied,
            GatewayError::Forbidden => ErrorCode::Forbidden,
            GatewayError::NotSubscribed => ErrorCode::NotSubscribed,
            GatewayError::RateLimited { .. } => ErrorCode::RateLimited,
            GatewayError::Backpressure => ErrorCode::Backpressure,
            GatewayError::Coordinator(_) => ErrorCode::EngineRejected,
        }
    }
}
