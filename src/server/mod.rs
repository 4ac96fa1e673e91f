pub mod bootstrap;
mod dto;
mod error;
pub mod logging;
pub mod routes;
mod ws;

pub use bootstrap::{run_server, ServerConfig};
pub use dto::{
    HandMessageDto, HandMessagesResponse, LiveHandSnapshotResponse, PersistedSnapshotResponse,
    SubmitActionRequest, SubmitActionResponse, StreetDto, TransitionDto,
};
pub use error::ApiError;
pub use routes::{ServerContext, TableStakesServer};
