pub mod lifecycle;
pub mod manager;

pub use lifecycle::LiveHand;
pub use manager::{CoordinatorError, GameCoordinator, GameCoordinatorConfig, TableBroadcast};
