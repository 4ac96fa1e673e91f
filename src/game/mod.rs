pub mod coordinator;

pub use coordinator::{CoordinatorError, GameCoordinator, GameCoordinatorConfig, TableBroadcast};
