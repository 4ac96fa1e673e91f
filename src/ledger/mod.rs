pub mod query;
pub mod store;
pub mod types;
pub mod worker;

pub use query::{HandMessage, HandMessagesQuery, LatestSnapshotDto, LatestSnapshotQuery};
pub use store::{EventStore, SeaOrmEventStore, SharedEventStore, StoredEvent};
pub use types::{ActorKind, EntityKind, EventId, GameId, HandId, HandStatus, NonceKey};
pub use worker::{IncomingEvent, LedgerWorker, WorkerError};
