pub mod latest_snapshot;
pub mod messages;

pub use latest_snapshot::{LatestSnapshotDto, LatestSnapshotError, LatestSnapshotQuery};
pub use messages::{HandMessage, HandMessagesQuery, MessagesQueryError, SequenceBounds};
