use std::sync::Arc;

use thiserror::Error;

use crate::engine::nl::events::GameEvent;
use crate::ledger::store::{EventStore, StoredEvent};
use crate::ledger::types::HandId;

/// Inclusive sequence bounds for a message history query. `to` of `None`
/// means "up to the latest persisted event".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceBounds {
    pub from: i64,
    pub to: Option<i64>,
}

impl SequenceBounds {
    pub fn validate(&self) -> Result<(), MessagesQueryError> {
        if self.from < 0 {
            return Err(MessagesQueryError::InvalidBounds(
                "from sequence must be non-negative",
            ));
        }
        if let Some(to) = self.to {
            if to < self.from {
                return Err(MessagesQueryError::InvalidBounds(
                    "to sequence must not precede from sequence",
                ));
            }
        }
        Ok(())
    }

    fn contains(&self, sequence: i64) -> bool {
        sequence >= self.from && self.to.map_or(true, |to| sequence <= to)
    }
}

#[derive(Debug, Error)]
pub enum MessagesQueryError {
    #[error("invalid sequence bounds: {0}")]
    InvalidBounds(&'static str),
    #[error("failed to load hand events")]
    Store(#[from] anyhow::Error),
}

/// Serves the ordered slice of a hand's event log within `bounds`, the way a
/// reconnecting client replays missed messages.
pub struct HandMessagesQuery {
    store: Arc<dyn EventStore>,
}

impl HandMessagesQuery {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    pub async fn execute(
        &self,
        hand_id: HandId,
        bounds: SequenceBounds,
    ) -> Result<Vec<HandMessage>, MessagesQueryError> {
        bounds.validate()?;
        let mut events = self.store.load_hand_events(hand_id).await?;
        events.sort_by_key(|e| e.sequence);
        Ok(events
            .into_iter()
            .filter(|e| bounds.contains(e.sequence))
            .map(HandMessage::from)
            .collect())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HandMessage {
    pub hand_id: HandId,
    pub sequence: i64,
    pub event: GameEvent,
}

impl From<StoredEvent> for HandMessage {
    fn from(stored: StoredEvent) -> Self {
        Self {
            hand_id: stored.hand_id,
            sequence: stored.sequence,
            event: stored.event,
        }
    }
}
