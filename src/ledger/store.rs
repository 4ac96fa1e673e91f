use std::sync::Arc;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use crate::db::entity::hand_events;
use crate::engine::nl::events::GameEvent;
use crate::ledger::types::{EventId, HandId};

pub type SharedEventStore = Arc<dyn EventStore>;

/// An append-only log of normalized `GameEvent`s for a hand. Appends are
/// idempotent on `(hand_id, event_id)`: retrying a publish after a crash
/// conflicts on the unique index instead of double-applying.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append(
        &self,
        hand_id: HandId,
        event_id: EventId,
        sequence: i64,
        event: &GameEvent,
    ) -> anyhow::Result<bool>;

    async fn load_hand_events(&self, hand_id: HandId) -> anyhow::Result<Vec<StoredEvent>>;

    async fn load_all_events(&self) -> anyhow::Result<Vec<StoredEvent>>;
}

#[derive(Debug, Clone)]
pub struct StoredEvent {
    pub hand_id: HandId,
    pub event_id: EventId,
    pub sequence: i64,
    pub event: GameEvent,
}

pub struct SeaOrmEventStore {
    connection: DatabaseConnection,
}

impl SeaOrmEventStore {
    pub fn new(connection: DatabaseConnection) -> Self {
        Self { connection }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}

#[async_trait]
impl EventStore for SeaOrmEventStore {
    async fn append(
        &self,
        hand_id: HandId,
        event_id: EventId,
        sequence: i64,
        event: &GameEvent,
    ) -> anyhow::Result<bool> {
        let existing = hand_events::Entity::find()
            .filter(hand_events::Column::HandId.eq(hand_id))
            .filter(hand_events::Column::EventId.eq(event_id))
            .one(&self.connection)
            .await
            .context("failed to check for duplicate hand event")?;
        if existing.is_some() {
            return Ok(false);
        }

        let payload = serde_json::to_value(event).context("failed to encode event payload")?;
        let active = hand_events::ActiveModel {
            hand_id: Set(hand_id),
            event_id: Set(event_id),
            sequence: Set(sequence),
            payload: Set(payload),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        hand_events::Entity::insert(active)
            .exec(&self.connection)
            .await
            .context("failed to persist hand event")?;
        Ok(true)
    }

    async fn load_hand_events(&self, hand_id: HandId) -> anyhow::Result<Vec<StoredEvent>> {
        let rows = hand_events::Entity::find()
            .filter(hand_events::Column::HandId.eq(hand_id))
            .order_by_asc(hand_events::Column::Sequence)
            .all(&self.connection)
            .await
            .context("failed to load events for hand")?;
        rows.into_iter().map(model_to_stored).collect()
    }

    async fn load_all_events(&self) -> anyhow::Result<Vec<StoredEvent>> {
        let rows = hand_events::Entity::find()
            .order_by_asc(hand_events::Column::HandId)
            .order_by_asc(hand_events::Column::Sequence)
            .all(&self.connection)
            .await
            .context("failed to load events")?;
        rows.into_iter().map(model_to_stored).collect()
    }
}

fn model_to_stored(row: hand_events::Model) -> anyhow::Result<StoredEvent> {
    let event: GameEvent = serde_json::from_value(row.payload)
        .map_err(|err| anyhow!("failed to decode stored event payload: {err}"))?;
    Ok(StoredEvent {
        hand_id: row.hand_id,
        event_id: row.event_id,
        sequence: row.sequence,
        event,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::nl::events::NormalizedAction;

    #[test]
    fn stored_event_payload_round_trips_through_json() {
        let event = GameEvent::ActionApplied {
            seat: 2,
            action: NormalizedAction::Check,
        };
        let payload = serde_json::to_value(&event).unwrap();
        let back: GameEvent = serde_json::from_value(payload).unwrap();
        assert_eq!(event, back);
    }
}
