use serde::Serialize;
use thiserror::Error;

use crate::db::entity::hand_snapshots;
use crate::engine::nl::state::BettingState;
use crate::engine::nl::types::Street;
use crate::ledger::types::HandId;

/// Reads back the latest materialized `BettingState` for a hand straight
/// from `hand_snapshots`, the row `LedgerWorker` keeps current.
#[derive(Clone)]
pub struct LatestSnapshotQuery {
    connection: sea_orm::DatabaseConnection,
}

impl LatestSnapshotQuery {
    pub fn new(connection: sea_orm::DatabaseConnection) -> Self {
        Self { connection }
    }

    pub async fn execute(&self, hand_id: HandId) -> Result<LatestSnapshotDto, LatestSnapshotError> {
        use sea_orm::EntityTrait;

        let row = hand_snapshots::Entity::find_by_id(hand_id)
            .one(&self.connection)
            .await
            .map_err(|_| LatestSnapshotError::Database)?
            .ok_or(LatestSnapshotError::HandNotFound { hand_id })?;

        let state: BettingState = serde_json::from_value(row.state)
            .map_err(|_| LatestSnapshotError::Corrupt { hand_id })?;

        Ok(LatestSnapshotDto {
            hand_id,
            sequence: row.sequence,
            street: SnapshotStreetDto::from(state.street),
            pot_total: state.pots.total_amount(),
            to_act: state.to_act,
        })
    }
}

#[derive(Debug, Error)]
pub enum LatestSnapshotError {
    #[error("no snapshot found for hand {hand_id}")]
    HandNotFound { hand_id: HandId },
    #[error("snapshot for hand {hand_id} could not be decoded")]
    Corrupt { hand_id: HandId },
    #[error("database error while loading snapshot")]
    Database,
}

#[derive(Clone, Debug, Serialize)]
pub struct LatestSnapshotDto {
    pub hand_id: HandId,
    pub sequence: i64,
    pub street: SnapshotStreetDto,
    pub pot_total: u64,
    pub to_act: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStreetDto {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Complete,
}

impl From<Street> for SnapshotStreetDto {
    fn from(street: Street) -> Self {
        match street {
            Street::Preflop => SnapshotStreetDto::Preflop,
            Street::Flop => SnapshotStreetDto::Flop,
            Street::Turn => SnapshotStreetDto::Turn,
            Street::River => SnapshotStreetDto::River,
            Street::Showdown => SnapshotStreetDto::Showdown,
            Street::Complete => SnapshotStreetDto::Complete,
        }
    }
}
