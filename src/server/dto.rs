use serde::{Deserialize, Serialize};

use crate::engine::nl::actions::PlayerAction;
use crate::engine::nl::engine::Transition;
use crate::engine::nl::events::GameEvent;
use crate::engine::nl::state::BettingState;
use crate::engine::nl::types::{Chips, SeatId, Street};
use crate::ledger::query::{HandMessage, LatestSnapshotDto};
use crate::ledger::types::HandId;

#[derive(Debug, Deserialize)]
pub struct SubmitActionRequest {
    pub seat: SeatId,
    pub action: PlayerAction,
}

#[derive(Debug, Serialize)]
pub struct SubmitActionResponse {
    pub events: Vec<GameEvent>,
    pub outcome: TransitionDto,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionDto {
    Continued { next_to_act: SeatId },
    StreetEnd { street: StreetDto },
    HandEnd { winner: SeatId, pot_total: Chips },
}

impl From<&Transition> for TransitionDto {
    fn from(transition: &Transition) -> Self {
        match transition {
            Transition::Continued { next_to_act, .. } => TransitionDto::Continued {
                next_to_act: *next_to_act,
            },
            Transition::StreetEnd { street, .. } => TransitionDto::StreetEnd {
                street: StreetDto::from(*street),
            },
            Transition::HandEnd { winner, pots, .. } => TransitionDto::HandEnd {
                winner: *winner,
                pot_total: pots.total_amount(),
            },
        }
    }
}

impl SubmitActionResponse {
    pub fn from_transition(transition: Transition) -> Self {
        let outcome = TransitionDto::from(&transition);
        let events = match transition {
            Transition::Continued { events, .. }
            | Transition::StreetEnd { events, .. }
            | Transition::HandEnd { events, .. } => events,
        };
        Self { events, outcome }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreetDto {
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Complete,
}

impl From<Street> for StreetDto {
    fn from(street: Street) -> Self {
        match street {
            Street::Preflop => StreetDto::Preflop,
            Street::Flop => StreetDto::Flop,
            Street::Turn => StreetDto::Turn,
            Street::River => StreetDto::River,
            Street::Showdown => StreetDto::Showdown,
            Street::Complete => StreetDto::Complete,
        }
    }
}

/// The live, in-memory hand state, serialized straight from `BettingState`.
/// This is intentionally the same shape the engine reasons over: clients are
/// expected to derive legal actions, pot totals, etc. from it directly.
#[derive(Debug, Serialize)]
pub struct LiveHandSnapshotResponse {
    pub hand_id: HandId,
    pub state: BettingState,
}

#[derive(Debug, Serialize)]
pub struct PersistedSnapshotResponse {
    #[serde(flatten)]
    pub snapshot: LatestSnapshotDto,
}

#[derive(Debug, Serialize)]
pub struct HandMessagesResponse {
    pub hand_id: HandId,
    pub messages: Vec<HandMessageDto>,
}

#[derive(Debug, Serialize)]
pub struct HandMessageDto {
    pub sequence: i64,
    pub event: GameEvent,
}

impl From<HandMessage> for HandMessageDto {
    fn from(message: HandMessage) -> Self {
        Self {
            sequence: message.sequence,
            event: message.event,
        }
    }
}
