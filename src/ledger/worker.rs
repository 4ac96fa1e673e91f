use chrono::Utc;
use dashmap::DashMap;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

use crate::db::entity::{hand_events, hand_snapshots};
use crate::engine::nl::actions::PlayerAction;
use crate::engine::nl::engine::{BettingEngineNL, EngineNL};
use crate::engine::nl::errors::{ActionError, StateError};
use crate::engine::nl::events::{GameEvent, NormalizedAction};
use crate::engine::nl::state::BettingState;
use crate::engine::nl::types::Street;
use crate::ledger::types::{EventId, HandId};

const LOG_TARGET: &str = "tablestakes::ledger::worker";

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("event could not be applied to hand state")]
    Apply,
    #[error("database operation failed")]
    Database,
}

/// An event folded onto a hand's state during replay. `Action` wraps the
/// engine's own rejection for an `ActionApplied` payload that no longer
/// drives legally from the reconstructed state; `Transition` wraps a street
/// advance that no longer applies.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Transition(#[from] StateError),
}

pub struct IncomingEvent {
    pub hand_id: HandId,
    pub event_id: EventId,
    pub sequence: i64,
    pub event: GameEvent,
    /// The freshly-dealt `BettingState`, carried exactly once per hand
    /// alongside its `HandStarted` event. This is the fold's genesis value;
    /// every later event for the hand folds onto the worker's own
    /// previously materialized state rather than this field.
    pub initial_state: Option<BettingState>,
}

/// Persists each hand's events and materializes the latest `BettingState`
/// snapshot, one hand at a time, in a single background task. Keeping this a
/// single consumer per worker instance is what makes materialization a
/// single-writer-per-key discipline: concurrent publishers race on the
/// channel, not on the row.
///
/// The worker's own `materialized` map is its only source of prior state —
/// it never reads the coordinator's live hand memory. Each row is built by
/// folding `GameEvent`s with `apply_event_in_place`, the same fold
/// `replay_from_events` runs standalone, so a cold-started worker can
/// rebuild every snapshot from `hand_events` alone.
pub struct LedgerWorker {
    receiver: mpsc::Receiver<IncomingEvent>,
    connection: DatabaseConnection,
    materialized: DashMap<HandId, BettingState>,
}

impl LedgerWorker {
    pub fn new(receiver: mpsc::Receiver<IncomingEvent>, connection: DatabaseConnection) -> Self {
        Self {
            receiver,
            connection,
            materialized: DashMap::new(),
        }
    }

    #[instrument(skip(self), level = "info", target = LOG_TARGET)]
    pub async fn run(mut self) -> Result<(), WorkerError> {
        while let Some(incoming) = self.receiver.recv().await {
            let hand_id = incoming.hand_id;
            let event_id = incoming.event_id;
            if let Err(err) = self.handle_event(incoming).await {
                match err {
                    WorkerError::Apply => {
                        warn!(target: LOG_TARGET, hand_id, event_id, "dropping event after apply failure");
                        continue;
                    }
                    WorkerError::Database => {
                        error!(target: LOG_TARGET, hand_id, event_id, "database error while persisting event");
                        return Err(WorkerError::Database);
                    }
                }
            }
        }
        info!(target: LOG_TARGET, "receiver closed; worker exiting");
        Ok(())
    }

    #[instrument(skip(self, incoming), target = LOG_TARGET, fields(hand_id = %incoming.hand_id, event_id = %incoming.event_id))]
    pub async fn handle_event(&self, incoming: IncomingEvent) -> Result<(), WorkerError> {
        let IncomingEvent {
            hand_id,
            event_id,
            sequence,
            event,
            initial_state,
        } = incoming;

        let txn = self
            .connection
            .begin()
            .await
            .map_err(|_| WorkerError::Database)?;

        let already_applied = hand_events::Entity::find()
            .filter(hand_events::Column::HandId.eq(hand_id))
            .filter(hand_events::Column::EventId.eq(event_id))
            .one(&txn)
            .await
            .map_err(|_| WorkerError::Database)?
            .is_some();
        if already_applied {
            txn.commit().await.map_err(|_| WorkerError::Database)?;
            info!(target: LOG_TARGET, hand_id, event_id, "duplicate event redelivered; no-op");
            return Ok(());
        }

        let mut state = match initial_state {
            Some(seed) => seed,
            None => match self.materialized.get(&hand_id) {
                Some(entry) => entry.clone(),
                None => {
                    warn!(target: LOG_TARGET, hand_id, "no materialized snapshot for hand; dropping event");
                    return Err(WorkerError::Apply);
                }
            },
        };

        apply_event_in_place(&mut state, &event).map_err(|_| WorkerError::Apply)?;

        let payload = serde_json::to_value(&event).map_err(|_| WorkerError::Apply)?;
        let state_json = serde_json::to_value(&state).map_err(|_| WorkerError::Apply)?;

        let event_row = hand_events::ActiveModel {
            hand_id: Set(hand_id),
            event_id: Set(event_id),
            sequence: Set(sequence),
            payload: Set(payload),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        hand_events::Entity::insert(event_row)
            .exec(&txn)
            .await
            .map_err(|_| WorkerError::Database)?;

        let snapshot_row = hand_snapshots::ActiveModel {
            hand_id: Set(hand_id),
            sequence: Set(sequence),
            state: Set(state_json),
            updated_at: Set(Utc::now()),
        };
        hand_snapshots::Entity::insert(snapshot_row)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(hand_snapshots::Column::HandId)
                    .update_columns([
                        hand_snapshots::Column::Sequence,
                        hand_snapshots::Column::State,
                        hand_snapshots::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&txn)
            .await
            .map_err(|_| WorkerError::Database)?;

        txn.commit().await.map_err(|_| WorkerError::Database)?;

        self.materialized.insert(hand_id, state);
        Ok(())
    }
}

/// Maps a normalized action back to the `PlayerAction` that produces it, so
/// replay can drive the same validated `EngineNL::apply_action` the live
/// coordinator calls rather than re-deriving its effects by hand — the two
/// paths must never diverge.
fn player_action_for_replay(action: &NormalizedAction) -> PlayerAction {
    match action {
        NormalizedAction::Fold => PlayerAction::Fold,
        NormalizedAction::Check => PlayerAction::Check,
        NormalizedAction::Call { .. } => PlayerAction::Call,
        NormalizedAction::Bet { to } => PlayerAction::BetTo { to: *to },
        NormalizedAction::Raise { to, .. } => PlayerAction::RaiseTo { to: *to },
        NormalizedAction::AllInAsCall { .. }
        | NormalizedAction::AllInAsBet { .. }
        | NormalizedAction::AllInAsRaise { .. } => PlayerAction::AllIn,
    }
}

/// Type-directed fold of one `GameEvent` onto a `BettingState`. Used both
/// live (in `handle_event`, onto the worker's own materialized state) and
/// standalone (in `replay_from_events`) — the two must never diverge.
fn apply_event_in_place(state: &mut BettingState, event: &GameEvent) -> Result<(), ReplayError> {
    match event {
        GameEvent::HandStarted { .. } => {
            // The genesis `BettingState` is handed to the fold directly as
            // `IncomingEvent::initial_state`; this event only marks that a
            // hand began and needs no further mutation here.
        }
        GameEvent::ActionApplied { seat, action } => {
            EngineNL::apply_action(state, *seat, player_action_for_replay(action))?;
        }
        GameEvent::PotUpdated => {
            // Already folded in as a side effect of `apply_action` above;
            // this event is an informational marker only.
        }
        GameEvent::StreetEnded { .. } => {
            EngineNL::advance_street(state)?;
        }
        GameEvent::StreetDealt { .. } => {
            // Community cards live on `LiveHand::cards`, not `BettingState`;
            // nothing to fold here.
        }
        GameEvent::AllPlayersAllIn => {
            state.betting_locked_all_in = true;
        }
        GameEvent::TurnTimeout { .. } => {
            // The timeout's actual effect arrives as the `ActionApplied`
            // event emitted alongside it.
        }
        GameEvent::HandEndedByFolds { .. } => {
            // The fold-to-one-winner payout already happened inside the
            // preceding `ActionApplied`'s `apply_action` call.
        }
        GameEvent::ShowdownReached => {}
        GameEvent::WinnersDetermined { pots, winners } => {
            state.pots = pots.clone();
            state.award(winners);
        }
        GameEvent::HandSettled => {
            state.street = Street::Complete;
        }
    }
    Ok(())
}

/// Rebuilds a hand's `BettingState` by folding its event log onto a starting
/// state (the hand's freshly-dealt state, i.e. what `HandStarted` carries as
/// `IncomingEvent::initial_state` live). Used for crash recovery and for
/// serving historical replays; deterministic and pure, so it is safe to run
/// any number of times against the same log.
pub fn replay_from_events(
    mut state: BettingState,
    events: &[GameEvent],
) -> Result<BettingState, ReplayError> {
    for event in events {
        apply_event_in_place(&mut state, event)?;
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::nl::types::*;

    fn cfg(max_seats: SeatId) -> HandConfig {
        HandConfig {
            stakes: TableStakes {
                small_blind: 5,
                big_blind: 10,
                ante: 0,
            },
            button: 0,
            small_blind_seat: 0,
            big_blind_seat: 1,
            check_raise_allowed: true,
            max_seats,
        }
    }

    fn dealt_heads_up(stack: Chips) -> BettingState {
        let players = vec![
            PlayerState {
                seat: 0,
                player_id: Some(1),
                stack,
                committed_this_round: cfg(2).stakes.small_blind,
                committed_total: 0,
                status: PlayerStatus::Active,
                has_acted_this_round: false,
            },
            PlayerState {
                seat: 1,
                player_id: Some(2),
                stack,
                committed_this_round: cfg(2).stakes.big_blind,
                committed_total: 0,
                status: PlayerStatus::Active,
                has_acted_this_round: false,
            },
        ];
        EngineNL::new_after_deal(cfg(2), players, Pots::default())
    }

    /// Folds a heads-up preflop-fold hand (scenario 1 from the testable
    /// properties: SB folds, BB takes the blinds) from the dealt state
    /// through to `HandSettled` and checks the replayed snapshot matches
    /// what driving the live engine directly produces.
    #[test]
    fn replay_reconstructs_a_fold_to_one_winner_hand() {
        let dealt = dealt_heads_up(1000);

        let mut live = dealt.clone();
        let transition = EngineNL::apply_action(&mut live, 0, PlayerAction::Fold).unwrap();
        assert!(matches!(transition, crate::engine::nl::engine::Transition::HandEnd { .. }));

        let events = vec![
            GameEvent::HandStarted {
                button: 0,
                seats: vec![0, 1],
            },
            GameEvent::ActionApplied {
                seat: 0,
                action: NormalizedAction::Fold,
            },
            GameEvent::HandEndedByFolds {
                winner: 1,
                pots: live.pots.clone(),
            },
        ];

        let replayed = replay_from_events(dealt, &events).unwrap();
        assert_eq!(
            serde_json::to_value(&replayed).unwrap(),
            serde_json::to_value(&live).unwrap()
        );
        assert_eq!(replayed.player(1).stack, 1015);
        assert_eq!(replayed.street, Street::Complete);
    }

    /// A longer round trip through a full street close and showdown payout,
    /// asserting the §8 property directly: replaying emitted events from the
    /// dealt state yields a byte-identical snapshot to the live final state,
    /// and replaying twice yields the same result both times.
    #[test]
    fn replay_is_a_pure_function_of_the_event_log() {
        let dealt = dealt_heads_up(1000);

        // Heads-up preflop: seat 1 (BB) calls seat 0's blind short of a full
        // bet isn't legal here, so drive a simple call/check street close
        // instead: seat 0 (SB) calls, seat 1 (BB) checks, closing preflop.
        let mut live = dealt.clone();
        EngineNL::apply_action(&mut live, 0, PlayerAction::Call).unwrap();
        let transition = EngineNL::apply_action(&mut live, 1, PlayerAction::Check).unwrap();
        assert!(matches!(
            transition,
            crate::engine::nl::engine::Transition::StreetEnd { .. }
        ));
        EngineNL::advance_street(&mut live).unwrap();

        let events = vec![
            GameEvent::HandStarted {
                button: 0,
                seats: vec![0, 1],
            },
            GameEvent::ActionApplied {
                seat: 0,
                action: NormalizedAction::Call {
                    call_amount: 5,
                    full_call: true,
                },
            },
            GameEvent::ActionApplied {
                seat: 1,
                action: NormalizedAction::Check,
            },
            GameEvent::StreetEnded {
                street: Street::Preflop,
            },
        ];

        let replayed = replay_from_events(dealt.clone(), &events).unwrap();
        let replayed_again = replay_from_events(dealt, &events).unwrap();
        assert_eq!(
            serde_json::to_value(&replayed).unwrap(),
            serde_json::to_value(&replayed_again).unwrap()
        );
        assert_eq!(
            serde_json::to_value(&replayed).unwrap(),
            serde_json::to_value(&live).unwrap()
        );
        assert_eq!(replayed.street, Street::Flop);
    }

    /// Extends the round trip through to showdown settlement: preflop closes,
    /// the engine advances to `Showdown`, and `WinnersDetermined`/
    /// `HandSettled` finalize the hand. These two events carry the only
    /// record of the payout (there is no `ActionApplied` driving them), so
    /// the fold must apply their payload directly rather than treat them as
    /// markers — this is the exact gap the review flagged.
    #[test]
    fn replay_reconstructs_a_showdown_settlement() {
        let dealt = dealt_heads_up(1000);

        let mut live = dealt.clone();
        EngineNL::apply_action(&mut live, 0, PlayerAction::Call).unwrap();
        EngineNL::apply_action(&mut live, 1, PlayerAction::Check).unwrap();
        EngineNL::advance_street(&mut live).unwrap();
        assert_eq!(live.street, Street::Flop);

        let pots = live.pots.clone();
        let winners = vec![crate::engine::nl::events::SeatWin {
            seat: 1,
            amount: pots.total_amount(),
        }];
        live.pots = pots.clone();
        live.award(&winners);
        live.street = Street::Complete;

        let events = vec![
            GameEvent::HandStarted {
                button: 0,
                seats: vec![0, 1],
            },
            GameEvent::ActionApplied {
                seat: 0,
                action: NormalizedAction::Call {
                    call_amount: 5,
                    full_call: true,
                },
            },
            GameEvent::ActionApplied {
                seat: 1,
                action: NormalizedAction::Check,
            },
            GameEvent::StreetEnded {
                street: Street::Preflop,
            },
            GameEvent::WinnersDetermined {
                pots: pots.clone(),
                winners: winners.clone(),
            },
            GameEvent::HandSettled,
        ];

        let replayed = replay_from_events(dealt, &events).unwrap();
        assert_eq!(
            serde_json::to_value(&replayed).unwrap(),
            serde_json::to_value(&live).unwrap()
        );
        assert_eq!(replayed.street, Street::Complete);
        assert_eq!(replayed.player(1).stack, 1000 + pots.total_amount());
    }
}
