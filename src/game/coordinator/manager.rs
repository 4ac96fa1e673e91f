use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use dashmap::DashMap;
use sea_orm::DatabaseConnection;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::engine::nl::actions::PlayerAction;
use crate::engine::nl::engine::{BettingEngineNL, EngineNL, Transition};
use crate::engine::nl::errors::{ActionError, StateError};
use crate::engine::nl::events::GameEvent;
use crate::engine::nl::state::BettingState;
use crate::engine::nl::types::{HandConfig, PlayerState, SeatId, Street};
use crate::ledger::store::{EventStore, SeaOrmEventStore, SharedEventStore};
use crate::ledger::types::HandId;
use crate::ledger::worker::{IncomingEvent, LedgerWorker, WorkerError};
use crate::tokio_tools::spawn_named_task;

use super::lifecycle::LiveHand;

const LOG_TARGET: &str = "game::coordinator";

/// Broadcast to every subscriber of a table's realtime feed, table-keyed so a
/// single process-wide channel can serve every hand currently in play.
#[derive(Clone, Debug)]
pub struct TableBroadcast {
    pub hand_id: HandId,
    pub event: GameEvent,
}

pub struct GameCoordinatorConfig {
    pub connection: DatabaseConnection,
    pub submit_channel_capacity: usize,
    pub broadcast_channel_capacity: usize,
    pub turn_timer: Duration,
}

/// Owns the in-memory hand states and fans every applied action out to the
/// persistence worker and to realtime subscribers. Mutation happens
/// synchronously against `live_states` so a client's next legal-actions query
/// always reflects its own just-applied action; persistence trails behind on
/// the worker's channel.
pub struct GameCoordinator {
    connection: DatabaseConnection,
    event_store: SharedEventStore,
    live_states: Arc<DashMap<HandId, LiveHand>>,
    submit_tx: mpsc::Sender<IncomingEvent>,
    broadcast_tx: broadcast::Sender<TableBroadcast>,
    worker_handle: Option<JoinHandle<Result<(), WorkerError>>>,
    next_event_id: AtomicI64,
    turn_timer: Duration,
}

impl GameCoordinator {
    pub async fn spawn(config: GameCoordinatorConfig) -> Result<Self> {
        let event_store: SharedEventStore =
            Arc::new(SeaOrmEventStore::new(config.connection.clone()));
        let live_states = Arc::new(DashMap::new());
        let (submit_tx, submit_rx) = mpsc::channel(config.submit_channel_capacity);
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_channel_capacity);

        let worker = LedgerWorker::new(submit_rx, config.connection.clone());
        let worker_handle = Some(spawn_named_task("ledger-worker", worker.run()));

        Ok(Self {
            connection: config.connection,
            event_store,
            live_states,
            submit_tx,
            broadcast_tx,
            worker_handle,
            next_event_id: AtomicI64::new(1),
            turn_timer: config.turn_timer,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TableBroadcast> {
        self.broadcast_tx.subscribe()
    }

    pub fn event_store(&self) -> SharedEventStore {
        Arc::clone(&self.event_store)
    }

    pub fn connection(&self) -> DatabaseConnection {
        self.connection.clone()
    }

    /// Shuffles a fresh deck from `seed`, deals hole cards to every seated
    /// player, and seats the hand into memory at preflop so it can start
    /// receiving actions. Persistence of the seed state itself is the
    /// caller's job (the `hands`/`seats` rows are written by whatever deals
    /// the hand).
    pub async fn deal_hand(
        &self,
        hand_id: HandId,
        cfg: HandConfig,
        players: Vec<PlayerState>,
        seed: u64,
    ) {
        let (hand, events) = LiveHand::deal(cfg, players, seed, self.turn_timer);
        let genesis_state = hand.state.clone();
        self.live_states.insert(hand_id, hand);
        info!(target: LOG_TARGET, hand_id, "hand dealt into memory");
        self.publish(hand_id, events, Some(genesis_state)).await;
    }

    pub fn release_hand(&self, hand_id: HandId) {
        self.live_states.remove(&hand_id);
    }

    pub fn snapshot(&self, hand_id: HandId) -> Option<BettingState> {
        self.live_states.get(&hand_id).map(|entry| entry.state.clone())
    }

    /// The community cards dealt so far for `hand_id`, empty if the hand is
    /// unknown or still preflop.
    pub fn board(&self, hand_id: HandId) -> Vec<crate::engine::deck::Card> {
        self.live_states
            .get(&hand_id)
            .map(|entry| entry.cards.board.clone())
            .unwrap_or_default()
    }

    /// A seat's own hole cards, if the hand is live and the seat was dealt
    /// in. Never call this for a seat other than the requesting connection's
    /// own — the gateway is the only place that enforces that boundary.
    pub fn hole_cards(&self, hand_id: HandId, seat: SeatId) -> Option<[crate::engine::deck::Card; 2]> {
        self.live_states
            .get(&hand_id)
            .and_then(|entry| entry.cards.hole_cards.get(&seat).copied())
    }

    pub async fn submit_action(
        &self,
        hand_id: HandId,
        seat: SeatId,
        action: PlayerAction,
    ) -> Result<Transition, CoordinatorError> {
        let (events, transition) = self.apply(hand_id, seat, action)?;
        self.publish(hand_id, events, None).await;
        Ok(transition)
    }

    /// Scans every live hand for one whose action clock has expired and
    /// applies the default timeout action (Check if legal, else Fold) on
    /// behalf of the seat on the clock. Intended to be polled periodically
    /// by a background task; deadlines, not sleeps, make this safe to run
    /// from any number of callers or to resume after a restart.
    pub async fn tick(&self, now: Instant) {
        let timed_out: Vec<(HandId, SeatId, PlayerAction)> = self
            .live_states
            .iter()
            .filter(|entry| entry.is_timed_out(now))
            .map(|entry| (*entry.key(), entry.state.to_act, entry.timeout_action()))
            .collect();

        for (hand_id, seat, action) in timed_out {
            match self.apply(hand_id, seat, action) {
                Ok((mut events, _)) => {
                    events.insert(0, GameEvent::TurnTimeout { seat });
                    self.publish(hand_id, events, None).await;
                }
                Err(err) => {
                    warn!(target: LOG_TARGET, hand_id, seat, %err, "failed to apply turn timeout");
                }
            }
        }
    }

    /// Applies one action to a live hand's betting engine, driving street
    /// advancement, community-card dealing, and showdown settlement inline
    /// so the in-memory state is always caught up before this call returns.
    fn apply(
        &self,
        hand_id: HandId,
        seat: SeatId,
        action: PlayerAction,
    ) -> Result<(Vec<GameEvent>, Transition), CoordinatorError> {
        let mut entry = self
            .live_states
            .get_mut(&hand_id)
            .ok_or(CoordinatorError::HandNotFound(hand_id))?;

        let transition = EngineNL::apply_action(&mut entry.state, seat, action)?;
        let mut events = match &transition {
            Transition::Continued { events, .. }
            | Transition::StreetEnd { events, .. }
            | Transition::HandEnd { events, .. } => events.clone(),
        };

        match &transition {
            Transition::StreetEnd { .. } => {
                EngineNL::advance_street(&mut entry.state).map_err(CoordinatorError::State)?;
                if let Some(dealt) = entry.deal_street() {
                    events.push(dealt);
                }
                if entry.state.street == Street::Showdown {
                    events.push(GameEvent::ShowdownReached);
                    events.push(entry.settle_at_showdown());
                    events.push(GameEvent::HandSettled);
                }
                entry.arm_timer(self.turn_timer);
            }
            Transition::HandEnd { .. } => {
                entry.action_deadline = None;
            }
            Transition::Continued { .. } => {
                entry.arm_timer(self.turn_timer);
            }
        }

        Ok((events, transition))
    }

    /// `seed` is the freshly-dealt `BettingState`, attached only to the first
    /// emitted event (the `HandStarted` that `deal_hand` produces) so the
    /// ledger worker can fold its event log from that genesis state instead
    /// of reading the coordinator's live memory.
    async fn publish(&self, hand_id: HandId, events: Vec<GameEvent>, seed: Option<BettingState>) {
        let mut seed = seed;
        for event in events {
            let event_id = self.next_event_id.fetch_add(1, Ordering::SeqCst);
            if self
                .submit_tx
                .send(IncomingEvent {
                    hand_id,
                    event_id,
                    sequence: event_id,
                    event: event.clone(),
                    initial_state: seed.take(),
                })
                .await
                .is_err()
            {
                warn!(target: LOG_TARGET, hand_id, "ledger worker channel closed; event not persisted");
            }
            let _ = self.broadcast_tx.send(TableBroadcast { hand_id, event });
        }
    }

    pub async fn shutdown(mut self) -> Result<()> {
        drop(self.submit_tx);
        if let Some(handle) = self.worker_handle.take() {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => return Err(anyhow!("ledger worker exited with error: {err}")),
                Err(err) => return Err(anyhow!("failed to join ledger worker: {err}")),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("hand {0} not found")]
    HandNotFound(HandId),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    State(#[from] StateError),
}
