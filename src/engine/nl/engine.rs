use super::actions::PlayerAction;
use super::errors::{ActionError, StateError};
use super::events::{GameEvent, NormalizedAction};
use super::legals::{legal_actions_for, LegalActions};
use super::seating::Seating;
use super::state::BettingState;
use super::types::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Continued {
        events: Vec<GameEvent>,
        next_to_act: SeatId,
    },
    StreetEnd {
        events: Vec<GameEvent>,
        street: Street,
    },
    HandEnd {
        events: Vec<GameEvent>,
        winner: SeatId,
        pots: Pots,
    },
}

pub trait BettingEngineNL {
    fn new_after_deal(cfg: HandConfig, players: Vec<PlayerState>, pots: Pots) -> BettingState;
    fn legal_actions(state: &BettingState, seat: SeatId) -> LegalActions;
    fn apply_action(
        state: &mut BettingState,
        seat: SeatId,
        action: PlayerAction,
    ) -> Result<Transition, ActionError>;
    fn advance_street(state: &mut BettingState) -> Result<(), StateError>;
}

pub struct EngineNL;

fn only_one_player_remaining(state: &BettingState) -> Option<SeatId> {
    let mut remaining = state
        .players
        .iter()
        .filter(|p| p.status != PlayerStatus::Folded)
        .map(|p| p.seat);
    let first = remaining.next()?;
    if remaining.next().is_none() {
        Some(first)
    } else {
        None
    }
}

fn all_players_all_in(state: &BettingState) -> bool {
    state
        .players
        .iter()
        .filter(|p| p.status != PlayerStatus::Folded)
        .all(|p| p.status == PlayerStatus::AllIn)
}

impl BettingEngineNL for EngineNL {
    fn new_after_deal(cfg: HandConfig, players: Vec<PlayerState>, pots: Pots) -> BettingState {
        let street = Street::Preflop;
        let mut state = BettingState {
            street,
            button: cfg.button,
            first_to_act: cfg.big_blind_seat,
            to_act: cfg.big_blind_seat,
            current_bet_to_match: 0,
            last_full_raise_amount: cfg.stakes.big_blind,
            last_aggressor: Some(cfg.big_blind_seat),
            voluntary_bet_opened: false,
            players,
            pots,
            cfg,
            pending_to_match: Vec::new(),
            betting_locked_all_in: false,
            action_log: ActionLog::default(),
        };

        state.current_bet_to_match = state
            .players
            .iter()
            .map(|p| p.committed_this_round)
            .max()
            .unwrap_or(0);
        state.first_to_act = state.compute_first_to_act(street);
        state.to_act = state.first_to_act;
        state.pending_to_match = state
            .players
            .iter()
            .filter(|p| {
                p.status == PlayerStatus::Active
                    && p.committed_this_round < state.current_bet_to_match
            })
            .map(|p| p.seat)
            .collect();
        state.refresh_pots();
        state
    }

    fn legal_actions(state: &BettingState, seat: SeatId) -> LegalActions {
        legal_actions_for(state, seat)
    }

    fn apply_action(
        state: &mut BettingState,
        seat: SeatId,
        action: PlayerAction,
    ) -> Result<Transition, ActionError> {
        if state.street == Street::Showdown || state.street == Street::Complete {
            return Err(ActionError::IllegalAction);
        }
        if state.to_act != seat {
            return Err(ActionError::NotPlayersTurn);
        }
        if state.player(seat).status != PlayerStatus::Active {
            return Err(ActionError::ActorCannotAct);
        }

        let price_before = BettingState::price_to_call(state, seat);
        let normalized = apply_normalized(state, seat, action)?;

        state.action_log.push(ActionLogEntry {
            street: state.street,
            seat,
            action: normalized.clone(),
            price_to_call_before: price_before,
            current_bet_to_match_after: state.current_bet_to_match,
        });

        let mut events = vec![GameEvent::ActionApplied {
            seat,
            action: normalized,
        }];

        let before_pots = state.pots.clone();
        state.refresh_pots();
        if state.pots != before_pots {
            events.push(GameEvent::PotUpdated);
        }

        if let Some(winner) = only_one_player_remaining(state) {
            state.street = Street::Complete;
            let pots = state.pots.clone();
            state.award(&[crate::engine::nl::events::SeatWin {
                seat: winner,
                amount: pots.total_amount(),
            }]);
            events.push(GameEvent::HandEndedByFolds {
                winner,
                pots: pots.clone(),
            });
            return Ok(Transition::HandEnd {
                events,
                winner,
                pots,
            });
        }

        if all_players_all_in(state) && !state.betting_locked_all_in {
            state.betting_locked_all_in = true;
            events.push(GameEvent::AllPlayersAllIn);
        }

        let next = state.next_actor(seat);
        state.to_act = next;

        let street_closed = state.pending_to_match.is_empty()
            && (state.last_aggressor.is_none() || seat == state.last_aggressor.unwrap());
        if street_closed {
            events.push(GameEvent::StreetEnded {
                street: state.street,
            });
            return Ok(Transition::StreetEnd {
                events,
                street: state.street,
            });
        }

        Ok(Transition::Continued {
            events,
            next_to_act: next,
        })
    }

    fn advance_street(state: &mut BettingState) -> Result<(), StateError> {
        let next = match state.street {
            Street::Preflop => Street::Flop,
            Street::Flop => Street::Turn,
            Street::Turn => Street::River,
            Street::River => Street::Showdown,
            Street::Showdown | Street::Complete => return Err(StateError::InvalidTransition),
        };

        if next == Street::Showdown {
            state.street = Street::Showdown;
            state.refresh_pots();
            return Ok(());
        }

        state.reset_per_street(next);
        if all_players_all_in(state) {
            state.betting_locked_all_in = true;
        }
        Ok(())
    }
}

fn apply_normalized(
    state: &mut BettingState,
    seat: SeatId,
    action: PlayerAction,
) -> Result<NormalizedAction, ActionError> {
    let price = BettingState::price_to_call(state, seat);
    let idx = state.seat_index(seat);

    let normalized = match action {
        PlayerAction::Fold => {
            state.players[idx].status = PlayerStatus::Folded;
            state.players[idx].has_acted_this_round = true;
            state.pending_to_match.retain(|s| *s != seat);
            NormalizedAction::Fold
        }
        PlayerAction::Check => {
            if price > 0 {
                return Err(ActionError::CannotCheckFacingBet);
            }
            state.players[idx].has_acted_this_round = true;
            state.pending_to_match.retain(|s| *s != seat);
            NormalizedAction::Check
        }
        PlayerAction::Call => {
            let call_amt = price.min(state.players[idx].stack);
            state.players[idx].stack -= call_amt;
            state.players[idx].committed_this_round += call_amt;
            state.players[idx].committed_total += call_amt;
            let full = call_amt == price;
            if state.players[idx].stack == 0 {
                state.players[idx].status = PlayerStatus::AllIn;
            }
            state.players[idx].has_acted_this_round = true;
            state.pending_to_match.retain(|s| *s != seat);
            NormalizedAction::Call {
                call_amount: call_amt,
                full_call: full,
            }
        }
        PlayerAction::BetTo { to } => {
            if state.current_bet_to_match != 0 {
                return Err(ActionError::CannotBetWhenOpened);
            }
            let needed = to.saturating_sub(state.players[idx].committed_this_round);
            if needed > state.players[idx].stack {
                return Err(ActionError::InsufficientChips);
            }
            if to < state.cfg.stakes.big_blind && needed < state.players[idx].stack {
                return Err(ActionError::IllegalAction);
            }
            state.players[idx].stack -= needed;
            state.players[idx].committed_this_round = to;
            state.players[idx].committed_total += needed;
            state.players[idx].has_acted_this_round = true;
            if state.players[idx].stack == 0 {
                state.players[idx].status = PlayerStatus::AllIn;
            }
            state.current_bet_to_match = to;
            state.last_full_raise_amount = to;
            state.last_aggressor = Some(seat);
            state.voluntary_bet_opened = true;
            state.pending_to_match = state
                .players
                .iter()
                .filter(|p| p.seat != seat && p.status == PlayerStatus::Active)
                .map(|p| p.seat)
                .collect();
            NormalizedAction::Bet { to }
        }
        PlayerAction::RaiseTo { to } => {
            if state.current_bet_to_match == 0 {
                return Err(ActionError::IllegalAction);
            }
            let min_to = state
                .current_bet_to_match
                .saturating_add(state.last_full_raise_amount);
            let max_to = state.players[idx].committed_this_round + state.players[idx].stack;
            if to < min_to && to < max_to {
                return Err(ActionError::RaiseBelowMinimum);
            }
            let needed = to.saturating_sub(state.players[idx].committed_this_round);
            if needed > state.players[idx].stack {
                return Err(ActionError::InsufficientChips);
            }
            state.players[idx].stack -= needed;
            state.players[idx].committed_this_round = to;
            state.players[idx].committed_total += needed;
            state.players[idx].has_acted_this_round = true;
            if state.players[idx].stack == 0 {
                state.players[idx].status = PlayerStatus::AllIn;
            }
            let raise_amt = to.saturating_sub(state.current_bet_to_match);
            let full = BettingState::is_full_raise(state, raise_amt);
            if full {
                state.last_full_raise_amount = raise_amt;
                state.last_aggressor = Some(seat);
            }
            state.current_bet_to_match = to;
            state.voluntary_bet_opened = true;
            state.pending_to_match = state
                .players
                .iter()
                .filter(|p| p.seat != seat && p.status == PlayerStatus::Active)
                .filter(|p| p.committed_this_round < to)
                .filter(|p| full || !p.has_acted_this_round)
                .map(|p| p.seat)
                .collect();
            NormalizedAction::Raise {
                to,
                raise_amount: raise_amt,
                full_raise: full,
            }
        }
        PlayerAction::AllIn => {
            let total_to = state.players[idx].committed_this_round + state.players[idx].stack;
            if state.current_bet_to_match == 0 {
                state.players[idx].committed_total += state.players[idx].stack;
                state.players[idx].committed_this_round = total_to;
                state.players[idx].stack = 0;
                state.players[idx].status = PlayerStatus::AllIn;
                state.players[idx].has_acted_this_round = true;
                state.current_bet_to_match = total_to;
                state.last_full_raise_amount = total_to.max(state.cfg.stakes.big_blind);
                state.last_aggressor = Some(seat);
                state.voluntary_bet_opened = true;
                state.pending_to_match = state
                    .players
                    .iter()
                    .filter(|p| p.seat != seat && p.status == PlayerStatus::Active)
                    .map(|p| p.seat)
                    .collect();
                NormalizedAction::AllInAsBet { to: total_to }
            } else {
                let needed = total_to.saturating_sub(state.players[idx].committed_this_round);
                state.players[idx].stack = 0;
                state.players[idx].committed_this_round = total_to;
                state.players[idx].committed_total += needed;
                state.players[idx].status = PlayerStatus::AllIn;
                state.players[idx].has_acted_this_round = true;
                if total_to <= state.current_bet_to_match {
                    let call_amt = needed.min(price);
                    let full = total_to == state.current_bet_to_match;
                    state.pending_to_match.retain(|s| *s != seat);
                    NormalizedAction::AllInAsCall {
                        call_amount: call_amt,
                        full_call: full,
                    }
                } else {
                    let raise_amt = total_to - state.current_bet_to_match;
                    let full = BettingState::is_full_raise(state, raise_amt);
                    if full {
                        state.last_full_raise_amount = raise_amt;
                        state.last_aggressor = Some(seat);
                    }
                    state.current_bet_to_match = total_to;
                    state.pending_to_match = state
                        .players
                        .iter()
                        .filter(|p| p.seat != seat && p.status == PlayerStatus::Active)
                        .filter(|p| p.committed_this_round < total_to)
                        .filter(|p| full || !p.has_acted_this_round)
                        .map(|p| p.seat)
                        .collect();
                    NormalizedAction::AllInAsRaise {
                        to: total_to,
                        raise_amount: raise_amt,
                        full_raise: full,
                    }
                }
            }
        }
    };

    Ok(normalized)
}
