use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::engine::deck::Deck;
use crate::engine::nl::actions::PlayerAction;
use crate::engine::nl::engine::{BettingEngineNL, EngineNL};
use crate::engine::nl::events::GameEvent;
use crate::engine::nl::rules::NoLimitRules;
use crate::engine::nl::state::BettingState;
use crate::engine::nl::types::{HandConfig, PlayerState, Pots, SeatId, Street};
use crate::engine::showdown::{resolve_showdown, HandCards};

/// A hand's betting state plus the cards dealt for it and its turn clock.
/// The betting engine itself never looks at cards before showdown; this is
/// the layer that owns the deck and decides when the clock runs out.
#[derive(Clone, Debug)]
pub struct LiveHand {
    pub state: BettingState,
    pub cards: HandCards,
    deck: Deck,
    pub action_deadline: Option<Instant>,
}

impl LiveHand {
    /// Shuffles a fresh deck from `seed`, deals two hole cards to every
    /// seated player, and seats the engine at preflop. Returns the hand
    /// along with the `HandStarted` event that should lead its log.
    pub fn deal(
        cfg: HandConfig,
        players: Vec<PlayerState>,
        seed: u64,
        turn_timer: Duration,
    ) -> (Self, Vec<GameEvent>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut deck = Deck::standard_52();
        deck.shuffle(&mut rng);

        let button = cfg.button;
        let mut seats: Vec<SeatId> = players.iter().map(|p| p.seat).collect();
        seats.sort_unstable();

        let mut hole_cards = HashMap::with_capacity(seats.len());
        for seat in &seats {
            let dealt = deck.deal(2);
            hole_cards.insert(*seat, [dealt[0], dealt[1]]);
        }

        let state = EngineNL::new_after_deal(cfg, players, Pots::default());

        let mut hand = LiveHand {
            state,
            cards: HandCards {
                hole_cards,
                board: Vec::new(),
            },
            deck,
            action_deadline: None,
        };
        hand.arm_timer(turn_timer);

        (hand, vec![GameEvent::HandStarted { button, seats }])
    }

    /// Sets `action_deadline` to `now + turn_timer` unless the hand has
    /// already reached showdown/complete, in which case no seat is on the
    /// clock.
    pub fn arm_timer(&mut self, turn_timer: Duration) {
        self.action_deadline = match self.state.street {
            Street::Showdown | Street::Complete => None,
            _ => Some(Instant::now() + turn_timer),
        };
    }

    /// True once `deadline` has passed and a seat is still on the clock.
    pub fn is_timed_out(&self, now: Instant) -> bool {
        self.action_deadline
            .map(|deadline| now >= deadline)
            .unwrap_or(false)
    }

    /// The default timeout action for whoever is currently on the clock:
    /// Check if legal, else Fold.
    pub fn timeout_action(&self) -> PlayerAction {
        if BettingState::price_to_call(&self.state, self.state.to_act) == 0 {
            PlayerAction::Check
        } else {
            PlayerAction::Fold
        }
    }

    /// Deals the community cards due for the engine's current street (3 on
    /// the flop, 1 each on turn and river). Returns `None` once past the
    /// river (showdown/complete deal no cards here).
    pub fn deal_street(&mut self) -> Option<GameEvent> {
        let n = match self.state.street {
            Street::Flop => 3,
            Street::Turn | Street::River => 1,
            Street::Preflop | Street::Showdown | Street::Complete => return None,
        };
        let dealt = self.deck.deal(n);
        self.cards.board.extend(dealt);
        Some(GameEvent::StreetDealt {
            street: self.state.street,
            board: self.cards.board.clone(),
        })
    }

    /// Scores every remaining hand, splits the pots, credits the winners'
    /// stacks, and marks the hand complete. Only meaningful once the engine
    /// has reached `Street::Showdown`.
    pub fn settle_at_showdown(&mut self) -> GameEvent {
        let event = resolve_showdown(&self.state, &self.cards);
        if let GameEvent::WinnersDetermined { winners, .. } = &event {
            self.state.award(winners);
        }
        self.state.street = Street::Complete;
        self.action_deadline = None;
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::nl::types::TableStakes;

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

    #[test]
    fn deal_gives_every_seat_two_distinct_hole_cards() {
        let players = vec![PlayerState::new(0, 1000), PlayerState::new(1, 1000)];
        let (hand, events) = LiveHand::deal(cfg(2), players, 7, Duration::from_secs(30));

        assert_eq!(hand.cards.hole_cards.len(), 2);
        for cards in hand.cards.hole_cards.values() {
            assert_ne!(cards[0], cards[1]);
        }
        assert!(matches!(events[0], GameEvent::HandStarted { .. }));
        assert!(hand.action_deadline.is_some());
    }

    #[test]
    fn deal_street_adds_three_then_one_then_one_cards() {
        let players = vec![PlayerState::new(0, 1000), PlayerState::new(1, 1000)];
        let (mut hand, _) = LiveHand::deal(cfg(2), players, 11, Duration::from_secs(30));

        hand.state.street = Street::Flop;
        hand.deal_street();
        assert_eq!(hand.cards.board.len(), 3);

        hand.state.street = Street::Turn;
        hand.deal_street();
        assert_eq!(hand.cards.board.len(), 4);

        hand.state.street = Street::River;
        hand.deal_street();
        assert_eq!(hand.cards.board.len(), 5);

        hand.state.street = Street::Showdown;
        assert!(hand.deal_street().is_none());
    }
}
