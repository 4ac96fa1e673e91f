use std::collections::HashMap;

use super::deck::Card;
use super::evaluator::{best_five_of_seven, HandScore};
use crate::engine::nl::events::{GameEvent, SeatWin};
use crate::engine::nl::state::BettingState;
use crate::engine::nl::types::{PlayerStatus, SeatId};

/// Hole cards and board for a single hand, kept alongside its `BettingState`
/// by whoever deals the hand. The engine itself never looks at cards before
/// showdown; it only needs to know who is still in and who is all-in.
#[derive(Clone, Debug, Default)]
pub struct HandCards {
    pub hole_cards: HashMap<SeatId, [Card; 2]>,
    pub board: Vec<Card>,
}

impl HandCards {
    fn seven_card_hand(&self, seat: SeatId) -> Option<[Card; 7]> {
        let hole = self.hole_cards.get(&seat)?;
        if self.board.len() != 5 {
            return None;
        }
        let mut seven = [hole[0]; 7];
        seven[0] = hole[0];
        seven[1] = hole[1];
        seven[2..7].copy_from_slice(&self.board);
        Some(seven)
    }
}

/// Among a set of tied winners, picks the seat nearest clockwise from the
/// button (i.e. the first seat encountered walking button+1, button+2, ...
/// around the table). This is the house rule for odd-chip remainders.
fn nearest_clockwise_from_button(button: SeatId, max_seats: SeatId, winners: &[SeatId]) -> SeatId {
    for offset in 1..=max_seats {
        let seat = (button + offset) % max_seats;
        if winners.contains(&seat) {
            return seat;
        }
    }
    winners[0]
}

/// Scores every seat still in the hand, splits each pot among its best-hand
/// eligible seats (even amounts first, remainder to the seat nearest
/// clockwise from the button), and returns the resulting `WinnersDetermined`
/// event.
pub fn resolve_showdown(state: &BettingState, cards: &HandCards) -> GameEvent {
    let scores: HashMap<SeatId, HandScore> = state
        .players
        .iter()
        .filter(|p| p.status != PlayerStatus::Folded)
        .filter_map(|p| {
            cards
                .seven_card_hand(p.seat)
                .map(|seven| (p.seat, best_five_of_seven(seven).0))
        })
        .collect();

    let mut winners = Vec::new();
    for pot in state.pots.all() {
        let mut pot_winners: Vec<SeatId> = Vec::new();
        let mut best: Option<HandScore> = None;
        for seat in &pot.eligible {
            let Some(score) = scores.get(seat) else {
                continue;
            };
            match best {
                None => {
                    best = Some(*score);
                    pot_winners = vec![*seat];
                }
                Some(current_best) if *score > current_best => {
                    best = Some(*score);
                    pot_winners = vec![*seat];
                }
                Some(current_best) if *score == current_best => {
                    pot_winners.push(*seat);
                }
                _ => {}
            }
        }
        if pot_winners.is_empty() {
            continue;
        }
        pot_winners.sort_unstable();
        let share = pot.amount / pot_winners.len() as u64;
        let remainder = pot.amount % pot_winners.len() as u64;
        let remainder_seat =
            nearest_clockwise_from_button(state.button, state.cfg.max_seats, &pot_winners);
        for seat in pot_winners {
            let amount = share + if seat == remainder_seat { remainder } else { 0 };
            winners.push(SeatWin { seat, amount });
        }
    }

    GameEvent::WinnersDetermined {
        pots: state.pots.clone(),
        winners,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::deck::Suit;
    use crate::engine::nl::types::{HandConfig, PlayerState, Pot, Pots, TableStakes};

    fn c(rank: u8, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn state_with_pots(pots: Pots, players: Vec<PlayerState>) -> BettingState {
        BettingState {
            street: crate::engine::nl::types::Street::Showdown,
            button: 0,
            first_to_act: 0,
            to_act: 0,
            current_bet_to_match: 0,
            last_full_raise_amount: 2,
            last_aggressor: None,
            voluntary_bet_opened: false,
            players,
            pots,
            cfg: HandConfig {
                stakes: TableStakes {
                    small_blind: 1,
                    big_blind: 2,
                    ante: 0,
                },
                button: 0,
                small_blind_seat: 1,
                big_blind_seat: 2,
                check_raise_allowed: true,
                max_seats: 3,
            },
            pending_to_match: vec![],
            betting_locked_all_in: false,
            action_log: Default::default(),
        }
    }

    #[test]
    fn single_eligible_seat_wins_the_whole_pot() {
        let pots = Pots {
            main: Pot {
                amount: 100,
                eligible: vec![0, 1],
            },
            sides: vec![],
        };
        let players = vec![PlayerState::new(0, 0), PlayerState::new(1, 0)];
        let state = state_with_pots(pots, players);

        let mut cards = HandCards::default();
        cards.hole_cards.insert(0, [c(14, Suit::Spades), c(14, Suit::Hearts)]);
        cards.hole_cards.insert(1, [c(2, Suit::Clubs), c(3, Suit::Diamonds)]);
        cards.board = vec![
            c(14, Suit::Clubs),
            c(9, Suit::Hearts),
            c(5, Suit::Spades),
            c(6, Suit::Diamonds),
            c(7, Suit::Clubs),
        ];

        let event = resolve_showdown(&state, &cards);
        match event {
            GameEvent::WinnersDetermined { winners, .. } => {
                assert_eq!(winners.len(), 1);
                assert_eq!(winners[0].seat, 0);
                assert_eq!(winners[0].amount, 100);
            }
            _ => panic!("expected WinnersDetermined"),
        }
    }

    #[test]
    fn tied_hands_split_the_pot_with_remainder_clockwise_from_button() {
        let pots = Pots {
            main: Pot {
                amount: 101,
                eligible: vec![0, 1],
            },
            sides: vec![],
        };
        let players = vec![PlayerState::new(0, 0), PlayerState::new(1, 0)];
        let state = state_with_pots(pots, players);

        let mut cards = HandCards::default();
        cards.hole_cards.insert(0, [c(2, Suit::Spades), c(9, Suit::Hearts)]);
        cards.hole_cards.insert(1, [c(2, Suit::Clubs), c(9, Suit::Diamonds)]);
        cards.board = vec![
            c(14, Suit::Clubs),
            c(13, Suit::Hearts),
            c(5, Suit::Spades),
            c(6, Suit::Diamonds),
            c(7, Suit::Clubs),
        ];

        let event = resolve_showdown(&state, &cards);
        match event {
            GameEvent::WinnersDetermined { winners, .. } => {
                assert_eq!(winners.len(), 2);
                let total: u64 = winners.iter().map(|w| w.amount).sum();
                assert_eq!(total, 101);
                // button is seat 0, so seat 1 is nearest clockwise and takes the odd chip.
                assert_eq!(winners[0].seat, 0);
                assert_eq!(winners[0].amount, 50);
                assert_eq!(winners[1].seat, 1);
                assert_eq!(winners[1].amount, 51);
            }
            _ => panic!("expected WinnersDetermined"),
        }
    }
}
