use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];
}

/// 2..=14, where 14 is Ace (ace-high by default; wheel straights are handled
/// explicitly by the evaluator).
pub type Rank = u8;

pub const TWO: Rank = 2;
pub const ACE: Rank = 14;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        debug_assert!((TWO..=ACE).contains(&rank));
        Self { rank, suit }
    }

    /// Index into a 52-slot array, 0..52, ordered by suit then rank.
    pub fn index(&self) -> usize {
        let suit_idx = match self.suit {
            Suit::Clubs => 0,
            Suit::Diamonds => 1,
            Suit::Hearts => 2,
            Suit::Spades => 3,
        };
        suit_idx * 13 + (self.rank - TWO) as usize
    }

    pub fn from_index(idx: usize) -> Self {
        let suit = Suit::ALL[idx / 13];
        let rank = TWO + (idx % 13) as u8;
        Self { rank, suit }
    }
}

#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn standard_52() -> Self {
        let cards = (0..52).map(Card::from_index).collect();
        Self { cards }
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn deal_one(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn deal(&mut self, n: usize) -> Vec<Card> {
        let take = n.min(self.cards.len());
        self.cards.split_off(self.cards.len() - take)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::standard_52()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn card_index_round_trips() {
        for idx in 0..52 {
            let card = Card::from_index(idx);
            assert_eq!(card.index(), idx);
        }
    }

    #[test]
    fn standard_deck_has_52_unique_cards() {
        let deck = Deck::standard_52();
        let mut seen = std::collections::HashSet::new();
        assert_eq!(deck.remaining(), 52);
        for c in &deck.cards {
            assert!(seen.insert((c.rank, c.suit)));
        }
    }

    #[test]
    fn shuffle_preserves_card_count_and_deal_drains_it() {
        let mut deck = Deck::standard_52();
        let mut rng = StdRng::seed_from_u64(42);
        deck.shuffle(&mut rng);
        assert_eq!(deck.remaining(), 52);

        let hand = deck.deal(2);
        assert_eq!(hand.len(), 2);
        assert_eq!(deck.remaining(), 50);

        let board = deck.deal(5);
        assert_eq!(board.len(), 5);
        assert_eq!(deck.remaining(), 45);
    }
}
