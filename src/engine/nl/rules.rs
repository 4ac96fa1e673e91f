use super::errors::StateError;
use super::state::BettingState;
use super::types::{Chips, PlayerStatus, Pot, Pots, SeatId, Street};

pub struct RaiseBounds {
    pub min_raise_to: Chips,
    pub max_raise_to: Chips,
}

pub trait NoLimitRules {
    fn price_to_call(state: &BettingState, seat: SeatId) -> Chips;
    fn bet_to_bounds_unopened(
        state: &BettingState,
        seat: SeatId,
    ) -> Option<std::ops::RangeInclusive<Chips>>;
    fn raise_to_bounds_opened(
        state: &BettingState,
        seat: SeatId,
    ) -> Option<std::ops::RangeInclusive<Chips>>;
    fn is_full_raise(state: &BettingState, raise_amount: Chips) -> bool;
}

impl NoLimitRules for BettingState {
    fn price_to_call(state: &BettingState, seat: SeatId) -> Chips {
        let p = state
            .players
            .iter()
            .find(|p| p.seat == seat)
            .expect("seat present");
        if p.status != PlayerStatus::Active {
            return 0;
        }
        state
            .current_bet_to_match
            .saturating_sub(p.committed_this_round)
    }

    fn bet_to_bounds_unopened(
        state: &BettingState,
        seat: SeatId,
    ) -> Option<std::ops::RangeInclusive<Chips>> {
        if state.voluntary_bet_opened {
            return None;
        }
        let p = state.players.iter().find(|p| p.seat == seat)?;
        if p.status != PlayerStatus::Active {
            return None;
        }
        let min = state.cfg.stakes.big_blind.min(p.committed_this_round + p.stack);
        let max = p.committed_this_round + p.stack;
        if max == 0 {
            return None;
        }
        Some(min..=max)
    }

    fn raise_to_bounds_opened(
        state: &BettingState,
        seat: SeatId,
    ) -> Option<std::ops::RangeInclusive<Chips>> {
        // Preflop big blind may raise even without a voluntary bet yet (the blind is the opener).
        let is_bb_preflop_unopened = state.street == Street::Preflop
            && !state.voluntary_bet_opened
            && seat == state.cfg.big_blind_seat;
        if !state.voluntary_bet_opened && !is_bb_preflop_unopened {
            return None;
        }
        let p = state.players.iter().find(|p| p.seat == seat)?;
        if p.status != PlayerStatus::Active {
            return None;
        }
        if state.current_bet_to_match == 0 {
            return None;
        }
        let min = state
            .current_bet_to_match
            .saturating_add(state.last_full_raise_amount);
        let max = p.committed_this_round + p.stack;
        if max <= state.current_bet_to_match {
            return None;
        }
        Some(min.min(max)..=max)
    }

    fn is_full_raise(state: &BettingState, raise_amount: Chips) -> bool {
        raise_amount >= state.last_full_raise_amount && state.last_full_raise_amount > 0
            || (!state.voluntary_bet_opened && raise_amount > 0)
    }
}

impl BettingState {
    /// Builds side pots from every seat's total contribution, including folded
    /// seats' chips. Eligibility to win a pot still excludes folded seats, but
    /// the chips themselves stay in the pot they funded.
    pub fn compute_pots(&self) -> Result<Pots, StateError> {
        let contrib: Vec<(SeatId, Chips, PlayerStatus)> = self
            .players
            .iter()
            .map(|p| (p.seat, p.committed_total + p.committed_this_round, p.status))
            .collect();

        let total_on_table: Chips = contrib.iter().map(|(_, c, _)| *c).sum();
        if total_on_table == 0 {
            return Ok(Pots::default());
        }

        let mut thresholds: Vec<Chips> = contrib
            .iter()
            .filter(|(_, c, _)| *c > 0)
            .map(|(_, c, _)| *c)
            .collect();
        thresholds.sort_unstable();
        thresholds.dedup();

        let mut pots: Vec<Pot> = Vec::new();
        let mut prev_cap: Chips = 0;
        for cap in thresholds.iter().copied() {
            let tier = cap.saturating_sub(prev_cap);
            let amount: Chips = contrib
                .iter()
                .map(|(_, c, _)| (*c).saturating_sub(prev_cap).min(tier))
                .sum();

            let mut eligible: Vec<SeatId> = contrib
                .iter()
                .filter(|(_, c, s)| *s != PlayerStatus::Folded && *c >= cap)
                .map(|(sid, _, _)| *sid)
                .collect();
            eligible.sort_unstable();

            pots.push(Pot { amount, eligible });
            prev_cap = cap;
        }

        let main = pots.remove(0);
        Ok(Pots { main, sides: pots })
    }
}
