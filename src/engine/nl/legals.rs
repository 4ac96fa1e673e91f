use super::rules::NoLimitRules;
use super::state::BettingState;
use super::types::{Chips, PlayerStatus, SeatId, Street};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LegalActions {
    pub may_fold: bool,
    pub may_check: bool,
    pub call_amount: Option<Chips>,
    pub bet_to_range: Option<std::ops::RangeInclusive<Chips>>, // when unopened
    pub raise_to_range: Option<std::ops::RangeInclusive<Chips>>, // when opened
}

impl LegalActions {
    pub fn none() -> Self {
        Self::default()
    }
}

pub fn legal_actions_for(state: &BettingState, seat: SeatId) -> LegalActions {
    let Some(player) = state.players.iter().find(|p| p.seat == seat) else {
        return LegalActions::none();
    };
    if player.status != PlayerStatus::Active || state.betting_locked_all_in {
        return LegalActions::none();
    }
    if seat != state.to_act {
        return LegalActions::none();
    }

    let price = BettingState::price_to_call(state, seat);
    let mut legals = LegalActions {
        may_fold: true,
        may_check: price == 0,
        call_amount: Some(price),
        bet_to_range: None,
        raise_to_range: None,
    };

    if !state.voluntary_bet_opened {
        let is_bb_preflop_option =
            state.street == Street::Preflop && seat == state.cfg.big_blind_seat;
        if is_bb_preflop_option {
            legals.raise_to_range = BettingState::raise_to_bounds_opened(state, seat);
        } else {
            legals.bet_to_range = BettingState::bet_to_bounds_unopened(state, seat);
        }
    } else {
        legals.raise_to_range = BettingState::raise_to_bounds_opened(state, seat);
    }

    legals
}
