use serde::{Deserialize, Serialize};

use super::types::{Chips, SeatId, Street};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NormalizedAction {
    Fold,
    Check,
    Call {
        call_amount: Chips,
        full_call: bool,
    }, // full_call=false => short
    Bet {
        to: Chips,
    }, // first open
    Raise {
        to: Chips,
        raise_amount: Chips,
        full_raise: bool,
    },
    AllInAsCall {
        call_amount: Chips,
        full_call: bool,
    },
    AllInAsBet {
        to: Chips,
    },
    AllInAsRaise {
        to: Chips,
        raise_amount: Chips,
        full_raise: bool,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    HandStarted {
        button: SeatId,
        seats: Vec<SeatId>,
    },
    ActionApplied {
        seat: SeatId,
        action: NormalizedAction,
    },
    PotUpdated,
    StreetEnded {
        street: Street,
    },
    StreetDealt {
        street: Street,
        board: Vec<super::super::deck::Card>,
    },
    AllPlayersAllIn,
    TurnTimeout {
        seat: SeatId,
    },
    HandEndedByFolds {
        winner: SeatId,
        pots: super::types::Pots,
    },
    ShowdownReached,
    WinnersDetermined {
        pots: super::types::Pots,
        winners: Vec<SeatWin>,
    },
    HandSettled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatWin {
    pub seat: SeatId,
    pub amount: Chips,
}
