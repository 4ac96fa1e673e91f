use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("it is not this seat's turn to act")]
    NotPlayersTurn,
    #[error("seat cannot act in its current status")]
    ActorCannotAct,
    #[error("action is not legal in the current state")]
    IllegalAction,
    #[error("cannot check while facing a bet")]
    CannotCheckFacingBet,
    #[error("cannot bet into an already-opened pot")]
    CannotBetWhenOpened,
    #[error("call amount does not match the required price")]
    BadCallAmount,
    #[error("raise is below the minimum legal raise size")]
    RaiseBelowMinimum,
    #[error("seat does not have enough chips for this action")]
    InsufficientChips,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("street cannot advance from its current value")]
    InvalidTransition,
    #[error("state invariant violated: {0}")]
    InvariantViolation(&'static str),
}

pub trait InvariantCheck {
    fn validate_invariants(&self) -> Result<(), StateError>;
}
