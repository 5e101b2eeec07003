//! Match engine error codes

use thiserror::Error;

use crate::game::Phase;

/// Coarse classification of a [`MatchError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation invoked in the wrong phase or on the wrong turn
    InvalidState,
    /// Operation referenced a map that does not exist or cannot be used
    InvalidArgument,
    /// Turn accounting or pool generation went wrong; the match is aborted
    Invariant,
    /// Hard-Rock and Easy requested together
    IncompatibleMods,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatchError {
    #[error("Action belongs to the {expected:?} phase, match is in {actual:?}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("It is not the player's turn in the {phase:?} phase")]
    NotYourTurn { phase: Phase },

    #[error("Tie-break is active, the tie-break map is selected automatically")]
    TieBreakForced,

    #[error("Match has already finished")]
    MatchFinished,

    #[error("Match was aborted after an internal error")]
    MatchAborted,

    #[error("No map with id {0}")]
    UnknownMap(u32),

    #[error("Map {0} is already banned or picked")]
    MapUnavailable(u32),

    #[error("Map {0} is the tie-break map and cannot be banned or picked")]
    TieBreakProtected(u32),

    #[error("Map {0} is not the map currently being played")]
    MapNotActive(u32),

    #[error("Ban slots already exhausted")]
    BanSlotsExhausted,

    #[error("No map left to choose in the {phase:?} phase")]
    NoMapAvailable { phase: Phase },

    #[error("No map is currently being played")]
    NoActiveMap,

    #[error("Opponent strategy chose illegal map {0}")]
    IllegalOpponentChoice(u32),

    #[error("Hard Rock and Easy cannot be enabled together")]
    IncompatibleMods,

    #[error("Invalid rule set: {0}")]
    Config(String),
}

impl MatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MatchError::WrongPhase { .. }
            | MatchError::NotYourTurn { .. }
            | MatchError::TieBreakForced
            | MatchError::MatchFinished
            | MatchError::MatchAborted => ErrorKind::InvalidState,
            MatchError::UnknownMap(_)
            | MatchError::MapUnavailable(_)
            | MatchError::TieBreakProtected(_)
            | MatchError::MapNotActive(_)
            | MatchError::Config(_) => ErrorKind::InvalidArgument,
            MatchError::BanSlotsExhausted
            | MatchError::NoMapAvailable { .. }
            | MatchError::NoActiveMap
            | MatchError::IllegalOpponentChoice(_) => ErrorKind::Invariant,
            MatchError::IncompatibleMods => ErrorKind::IncompatibleMods,
        }
    }

    /// Fatal errors abort the match they were raised in
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Invariant
    }
}
