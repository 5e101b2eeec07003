//! Career error codes

use match_engine::MatchError;
use thiserror::Error;

use crate::activities::shop::Peripheral;

#[derive(Error, Debug)]
pub enum CareerError {
    #[error("Activities are not available on a match day")]
    MatchDay,

    #[error("No match is scheduled today")]
    NotMatchDay,

    #[error("No match has been started")]
    NoActiveMatch,

    #[error("Today's match has not been played to the end")]
    MatchInProgress,

    #[error("Today's match has already been played")]
    MatchAlreadyPlayed,

    #[error("The career is over")]
    CareerOver,

    #[error("Not enough money: need {needed}, have {available:.0}")]
    InsufficientFunds { needed: u32, available: f64 },

    #[error("{0} is already at its highest level")]
    Maxed(Peripheral),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error(transparent)]
    Match(#[from] MatchError),

    #[error("Invalid career config: {0}")]
    Config(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_errors_convert() {
        let err: CareerError = MatchError::MapNotActive(4).into();
        assert!(matches!(err, CareerError::Match(MatchError::MapNotActive(4))));
        assert_eq!(err.to_string(), "Map 4 is not the map currently being played");
    }

    #[test]
    fn test_messages() {
        let err = CareerError::InsufficientFunds { needed: 200, available: 149.6 };
        assert_eq!(err.to_string(), "Not enough money: need 200, have 150");
        assert_eq!(
            CareerError::Maxed(Peripheral::Pc).to_string(),
            "pc is already at its highest level"
        );
    }
}
