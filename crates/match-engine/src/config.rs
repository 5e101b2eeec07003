//! Match rule presets

use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// Who picks after a round has been played
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickOrder {
    /// Picks alternate between the two sides
    Alternate,
    /// The side that won the previous round picks next
    WinnerPicks,
}

/// Rule variant a match is played under
///
/// A match keeps one `RuleSet` for its whole lifetime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub pick_order: PickOrder,
    /// Upper bound on per-side ban slots (`None` = uncapped)
    pub max_ban_slots: Option<u32>,
    /// Center of the opponent attribute multiplier
    pub opponent_center: f64,
    /// Half-width of the opponent attribute multiplier
    pub opponent_spread: f64,
    /// Maximum number of bonus units a play can earn
    pub bonus_units: u32,
    /// Points per bonus unit, before mod scaling
    pub bonus_unit_points: f64,
}

impl RuleSet {
    /// Largest accepted `bonus_units`
    pub const MAX_BONUS_UNITS: u32 = 1000;

    /// Current rules: alternating picks, ban slots capped at 2
    pub fn standard() -> Self {
        Self {
            pick_order: PickOrder::Alternate,
            max_ban_slots: Some(2),
            opponent_center: 1.2,
            opponent_spread: 0.2,
            bonus_units: 10,
            bonus_unit_points: 200.0,
        }
    }

    /// Earlier rules: round winner picks, uncapped ban slots, softer opponents
    pub fn legacy() -> Self {
        Self {
            pick_order: PickOrder::WinnerPicks,
            max_ban_slots: None,
            opponent_center: 1.0,
            ..Self::standard()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, MatchError> {
        let rules: RuleSet =
            serde_json::from_str(json).map_err(|e| MatchError::Config(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.max_ban_slots == Some(0) {
            return Err(MatchError::Config("max_ban_slots must be at least 1".into()));
        }
        if !(self.opponent_center > 0.0) {
            return Err(MatchError::Config("opponent_center must be positive".into()));
        }
        if !(0.0..self.opponent_center).contains(&self.opponent_spread) {
            return Err(MatchError::Config(
                "opponent_spread must be in [0, opponent_center)".into(),
            ));
        }
        if self.bonus_units > Self::MAX_BONUS_UNITS {
            return Err(MatchError::Config(format!(
                "bonus_units must be at most {}",
                Self::MAX_BONUS_UNITS
            )));
        }
        if !(self.bonus_unit_points >= 0.0) {
            return Err(MatchError::Config("bonus_unit_points must be non-negative".into()));
        }
        Ok(())
    }

    /// Integer difficulty level derived from a match's base difficulty
    pub fn diff_level(base_difficulty: f64) -> u32 {
        ((base_difficulty + 1.0) / 2.5).floor().max(0.0) as u32
    }

    /// Round wins needed to take the match
    pub fn rounds_to_win(diff_level: u32) -> u32 {
        4 + diff_level
    }

    /// Bans available to each side
    pub fn ban_slots(&self, diff_level: u32) -> u32 {
        let slots = 1 + diff_level / 2;
        match self.max_ban_slots {
            Some(cap) => slots.min(cap),
            None => slots,
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::standard()
    }
}
