//! Beatmaps, mods and score simulation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::attributes::Competitor;
use crate::error::MatchError;
use crate::game::Side;
use crate::random::RandomSource;

/// Unmodded max score of every map
pub const BASE_MAX_SCORE: f64 = 1_000_000.0;

/// Ratio above which a sub-score saturates at 1.0
const RATIO_CEILING: f64 = 1.25;
/// Sub-score at exactly ratio 1.0
const PASS_SCORE: f64 = 0.8;
/// Weights applied to the sorted sub-scores, lowest first
const WEAKEST_LINK_WEIGHTS: [f64; 3] = [0.5, 0.3, 0.2];

/// Map pool category. Decides which mods are forced on a map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PoolType {
    #[serde(rename = "NM")]
    NoMod,
    #[serde(rename = "HR")]
    HardRock,
    #[serde(rename = "DT")]
    DoubleTime,
    #[serde(rename = "HD")]
    Hidden,
    #[serde(rename = "FM")]
    FreeMod,
    #[serde(rename = "EZ")]
    Easy,
    #[serde(rename = "TB")]
    TieBreak,
}

impl PoolType {
    /// Pools in generation (and map id) order
    pub const ALL: [PoolType; 7] = [
        PoolType::NoMod,
        PoolType::HardRock,
        PoolType::DoubleTime,
        PoolType::Hidden,
        PoolType::FreeMod,
        PoolType::Easy,
        PoolType::TieBreak,
    ];

    pub fn index(self) -> usize {
        match self {
            PoolType::NoMod => 0,
            PoolType::HardRock => 1,
            PoolType::DoubleTime => 2,
            PoolType::Hidden => 3,
            PoolType::FreeMod => 4,
            PoolType::Easy => 5,
            PoolType::TieBreak => 6,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PoolType::NoMod => "NM",
            PoolType::HardRock => "HR",
            PoolType::DoubleTime => "DT",
            PoolType::Hidden => "HD",
            PoolType::FreeMod => "FM",
            PoolType::Easy => "EZ",
            PoolType::TieBreak => "TB",
        }
    }

    /// Mods every play on this pool must use
    pub fn forced_mods(self) -> Mods {
        match self {
            PoolType::HardRock => Mods { hr: true, ..Mods::NONE },
            PoolType::DoubleTime => Mods { dt: true, ..Mods::NONE },
            PoolType::Hidden => Mods { hd: true, ..Mods::NONE },
            PoolType::Easy => Mods { ez: true, ..Mods::NONE },
            PoolType::NoMod | PoolType::FreeMod | PoolType::TieBreak => Mods::NONE,
        }
    }

    /// Free Mod and Tie-Break let each side opt into HR and HD
    pub fn allows_free_mods(self) -> bool {
        matches!(self, PoolType::FreeMod | PoolType::TieBreak)
    }

    pub fn is_tie_break(self) -> bool {
        self == PoolType::TieBreak
    }

    /// Final mods for a request of optional HR/HD on this pool
    pub fn resolve_mods(self, choice: ModChoice) -> Mods {
        if self.allows_free_mods() {
            Mods { hr: choice.hr, hd: choice.hd, ..Mods::NONE }
        } else {
            self.forced_mods()
        }
    }
}

impl fmt::Display for PoolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active mods on one play
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mods {
    pub hr: bool,
    pub dt: bool,
    pub hd: bool,
    pub ez: bool,
}

impl Mods {
    pub const NONE: Mods = Mods { hr: false, dt: false, hd: false, ez: false };

    /// Hard Rock and Easy are mutually exclusive
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.hr && self.ez {
            return Err(MatchError::IncompatibleMods);
        }
        Ok(())
    }
}

impl fmt::Display for Mods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut any = false;
        for (on, name) in [(self.ez, "EZ"), (self.hd, "HD"), (self.hr, "HR"), (self.dt, "DT")] {
            if on {
                f.write_str(name)?;
                any = true;
            }
        }
        if !any {
            f.write_str("NM")?;
        }
        Ok(())
    }
}

/// Optional mods a side asks for on a Free Mod or Tie-Break map
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModChoice {
    pub hr: bool,
    pub hd: bool,
}

/// Map ratings after mod multipliers
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModdedRatings {
    pub aim: f64,
    pub spd: f64,
    pub acc: f64,
    pub max_score: f64,
}

/// Deterministic part of a simulated play
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub aim_score: f64,
    pub spd_score: f64,
    pub acc_score: f64,
    /// Multiplier applied to the competitor's play skills
    pub adjustment: f64,
    /// Weighted sub-scores times modded max score
    pub weighted: f64,
    pub max_score: f64,
}

/// Ban/pick state of a map. Banned and picked cannot both hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapState {
    Available,
    Banned { by: Side },
    /// `by` is `None` for the auto-selected tie-break map
    Picked { by: Option<Side>, playing: bool },
}

/// One map in a match's pool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Beatmap {
    pub id: u32,
    pub pool: PoolType,
    pub aim_rating: f64,
    pub spd_rating: f64,
    pub acc_rating: f64,
    /// Always >= 1
    pub maxcombo_rating: f64,
    pub max_score: f64,
    pub bonus_units: u32,
    pub bonus_unit_points: f64,
    state: MapState,
    player_mods: Option<Mods>,
    opponent_mods: Option<Mods>,
}

impl Beatmap {
    /// Map with explicit ratings, mostly useful for previews and tests
    pub fn new(id: u32, pool: PoolType, aim: f64, spd: f64, acc: f64, maxcombo: f64) -> Self {
        Self {
            id,
            pool,
            aim_rating: aim.max(0.0),
            spd_rating: spd.max(0.0),
            acc_rating: acc.max(0.0),
            maxcombo_rating: maxcombo.max(1.0),
            max_score: BASE_MAX_SCORE,
            bonus_units: 10,
            bonus_unit_points: 200.0,
            state: MapState::Available,
            player_mods: None,
            opponent_mods: None,
        }
    }

    /// Randomize ratings around `base_difficulty` using the pool's spread
    ///
    /// - NM: `base + [0, 1)`, a touch harder than the base
    /// - TB: `base + [0, 2)`, combo another +3
    /// - everything else: `base ± 2`
    pub fn generate(
        id: u32,
        base_difficulty: f64,
        pool: PoolType,
        rng: &mut dyn RandomSource,
    ) -> Self {
        let (low, high, combo_offset) = match pool {
            PoolType::NoMod => (0.0, 1.0, 0.0),
            PoolType::TieBreak => (0.0, 2.0, 3.0),
            _ => (-2.0, 2.0, 0.0),
        };
        let mut rating = || base_difficulty + rng.uniform(low, high);

        let aim = rating();
        let spd = rating();
        let acc = rating();
        let maxcombo = rating() + combo_offset;
        Self::new(id, pool, aim, spd, acc, maxcombo)
    }

    pub fn with_bonus(mut self, units: u32, unit_points: f64) -> Self {
        self.bonus_units = units;
        self.bonus_unit_points = unit_points;
        self
    }

    /// Apply mod multipliers to the base ratings
    pub fn ratings_with_mods(&self, mods: Mods) -> Result<ModdedRatings, MatchError> {
        mods.validate()?;

        let mut r = ModdedRatings {
            aim: self.aim_rating,
            spd: self.spd_rating,
            acc: self.acc_rating,
            max_score: self.max_score,
        };
        if mods.hr {
            r.aim *= 1.4;
            r.acc *= 1.2;
            r.max_score *= 1.06;
        }
        if mods.dt {
            r.spd *= 1.5;
            r.max_score *= 1.12;
        }
        if mods.hd {
            r.max_score *= 1.06;
        }
        if mods.ez {
            r.aim *= 0.5;
            r.acc *= 1.5;
            r.max_score *= 0.5;
        }
        Ok(r)
    }

    /// Ratings with the pool's forced mods, as shown in a map listing
    pub fn display_ratings(&self) -> ModdedRatings {
        // forced mods never combine HR with EZ
        self.ratings_with_mods(self.pool.forced_mods()).unwrap_or(ModdedRatings {
            aim: self.aim_rating,
            spd: self.spd_rating,
            acc: self.acc_rating,
            max_score: self.max_score,
        })
    }

    /// Score before the random bonus
    pub fn score_breakdown(
        &self,
        competitor: &Competitor,
        mods: Mods,
    ) -> Result<ScoreBreakdown, MatchError> {
        let ratings = self.ratings_with_mods(mods)?;
        let attrs = &competitor.attributes;

        let mut adj = 1.0;
        if attrs.men < self.maxcombo_rating && self.maxcombo_rating > 0.0 {
            adj = (attrs.men / self.maxcombo_rating).max(0.0);
        }
        // EZ and HD change how the map reads, so familiarity matters
        if mods.ez {
            adj *= 1.1f64.powf(attrs.prf_ez);
        }
        if mods.hd {
            adj *= 1.1f64.powf(attrs.prf_hd);
        }
        adj *= (1.0 - competitor.fatigue / 300.0).max(0.01);

        let aim_score = individual_score(attrs.aim * adj, ratings.aim);
        let spd_score = individual_score(attrs.spd * adj, ratings.spd);
        let acc_score = individual_score(attrs.acc * adj, ratings.acc);

        let mut sorted = [aim_score, spd_score, acc_score];
        sorted.sort_by(|a, b| a.total_cmp(b));
        let weighted: f64 = sorted
            .iter()
            .zip(WEAKEST_LINK_WEIGHTS)
            .map(|(score, weight)| score * weight)
            .sum::<f64>()
            * ratings.max_score;

        Ok(ScoreBreakdown {
            aim_score,
            spd_score,
            acc_score,
            adjustment: adj,
            weighted,
            max_score: ratings.max_score,
        })
    }

    /// Random bonus for one play, scaled by the mod max-score multiplier
    pub fn bonus_score(&self, mods: Mods, rng: &mut dyn RandomSource) -> Result<f64, MatchError> {
        let ratings = self.ratings_with_mods(mods)?;
        let units = rng.next_range(self.bonus_units.saturating_add(1));
        let scale = if self.max_score > 0.0 { ratings.max_score / self.max_score } else { 0.0 };
        Ok(units as f64 * self.bonus_unit_points * scale)
    }

    /// Simulate one play of this map
    pub fn simulate_score(
        &self,
        competitor: &Competitor,
        mods: Mods,
        rng: &mut dyn RandomSource,
    ) -> Result<f64, MatchError> {
        let breakdown = self.score_breakdown(competitor, mods)?;
        let bonus = self.bonus_score(mods, rng)?;
        Ok(breakdown.weighted + bonus)
    }

    pub fn state(&self) -> MapState {
        self.state
    }

    pub fn is_available(&self) -> bool {
        self.state == MapState::Available
    }

    pub fn is_banned(&self) -> bool {
        matches!(self.state, MapState::Banned { .. })
    }

    pub fn is_picked(&self) -> bool {
        matches!(self.state, MapState::Picked { .. })
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, MapState::Picked { playing: true, .. })
    }

    pub fn banned_by(&self) -> Option<Side> {
        match self.state {
            MapState::Banned { by } => Some(by),
            _ => None,
        }
    }

    pub fn picked_by(&self) -> Option<Side> {
        match self.state {
            MapState::Picked { by, .. } => by,
            _ => None,
        }
    }

    pub fn player_mods(&self) -> Option<Mods> {
        self.player_mods
    }

    pub fn opponent_mods(&self) -> Option<Mods> {
        self.opponent_mods
    }

    pub fn mods_for(&self, side: Side) -> Option<Mods> {
        match side {
            Side::Player => self.player_mods,
            Side::Opponent => self.opponent_mods,
        }
    }

    pub(crate) fn mark_banned(&mut self, by: Side) -> Result<(), MatchError> {
        if self.pool.is_tie_break() {
            return Err(MatchError::TieBreakProtected(self.id));
        }
        if !self.is_available() {
            return Err(MatchError::MapUnavailable(self.id));
        }
        self.state = MapState::Banned { by };
        Ok(())
    }

    pub(crate) fn mark_picked(&mut self, by: Option<Side>) -> Result<(), MatchError> {
        if !self.is_available() {
            return Err(MatchError::MapUnavailable(self.id));
        }
        self.state = MapState::Picked { by, playing: true };
        Ok(())
    }

    pub(crate) fn finish_playing(&mut self) {
        if let MapState::Picked { by, .. } = self.state {
            self.state = MapState::Picked { by, playing: false };
        }
    }

    pub(crate) fn set_mods(&mut self, side: Side, mods: Mods) {
        match side {
            Side::Player => self.player_mods = Some(mods),
            Side::Opponent => self.opponent_mods = Some(mods),
        }
    }
}

/// Sub-score for one skill dimension, in [0, 1]
///
/// At or above the rating the score maps linearly from 0.8 (ratio 1.0) to
/// 1.0 (ratio 1.25). Below it the score falls off quadratically.
pub fn individual_score(attr: f64, rating: f64) -> f64 {
    if rating <= 0.0 {
        return 1.0;
    }
    let ratio = attr / rating;
    if ratio >= RATIO_CEILING {
        1.0
    } else if ratio >= 1.0 {
        let progress = (ratio - 1.0) / (RATIO_CEILING - 1.0);
        PASS_SCORE + (1.0 - PASS_SCORE) * progress
    } else {
        PASS_SCORE * ratio * ratio
    }
}
