//! Tournament match engine
//!
//! Map pools, score simulation and the roll/ban/pick/mods/play state machine
//! for one tournament match against a generated opponent.
//! This crate is compiled to:
//! - Native (for the career layer and tests)
//! - WASM (for a browser frontend, behind the `wasm` feature)

mod attributes;
mod beatmap;
mod config;
mod error;
mod game;
mod pool;
mod random;
mod strategy;

#[cfg(feature = "wasm")]
mod wasm;

pub use attributes::{
    training_gain, AttributeKind, Attributes, Competitor, TrainedCounts, FIRST_TRAINING_GAIN,
    TRAINING_BASE_RATE, TRAINING_DECAY_RATE,
};
pub use beatmap::{
    individual_score, Beatmap, MapState, ModChoice, ModdedRatings, Mods, PoolType,
    ScoreBreakdown, BASE_MAX_SCORE,
};
pub use config::{PickOrder, RuleSet};
pub use error::{ErrorKind, MatchError};
pub use game::{Match, MatchSnapshot, Phase, RollResult, RoundResult, Side, Step};
pub use pool::{map_counts, MapPool};
pub use random::{RandomSource, SeededRng};
pub use strategy::{
    pool_affinity, strongest_pool, weakest_pool, HeuristicOpponent, OpponentStrategy,
    AFFINITY_ORDER,
};
