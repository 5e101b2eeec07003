//! Opponent decision strategies

use crate::attributes::{Attributes, Competitor};
use crate::beatmap::{Beatmap, Mods, PoolType};
use crate::pool::MapPool;
use crate::random::RandomSource;

/// HD proficiency above which an opponent opts into Hidden on free-mod maps
const HIDDEN_PROFICIENCY_THRESHOLD: f64 = 1.5;
/// Aim margin over a map's base aim rating needed before opting into Hard Rock
const HARD_ROCK_AIM_MARGIN: f64 = 1.5;

/// Pools an opponent scores when deciding what to ban or pick, in the order
/// ties are resolved (first one wins)
pub const AFFINITY_ORDER: [PoolType; 6] = [
    PoolType::HardRock,
    PoolType::DoubleTime,
    PoolType::Easy,
    PoolType::Hidden,
    PoolType::NoMod,
    PoolType::FreeMod,
];

/// How well a competitor's attributes suit a pool. `None` for Tie-Break,
/// which is never banned or picked voluntarily.
pub fn pool_affinity(attrs: &Attributes, pool: PoolType) -> Option<f64> {
    let Attributes { aim, spd, acc, prf_ez, prf_hd, .. } = *attrs;
    let score = match pool {
        PoolType::HardRock => aim,
        PoolType::DoubleTime => spd,
        PoolType::Easy => (acc + prf_ez * 3.0) / 4.0,
        PoolType::Hidden => (aim + spd + acc + prf_hd * 9.0) / 12.0,
        PoolType::NoMod => (aim + spd + acc) / 3.0,
        PoolType::FreeMod => (aim + spd + acc + prf_ez * 3.0 + prf_hd * 3.0) / 9.0,
        PoolType::TieBreak => return None,
    };
    Some(score)
}

/// Pool the competitor is worst at
pub fn weakest_pool(attrs: &Attributes) -> PoolType {
    let mut weakest = PoolType::NoMod;
    let mut min_score = f64::INFINITY;
    for pool in AFFINITY_ORDER {
        if let Some(score) = pool_affinity(attrs, pool) {
            if score < min_score {
                min_score = score;
                weakest = pool;
            }
        }
    }
    weakest
}

/// Pool the competitor is best at
pub fn strongest_pool(attrs: &Attributes) -> PoolType {
    let mut strongest = PoolType::NoMod;
    let mut max_score = f64::NEG_INFINITY;
    for pool in AFFINITY_ORDER {
        if let Some(score) = pool_affinity(attrs, pool) {
            if score > max_score {
                max_score = score;
                strongest = pool;
            }
        }
    }
    strongest
}

/// Decisions the opponent makes during a match
///
/// `choose_ban` and `choose_pick` return a map id; the match rejects ids
/// that are not available non-tie-break maps.
pub trait OpponentStrategy {
    fn choose_ban(
        &mut self,
        me: &Competitor,
        maps: &MapPool,
        rng: &mut dyn RandomSource,
    ) -> Option<u32>;

    fn choose_pick(
        &mut self,
        me: &Competitor,
        maps: &MapPool,
        rng: &mut dyn RandomSource,
    ) -> Option<u32>;

    /// Mods for the map being played. Forced pool mods are applied by the
    /// match on top of whatever this returns.
    fn choose_mods(&mut self, me: &Competitor, map: &Beatmap) -> Mods;
}

impl<S: OpponentStrategy + ?Sized> OpponentStrategy for Box<S> {
    fn choose_ban(
        &mut self,
        me: &Competitor,
        maps: &MapPool,
        rng: &mut dyn RandomSource,
    ) -> Option<u32> {
        (**self).choose_ban(me, maps, rng)
    }

    fn choose_pick(
        &mut self,
        me: &Competitor,
        maps: &MapPool,
        rng: &mut dyn RandomSource,
    ) -> Option<u32> {
        (**self).choose_pick(me, maps, rng)
    }

    fn choose_mods(&mut self, me: &Competitor, map: &Beatmap) -> Mods {
        (**self).choose_mods(me, map)
    }
}

/// Default opponent: bans from its weakest pool, picks from its strongest
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicOpponent;

impl HeuristicOpponent {
    fn random_in(
        maps: &MapPool,
        target: PoolType,
        rng: &mut dyn RandomSource,
    ) -> Option<u32> {
        let mut candidates: Vec<&Beatmap> = maps.available_in(target).collect();
        if candidates.is_empty() {
            // target pool exhausted: fall back to anything still open
            candidates = maps.available(false).collect();
        }
        if candidates.is_empty() {
            return None;
        }
        let index = rng.next_range(candidates.len() as u32) as usize;
        Some(candidates[index].id)
    }
}

impl OpponentStrategy for HeuristicOpponent {
    fn choose_ban(
        &mut self,
        me: &Competitor,
        maps: &MapPool,
        rng: &mut dyn RandomSource,
    ) -> Option<u32> {
        Self::random_in(maps, weakest_pool(&me.attributes), rng)
    }

    fn choose_pick(
        &mut self,
        me: &Competitor,
        maps: &MapPool,
        rng: &mut dyn RandomSource,
    ) -> Option<u32> {
        Self::random_in(maps, strongest_pool(&me.attributes), rng)
    }

    fn choose_mods(&mut self, me: &Competitor, map: &Beatmap) -> Mods {
        if !map.pool.allows_free_mods() {
            return map.pool.forced_mods();
        }
        Mods {
            hr: me.attributes.aim > map.aim_rating * HARD_ROCK_AIM_MARGIN,
            hd: me.attributes.prf_hd > HIDDEN_PROFICIENCY_THRESHOLD,
            ..Mods::NONE
        }
    }
}
