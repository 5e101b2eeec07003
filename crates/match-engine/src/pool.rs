//! Map pool generation and lookup
//!
//! Pools live in a fixed table indexed by [`PoolType`]. Map ids run from 1
//! across the pools in NM, HR, DT, HD, FM, EZ, TB order.

use serde::{Deserialize, Serialize};

use crate::beatmap::{Beatmap, PoolType};
use crate::random::RandomSource;

/// Number of maps in each pool at a given difficulty level, indexed like
/// [`PoolType::ALL`]
pub fn map_counts(diff_level: u32) -> [usize; 7] {
    let d = diff_level as f64;
    [
        3 + (d / 1.5).ceil() as usize,
        2 + (d / 2.0).floor() as usize,
        2 + (d / 2.0).floor() as usize,
        2 + (d / 2.0).round() as usize,
        1 + (d / 1.5).ceil() as usize,
        1 + (d / 2.0).floor() as usize,
        1,
    ]
}

/// All maps of one match, grouped by pool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapPool {
    pools: [Vec<Beatmap>; 7],
}

impl MapPool {
    /// Generate every pool for a match
    pub fn generate(
        base_difficulty: f64,
        diff_level: u32,
        bonus_units: u32,
        bonus_unit_points: f64,
        rng: &mut dyn RandomSource,
    ) -> Self {
        let counts = map_counts(diff_level);
        let mut pools: [Vec<Beatmap>; 7] = Default::default();
        let mut next_id = 1u32;

        for pool_type in PoolType::ALL {
            let count = counts[pool_type.index()];
            let pool = &mut pools[pool_type.index()];
            pool.reserve(count);
            for _ in 0..count {
                let map = Beatmap::generate(next_id, base_difficulty, pool_type, rng)
                    .with_bonus(bonus_units, bonus_unit_points);
                pool.push(map);
                next_id += 1;
            }
        }

        Self { pools }
    }

    /// Build a pool table from explicit maps, grouping them by their pool
    pub fn from_maps(maps: Vec<Beatmap>) -> Self {
        let mut pools: [Vec<Beatmap>; 7] = Default::default();
        for map in maps {
            pools[map.pool.index()].push(map);
        }
        Self { pools }
    }

    pub fn pool(&self, pool_type: PoolType) -> &[Beatmap] {
        &self.pools[pool_type.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Beatmap> {
        self.pools.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.pools.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: u32) -> Option<&Beatmap> {
        self.iter().find(|m| m.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: u32) -> Option<&mut Beatmap> {
        self.pools.iter_mut().flatten().find(|m| m.id == id)
    }

    /// Maps that are neither banned nor picked
    pub fn available(&self, include_tie_break: bool) -> impl Iterator<Item = &Beatmap> {
        self.iter()
            .filter(move |m| m.is_available() && (include_tie_break || !m.pool.is_tie_break()))
    }

    pub fn available_in(&self, pool_type: PoolType) -> impl Iterator<Item = &Beatmap> {
        self.pool(pool_type).iter().filter(|m| m.is_available())
    }

    /// The tie-break map, if it has not been played yet
    pub fn tie_break_map(&self) -> Option<&Beatmap> {
        self.available_in(PoolType::TieBreak).next()
    }
}
