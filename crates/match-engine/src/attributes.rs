//! Competitor attributes, training growth and opponent generation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::RuleSet;
use crate::random::RandomSource;

/// Gain from the very first training of an attribute
pub const FIRST_TRAINING_GAIN: f64 = 1.0;
/// Base gain for repeated training
pub const TRAINING_BASE_RATE: f64 = 0.6;
/// Per-repeat decay of repeated training
pub const TRAINING_DECAY_RATE: f64 = 0.85;

/// One trainable attribute
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Cursor precision, compared with a map's circle size
    Aim,
    /// Tapping speed, compared with a map's BPM
    Spd,
    /// Timing accuracy, compared with a map's overall difficulty
    Acc,
    /// Mental stability, compared with a map's max combo
    Men,
    /// Easy mod proficiency
    PrfEz,
    /// Hidden mod proficiency
    PrfHd,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 6] = [
        AttributeKind::Aim,
        AttributeKind::Spd,
        AttributeKind::Acc,
        AttributeKind::Men,
        AttributeKind::PrfEz,
        AttributeKind::PrfHd,
    ];

    pub fn index(self) -> usize {
        match self {
            AttributeKind::Aim => 0,
            AttributeKind::Spd => 1,
            AttributeKind::Acc => 2,
            AttributeKind::Men => 3,
            AttributeKind::PrfEz => 4,
            AttributeKind::PrfHd => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeKind::Aim => "aim",
            AttributeKind::Spd => "spd",
            AttributeKind::Acc => "acc",
            AttributeKind::Men => "men",
            AttributeKind::PrfEz => "ez",
            AttributeKind::PrfHd => "hd",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aim" => Ok(AttributeKind::Aim),
            "spd" => Ok(AttributeKind::Spd),
            "acc" => Ok(AttributeKind::Acc),
            "men" => Ok(AttributeKind::Men),
            "ez" | "prf_ez" => Ok(AttributeKind::PrfEz),
            "hd" | "prf_hd" => Ok(AttributeKind::PrfHd),
            other => Err(format!("Unknown attribute: {}", other)),
        }
    }
}

/// Skill attributes of a player or opponent
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub aim: f64,
    pub spd: f64,
    pub acc: f64,
    pub men: f64,
    pub prf_ez: f64,
    pub prf_hd: f64,
}

impl Default for Attributes {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

impl Attributes {
    /// All six attributes set to `value`
    pub fn uniform(value: f64) -> Self {
        Self {
            aim: value,
            spd: value,
            acc: value,
            men: value,
            prf_ez: value,
            prf_hd: value,
        }
    }

    pub fn get(&self, kind: AttributeKind) -> f64 {
        match kind {
            AttributeKind::Aim => self.aim,
            AttributeKind::Spd => self.spd,
            AttributeKind::Acc => self.acc,
            AttributeKind::Men => self.men,
            AttributeKind::PrfEz => self.prf_ez,
            AttributeKind::PrfHd => self.prf_hd,
        }
    }

    pub fn get_mut(&mut self, kind: AttributeKind) -> &mut f64 {
        match kind {
            AttributeKind::Aim => &mut self.aim,
            AttributeKind::Spd => &mut self.spd,
            AttributeKind::Acc => &mut self.acc,
            AttributeKind::Men => &mut self.men,
            AttributeKind::PrfEz => &mut self.prf_ez,
            AttributeKind::PrfHd => &mut self.prf_hd,
        }
    }

    pub fn scale_all(&mut self, factor: f64) {
        for kind in AttributeKind::ALL {
            *self.get_mut(kind) *= factor;
        }
    }

    /// Overall level used by the webcast payout: mean of the play skills and
    /// mod proficiencies, rounded down. Mental is not included.
    pub fn level(&self) -> u32 {
        let mean = (self.aim + self.spd + self.acc + self.prf_ez + self.prf_hd) / 5.0;
        mean.floor().max(0.0) as u32
    }
}

/// How many times each attribute has been trained
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainedCounts {
    counts: [u32; 6],
}

impl TrainedCounts {
    pub fn get(&self, kind: AttributeKind) -> u32 {
        self.counts[kind.index()]
    }

    pub fn increment(&mut self, kind: AttributeKind) {
        self.counts[kind.index()] += 1;
    }
}

/// Diminishing-returns growth for one training action
///
/// The first training of an attribute yields [`FIRST_TRAINING_GAIN`], later
/// ones `0.6 * 0.85^n`, all scaled by the peripheral bonus.
pub fn training_gain(trained_count: u32, peripheral_bonus: f64) -> f64 {
    let base = if trained_count == 0 {
        FIRST_TRAINING_GAIN
    } else {
        TRAINING_BASE_RATE * TRAINING_DECAY_RATE.powi(trained_count as i32)
    };
    base * peripheral_bonus
}

/// Everything score simulation needs to know about one side
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub attributes: Attributes,
    /// Accumulated fatigue, 0 = fully rested
    pub fatigue: f64,
}

impl Competitor {
    pub fn new(attributes: Attributes, fatigue: f64) -> Self {
        Self { attributes, fatigue }
    }

    /// Generate a fresh opponent around `base_difficulty`
    ///
    /// Play attributes land in `base * (center ± spread)`, mod proficiencies in
    /// `base - 1 + [0, 2)` floored at 1. A specialization draw then boosts
    /// one attribute by 50% (6 in 8), all attributes by 10% (1 in 8), or
    /// nothing (1 in 8).
    pub fn generate_opponent(
        base_difficulty: f64,
        rules: &RuleSet,
        rng: &mut dyn RandomSource,
    ) -> Self {
        let center = rules.opponent_center;
        let spread = rules.opponent_spread;
        let mut play_stat = || base_difficulty * rng.uniform(center - spread, center + spread);

        let mut attributes = Attributes {
            aim: play_stat(),
            spd: play_stat(),
            acc: play_stat(),
            men: play_stat(),
            prf_ez: 1.0,
            prf_hd: 1.0,
        };
        attributes.prf_ez = (base_difficulty - 1.0 + rng.uniform(0.0, 2.0)).max(1.0);
        attributes.prf_hd = (base_difficulty - 1.0 + rng.uniform(0.0, 2.0)).max(1.0);

        match rng.next_range(8) as usize {
            k @ 0..=5 => *attributes.get_mut(AttributeKind::ALL[k]) *= 1.5,
            6 => attributes.scale_all(1.1),
            _ => {}
        }

        // negative base difficulty would otherwise leak negative skills
        for kind in AttributeKind::ALL {
            let value = attributes.get_mut(kind);
            *value = value.max(0.0);
        }

        let fatigue = rng.uniform(0.0, 30.0);
        Self { attributes, fatigue }
    }
}
