//! Paid activities and rest

use match_engine::{AttributeKind, Attributes, RandomSource};
use serde::{Deserialize, Serialize};

use crate::state::{Player, TimeSlot, REST_RECOVERY, WEBCAST_FATIGUE, WORK_FATIGUE};

/// Upper bound (exclusive) of each random webcast attribute gain, before
/// the peripheral bonus
const WEBCAST_MAX_GAIN: f64 = 0.1;

/// Efficiency multiplier for paid activities at a fatigue level
pub fn fatigue_penalty(fatigue: f64) -> f64 {
    if fatigue <= 50.0 {
        1.0
    } else if fatigue <= 80.0 {
        0.8
    } else {
        0.5
    }
}

/// Money and attribute gains from one webcast
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebcastResult {
    pub money: f64,
    pub gains: Attributes,
}

impl Player {
    /// Work a shift. The wage grows every five shifts; evening shifts pay 50% more.
    pub fn work(&mut self, slot: TimeSlot) -> f64 {
        let penalty = fatigue_penalty(self.fatigue);
        let mut gain = (50.0 + 25.0 * (self.work_count / 5) as f64) * penalty;
        if slot.is_evening() {
            gain *= 1.5;
        }
        self.fatigue += WORK_FATIGUE;
        self.money += gain;
        self.work_count += 1;
        gain
    }

    /// Stream for an audience: pays by overall level (double in the evening)
    /// and nudges every attribute up a little
    pub fn webcast(&mut self, slot: TimeSlot, rng: &mut dyn RandomSource) -> WebcastResult {
        let penalty = fatigue_penalty(self.fatigue);
        let level = self.attributes.level();
        let mut money = (10.0 + 5.0 * (level / 2) as f64) * penalty;
        if slot.is_evening() {
            money *= 2.0;
        }
        self.money += money;

        let bonus = self.peripheral_bonus();
        let mut gains = Attributes::uniform(0.0);
        for kind in AttributeKind::ALL {
            let gain = rng.uniform(0.0, WEBCAST_MAX_GAIN) * bonus;
            *gains.get_mut(kind) = gain;
            *self.attributes.get_mut(kind) += gain;
        }

        self.fatigue += WEBCAST_FATIGUE;
        WebcastResult { money, gains }
    }

    /// Rest and return how much fatigue was actually removed
    pub fn rest(&mut self) -> f64 {
        let before = self.fatigue;
        self.fatigue = (self.fatigue - REST_RECOVERY).max(0.0);
        before - self.fatigue
    }
}
