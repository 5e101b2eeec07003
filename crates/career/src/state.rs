//! Player state and schedule definitions

use match_engine::{Attributes, Competitor, RuleSet, TrainedCounts};
use serde::{Deserialize, Serialize};

use crate::activities::shop::{Peripheral, Shop};
use crate::error::CareerError;

/// Fatigue added by one training session
pub const TRAIN_FATIGUE: f64 = 10.0;
/// Fatigue added by a work shift
pub const WORK_FATIGUE: f64 = 30.0;
/// Fatigue added by a webcast
pub const WEBCAST_FATIGUE: f64 = 15.0;
/// Fatigue removed by resting
pub const REST_RECOVERY: f64 = 50.0;

/// Training points granted each time the player goes training
pub const TRAINING_POINTS_PER_SESSION: u32 = 2;

/// Part of the day an activity happens in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
}

impl TimeSlot {
    /// Following slot on the same day, `None` after the evening
    pub fn next(self) -> Option<TimeSlot> {
        match self {
            TimeSlot::Morning => Some(TimeSlot::Afternoon),
            TimeSlot::Afternoon => Some(TimeSlot::Evening),
            TimeSlot::Evening => None,
        }
    }

    pub fn is_evening(self) -> bool {
        self == TimeSlot::Evening
    }
}

/// Equipment levels, all starting at 1
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peripherals {
    pub keyboard: u32,
    pub monitor: u32,
    pub pc: u32,
}

impl Default for Peripherals {
    fn default() -> Self {
        Self { keyboard: 1, monitor: 1, pc: 1 }
    }
}

impl Peripherals {
    pub fn level(&self, peripheral: Peripheral) -> u32 {
        match peripheral {
            Peripheral::Keyboard => self.keyboard,
            Peripheral::Monitor => self.monitor,
            Peripheral::Pc => self.pc,
        }
    }

    pub(crate) fn level_mut(&mut self, peripheral: Peripheral) -> &mut u32 {
        match peripheral {
            Peripheral::Keyboard => &mut self.keyboard,
            Peripheral::Monitor => &mut self.monitor,
            Peripheral::Pc => &mut self.pc,
        }
    }

    /// Multiplier on every attribute gain: +30% per keyboard level, +20% per
    /// monitor level, +10% per pc level above the first
    pub fn bonus(&self) -> f64 {
        1.0 + 0.3 * (self.keyboard as f64 - 1.0)
            + 0.2 * (self.monitor as f64 - 1.0)
            + 0.1 * (self.pc as f64 - 1.0)
    }
}

/// The player character
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: u32,
    pub money: f64,
    /// Completed work shifts; every fifth raises the wage
    pub work_count: u32,
    pub attributes: Attributes,
    pub trained: TrainedCounts,
    pub training_points: u32,
    pub peripherals: Peripherals,
    /// 0 = fully rested, no upper bound
    pub fatigue: f64,
}

impl Player {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            money: 0.0,
            work_count: 0,
            attributes: Attributes::default(),
            trained: TrainedCounts::default(),
            training_points: 0,
            peripherals: Peripherals::default(),
            fatigue: 0.0,
        }
    }

    /// What the match engine sees of this player
    pub fn competitor(&self) -> Competitor {
        Competitor::new(self.attributes, self.fatigue)
    }

    pub fn peripheral_bonus(&self) -> f64 {
        self.peripherals.bonus()
    }
}

/// Tournament schedule and economy settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CareerConfig {
    /// Days with a tournament match, ascending; the last one is the final
    pub match_days: Vec<u32>,
    /// Display names, one per match day
    pub match_names: Vec<String>,
    pub rules: RuleSet,
    pub shop: Shop,
    pub starting_money: f64,
}

impl Default for CareerConfig {
    fn default() -> Self {
        Self {
            match_days: vec![7, 13, 19, 25, 31],
            match_names: ["Round of 16", "Quarterfinal", "Semifinal", "Final", "Grand Final"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            rules: RuleSet::standard(),
            shop: Shop::default(),
            starting_money: 0.0,
        }
    }
}

impl CareerConfig {
    pub fn from_json(json: &str) -> Result<Self, CareerError> {
        let config: CareerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CareerError> {
        if self.match_days.is_empty() {
            return Err(CareerError::InvalidSchedule("no match days".into()));
        }
        if self.match_days[0] == 0 {
            return Err(CareerError::InvalidSchedule("days start at 1".into()));
        }
        if self.match_days.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CareerError::InvalidSchedule(
                "match days must be strictly ascending".into(),
            ));
        }
        if !(self.starting_money >= 0.0) {
            return Err(CareerError::InvalidSchedule("starting money must be non-negative".into()));
        }
        self.rules.validate()?;
        Ok(())
    }

    pub fn is_match_day(&self, day: u32) -> bool {
        self.match_days.contains(&day)
    }

    pub fn final_day(&self) -> Option<u32> {
        self.match_days.last().copied()
    }

    /// Display name of the match on `day`, `None` when no name is configured
    pub fn match_name(&self, day: u32) -> Option<&str> {
        let index = self.match_days.iter().position(|&d| d == day)?;
        self.match_names.get(index).map(String::as_str)
    }
}

/// Base difficulty of the match held on `day`
pub fn match_base_difficulty(day: u32) -> f64 {
    (day / 6 + 3) as f64
}
