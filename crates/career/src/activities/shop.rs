//! Peripheral shop

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CareerError;
use crate::state::Player;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Peripheral {
    Keyboard,
    Monitor,
    Pc,
}

impl Peripheral {
    pub const ALL: [Peripheral; 3] = [Peripheral::Keyboard, Peripheral::Monitor, Peripheral::Pc];

    pub fn as_str(self) -> &'static str {
        match self {
            Peripheral::Keyboard => "keyboard",
            Peripheral::Monitor => "monitor",
            Peripheral::Pc => "pc",
        }
    }
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upgrade prices. Entry `i` is the price of going from level `i + 1` to
/// level `i + 2`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub keyboard: Vec<u32>,
    pub monitor: Vec<u32>,
    pub pc: Vec<u32>,
}

impl Default for Shop {
    fn default() -> Self {
        Self {
            keyboard: vec![100, 200, 400, 800, 1600],
            monitor: vec![200, 400, 800, 1600],
            pc: vec![200, 400, 800, 1600],
        }
    }
}

impl Shop {
    pub fn prices(&self, peripheral: Peripheral) -> &[u32] {
        match peripheral {
            Peripheral::Keyboard => &self.keyboard,
            Peripheral::Monitor => &self.monitor,
            Peripheral::Pc => &self.pc,
        }
    }

    /// Price of the next upgrade from `current_level`, `None` once maxed out
    pub fn cost(&self, peripheral: Peripheral, current_level: u32) -> Option<u32> {
        let index = current_level.checked_sub(1)? as usize;
        self.prices(peripheral).get(index).copied()
    }

    pub fn max_level(&self, peripheral: Peripheral) -> u32 {
        self.prices(peripheral).len() as u32 + 1
    }
}

impl Player {
    /// Buy the next level of `peripheral` and return what it cost
    pub fn buy(&mut self, shop: &Shop, peripheral: Peripheral) -> Result<u32, CareerError> {
        let level = self.peripherals.level(peripheral);
        let cost = shop.cost(peripheral, level).ok_or(CareerError::Maxed(peripheral))?;
        if self.money < cost as f64 {
            return Err(CareerError::InsufficientFunds { needed: cost, available: self.money });
        }
        self.money -= cost as f64;
        *self.peripherals.level_mut(peripheral) += 1;
        Ok(cost)
    }
}
