//! Things the player can spend a time slot on

pub mod shop;
pub mod training;
pub mod work;

pub use shop::{Peripheral, Shop};
pub use work::{fatigue_penalty, WebcastResult};
