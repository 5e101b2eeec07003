//! WASM bindings for a browser frontend

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;

use crate::{Beatmap, Competitor, Match, MatchError, ModChoice, Mods, PoolType, Step};

fn js_error(e: MatchError) -> JsError {
    JsError::new(&e.to_string())
}

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

fn parse_competitor(json: &str) -> Result<Competitor, JsError> {
    serde_json::from_str(json).map_err(|e| JsError::new(&format!("Invalid competitor: {}", e)))
}

/// A live match driven from JavaScript
#[wasm_bindgen]
pub struct WasmMatch {
    inner: Match,
}

#[wasm_bindgen]
impl WasmMatch {
    /// Deterministic match for a tournament day
    ///
    /// # Arguments
    /// * `day` - Tournament day, also the match index into the seed
    /// * `base_difficulty` - Difficulty the pools and opponent are built around
    /// * `seed` - 32-byte randomness seed
    #[wasm_bindgen(constructor)]
    pub fn new(day: u32, base_difficulty: f64, seed: &[u8]) -> Result<WasmMatch, JsError> {
        let seed_arr: [u8; 32] = seed
            .try_into()
            .map_err(|_| JsError::new("Seed must be exactly 32 bytes"))?;
        Ok(Self { inner: Match::seeded(day, base_difficulty, &seed_arr) })
    }

    /// Match seeded from `Math.random`
    #[wasm_bindgen(js_name = newRandom)]
    pub fn new_random(day: u32, base_difficulty: f64) -> WasmMatch {
        let mut seed = [0u8; 32];
        for byte in seed.iter_mut() {
            *byte = (js_sys::Math::random() * 256.0) as u8;
        }
        Self { inner: Match::seeded(day, base_difficulty, &seed) }
    }

    /// Run one engine step. `player_json` is the serialized player Competitor.
    pub fn advance(&mut self, player_json: &str) -> Result<JsValue, JsError> {
        let player = parse_competitor(player_json)?;
        let step = self.inner.advance(&player).map_err(js_error)?;
        to_js(&step)
    }

    /// Run engine steps until the player has to act; returns every step taken
    #[wasm_bindgen(js_name = advanceUntilPlayer)]
    pub fn advance_until_player(&mut self, player_json: &str) -> Result<JsValue, JsError> {
        let player = parse_competitor(player_json)?;
        let steps: Vec<Step> = self.inner.advance_until_player(&player).map_err(js_error)?;
        to_js(&steps)
    }

    #[wasm_bindgen(js_name = playerBan)]
    pub fn player_ban(&mut self, map_id: u32) -> Result<JsValue, JsError> {
        let step = self.inner.player_ban(map_id).map_err(js_error)?;
        to_js(&step)
    }

    #[wasm_bindgen(js_name = playerPick)]
    pub fn player_pick(&mut self, map_id: u32) -> Result<JsValue, JsError> {
        let step = self.inner.player_pick(map_id).map_err(js_error)?;
        to_js(&step)
    }

    #[wasm_bindgen(js_name = playerSelectMods)]
    pub fn player_select_mods(
        &mut self,
        map_id: u32,
        hr: bool,
        hd: bool,
    ) -> Result<JsValue, JsError> {
        let step = self
            .inner
            .player_select_mods(map_id, ModChoice { hr, hd })
            .map_err(js_error)?;
        to_js(&step)
    }

    pub fn maps(&self) -> Result<JsValue, JsError> {
        to_js(&self.inner.all_maps())
    }

    #[wasm_bindgen(js_name = availableMaps)]
    pub fn available_maps(&self, include_tie_break: bool) -> Result<JsValue, JsError> {
        to_js(&self.inner.available_maps(include_tie_break))
    }

    pub fn snapshot(&self) -> Result<JsValue, JsError> {
        to_js(&self.inner.snapshot())
    }
}

/// Expected score of a player on a map, without the random bonus
///
/// `pool` is the short pool name ("NM", "HR", ...). Free-mod pools honor
/// `hr` and `hd`; other pools use their forced mod.
#[wasm_bindgen(js_name = simulateScorePreview)]
#[allow(clippy::too_many_arguments)]
pub fn simulate_score_preview(
    player_json: &str,
    pool: &str,
    aim_rating: f64,
    spd_rating: f64,
    acc_rating: f64,
    maxcombo_rating: f64,
    hr: bool,
    hd: bool,
) -> Result<JsValue, JsError> {
    let player = parse_competitor(player_json)?;
    let pool: PoolType = serde_json::from_value(serde_json::Value::String(pool.to_string()))
        .map_err(|_| JsError::new(&format!("Unknown pool: {}", pool)))?;
    let map = Beatmap::new(0, pool, aim_rating, spd_rating, acc_rating, maxcombo_rating);
    let mods: Mods = pool.resolve_mods(ModChoice { hr, hd });
    let breakdown = map.score_breakdown(&player, mods).map_err(js_error)?;
    to_js(&breakdown)
}
