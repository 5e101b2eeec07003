//! Career layer for the tournament match engine
//!
//! Days are split into morning, afternoon and evening slots. Free slots go to
//! training, work, webcasts, rest or shopping; scheduled match days are spent
//! entirely on one tournament match. Losing a match ends the career, winning
//! the final match wins it.

pub mod activities;
pub mod error;
pub mod state;

use match_engine::{AttributeKind, HeuristicOpponent, Match, ModChoice, SeededRng, Side, Step};

pub use activities::{fatigue_penalty, Peripheral, Shop, WebcastResult};
pub use error::CareerError;
pub use state::{match_base_difficulty, CareerConfig, Peripherals, Player, TimeSlot};

/// Match index reserved for the activity random stream; match days start at 1
const ACTIVITY_STREAM: u32 = 0;

/// One playthrough
#[derive(Debug)]
pub struct Career {
    config: CareerConfig,
    seed: [u8; 32],
    rng: SeededRng,
    day: u32,
    slot: TimeSlot,
    player: Player,
    current_match: Option<Match>,
    /// Today's match result has been recorded
    settled: bool,
    game_over: bool,
    won: bool,
}

impl Career {
    /// Career on the default schedule
    pub fn new(seed: [u8; 32]) -> Self {
        Self::build(CareerConfig::default(), seed)
    }

    pub fn with_config(config: CareerConfig, seed: [u8; 32]) -> Result<Self, CareerError> {
        config.validate()?;
        Ok(Self::build(config, seed))
    }

    fn build(config: CareerConfig, seed: [u8; 32]) -> Self {
        let mut player = Player::new(1);
        player.money = config.starting_money;
        Self {
            rng: SeededRng::new(&seed, ACTIVITY_STREAM),
            config,
            seed,
            day: 1,
            slot: TimeSlot::Morning,
            player,
            current_match: None,
            settled: false,
            game_over: false,
            won: false,
        }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn time_slot(&self) -> TimeSlot {
        self.slot
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn config(&self) -> &CareerConfig {
        &self.config
    }

    pub fn is_match_day(&self) -> bool {
        self.config.is_match_day(self.day)
    }

    pub fn match_name(&self) -> Option<&str> {
        self.config.match_name(self.day)
    }

    pub fn current_match(&self) -> Option<&Match> {
        self.current_match.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.game_over
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    fn ensure_running(&self) -> Result<(), CareerError> {
        if self.game_over {
            return Err(CareerError::CareerOver);
        }
        Ok(())
    }

    fn ensure_free_day(&self) -> Result<(), CareerError> {
        self.ensure_running()?;
        if self.is_match_day() {
            return Err(CareerError::MatchDay);
        }
        Ok(())
    }

    /// Move to the next time slot. A match day is a single slot and can only
    /// be left once its match has been played out.
    pub fn next_time_slot(&mut self) -> Result<(), CareerError> {
        self.ensure_running()?;
        if self.is_match_day() {
            let resolved = self.current_match.as_ref().map_or(false, |m| m.phase().is_terminal());
            if !resolved {
                return Err(CareerError::MatchInProgress);
            }
            self.current_match = None;
            self.settled = false;
            self.day += 1;
            self.slot = TimeSlot::Morning;
            return Ok(());
        }

        match self.slot.next() {
            Some(slot) => self.slot = slot,
            None => {
                self.day += 1;
                self.slot = TimeSlot::Morning;
            }
        }
        log::debug!("day {} {:?}", self.day, self.slot);
        Ok(())
    }

    pub fn start_training(&mut self) -> Result<u32, CareerError> {
        self.ensure_free_day()?;
        Ok(self.player.start_training())
    }

    pub fn train(&mut self, kind: AttributeKind) -> Result<f64, CareerError> {
        self.ensure_free_day()?;
        let gain = self.player.train(kind);
        log::info!("day {}: trained {} (+{:.2})", self.day, kind, gain);
        Ok(gain)
    }

    pub fn work(&mut self) -> Result<f64, CareerError> {
        self.ensure_free_day()?;
        let gain = self.player.work(self.slot);
        log::info!("day {}: worked for {:.0}", self.day, gain);
        Ok(gain)
    }

    pub fn webcast(&mut self) -> Result<WebcastResult, CareerError> {
        self.ensure_free_day()?;
        let result = self.player.webcast(self.slot, &mut self.rng);
        log::info!("day {}: webcast earned {:.0}", self.day, result.money);
        Ok(result)
    }

    pub fn rest(&mut self) -> Result<f64, CareerError> {
        self.ensure_free_day()?;
        let recovered = self.player.rest();
        log::info!("day {}: rested, fatigue now {:.0}", self.day, self.player.fatigue);
        Ok(recovered)
    }

    pub fn buy(&mut self, peripheral: Peripheral) -> Result<u32, CareerError> {
        self.ensure_running()?;
        let cost = self.player.buy(&self.config.shop, peripheral)?;
        log::info!(
            "bought {} level {} for {}",
            peripheral,
            self.player.peripherals.level(peripheral),
            cost
        );
        Ok(cost)
    }

    /// Create today's match. Seeded from the career seed with the day as
    /// match index, so a replay of the same career meets the same opponent.
    pub fn start_match(&mut self) -> Result<&Match, CareerError> {
        self.ensure_running()?;
        if !self.is_match_day() {
            return Err(CareerError::NotMatchDay);
        }
        match &self.current_match {
            Some(m) if m.phase().is_terminal() => return Err(CareerError::MatchAlreadyPlayed),
            Some(_) => return Err(CareerError::MatchInProgress),
            None => {}
        }

        let base = match_base_difficulty(self.day);
        let m = Match::with_parts(
            self.day,
            base,
            self.config.rules.clone(),
            SeededRng::new(&self.seed, self.day),
            HeuristicOpponent,
        )?;
        log::info!(
            "day {}: {} starts, base difficulty {}",
            self.day,
            self.match_name().unwrap_or("exhibition"),
            base
        );
        let m = self.current_match.insert(m);
        Ok(&*m)
    }

    fn active_match(&mut self) -> Result<&mut Match, CareerError> {
        self.ensure_running()?;
        self.current_match.as_mut().ok_or(CareerError::NoActiveMatch)
    }

    /// One engine step of today's match
    pub fn advance_match(&mut self) -> Result<Step, CareerError> {
        let competitor = self.player.competitor();
        let step = self.active_match()?.advance(&competitor)?;
        self.settle_match();
        Ok(step)
    }

    /// Engine steps until the player has to act or the match is over
    pub fn advance_match_until_player(&mut self) -> Result<Vec<Step>, CareerError> {
        let competitor = self.player.competitor();
        let steps = self.active_match()?.advance_until_player(&competitor)?;
        self.settle_match();
        Ok(steps)
    }

    pub fn player_ban(&mut self, map_id: u32) -> Result<Step, CareerError> {
        Ok(self.active_match()?.player_ban(map_id)?)
    }

    pub fn player_pick(&mut self, map_id: u32) -> Result<Step, CareerError> {
        Ok(self.active_match()?.player_pick(map_id)?)
    }

    pub fn player_select_mods(
        &mut self,
        map_id: u32,
        choice: ModChoice,
    ) -> Result<Step, CareerError> {
        Ok(self.active_match()?.player_select_mods(map_id, choice)?)
    }

    fn settle_match(&mut self) {
        if self.settled {
            return;
        }
        let winner = match &self.current_match {
            Some(m) if m.phase().is_terminal() => m.winner(),
            _ => return,
        };
        self.settled = true;
        match winner {
            Some(winner) => self.record_result(winner),
            None => log::info!("day {}: match aborted, no result", self.day),
        }
    }

    fn record_result(&mut self, winner: Side) {
        if self.game_over {
            return;
        }
        match winner {
            Side::Player if Some(self.day) == self.config.final_day() => {
                log::info!("day {}: final won, career complete", self.day);
                self.won = true;
                self.game_over = true;
            }
            Side::Player => log::info!("day {}: match won", self.day),
            Side::Opponent => {
                log::info!("day {}: match lost, career over", self.day);
                self.game_over = true;
            }
        }
    }
}
