//! Match state machine
//!
//! A match runs `Roll -> Ban -> Pick -> Mods -> Playing`, then loops
//! `Pick -> Mods -> Playing` until one side reaches the win target. The
//! opponent only ever acts inside [`Match::advance`]; the player acts through
//! `player_ban`, `player_pick` and `player_select_mods`.

use serde::{Deserialize, Serialize};

use crate::attributes::Competitor;
use crate::beatmap::{Beatmap, ModChoice, Mods};
use crate::config::{PickOrder, RuleSet};
use crate::error::MatchError;
use crate::pool::MapPool;
use crate::random::{RandomSource, SeededRng};
use crate::strategy::{HeuristicOpponent, OpponentStrategy};

/// One of the two competitors in a match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }

    fn index(self) -> usize {
        match self {
            Side::Player => 0,
            Side::Opponent => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Roll,
    Ban,
    Pick,
    Mods,
    Playing,
    Finished,
    /// Terminal state after an internal invariant was violated
    Aborted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Finished | Phase::Aborted)
    }
}

/// Opening dice roll. Higher roll bans first; the opponent wins ties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub player: u32,
    pub opponent: u32,
    pub first_ban: Side,
}

/// Result of one played map
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// 1-based round number
    pub round: u32,
    pub map_id: u32,
    pub player_score: f64,
    pub opponent_score: f64,
    pub player_mods: Mods,
    pub opponent_mods: Mods,
    pub winner: Side,
    pub player_wins: u32,
    pub opponent_wins: u32,
    /// True when this round decided the match
    pub ended: bool,
}

/// What a call to [`Match::advance`] (or a player action) did
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// Nothing happened; the player has to act in this phase
    AwaitingPlayer(Phase),
    Rolled(RollResult),
    Banned { by: Side, map_id: u32 },
    Picked { by: Side, map_id: u32 },
    TieBreakSelected { map_id: u32 },
    ModsSelected { by: Side, map_id: u32, mods: Mods },
    RoundPlayed(RoundResult),
    Finished { winner: Side },
}

/// Serializable view of a match for frontends
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub day: u32,
    pub base_difficulty: f64,
    pub diff_level: u32,
    pub phase: Phase,
    pub turn: Side,
    pub player_wins: u32,
    pub opponent_wins: u32,
    pub rounds_to_win: u32,
    pub ban_slots: u32,
    pub player_bans_used: u32,
    pub opponent_bans_used: u32,
    pub roll: Option<RollResult>,
    pub tie_break: bool,
    pub current_map: Option<u32>,
    pub ended: bool,
    pub winner: Option<Side>,
    pub opponent: Competitor,
    pub maps: Vec<Beatmap>,
    pub last_round: Option<RoundResult>,
}

/// One tournament match against a generated opponent
#[derive(Clone, Debug)]
pub struct Match<R = SeededRng, S = HeuristicOpponent> {
    day: u32,
    base_difficulty: f64,
    diff_level: u32,
    rules: RuleSet,
    maps: MapPool,
    opponent: Competitor,
    phase: Phase,
    turn: Side,
    wins: [u32; 2],
    used_bans: [u32; 2],
    ban_slots: u32,
    rounds_to_win: u32,
    roll: Option<RollResult>,
    tie_break: bool,
    current_map: Option<u32>,
    last_picker: Option<Side>,
    history: Vec<RoundResult>,
    rng: R,
    strategy: S,
}

impl Match {
    /// Match under the standard rules, seeded from the operating system
    #[cfg(feature = "entropy")]
    pub fn new(day: u32, base_difficulty: f64) -> Self {
        Self::build(
            day,
            base_difficulty,
            RuleSet::standard(),
            SeededRng::from_entropy(),
            HeuristicOpponent,
        )
    }

    /// Deterministic match: the same seed and day replay the same match
    pub fn seeded(day: u32, base_difficulty: f64, seed: &[u8; 32]) -> Self {
        Self::build(
            day,
            base_difficulty,
            RuleSet::standard(),
            SeededRng::new(seed, day),
            HeuristicOpponent,
        )
    }
}

impl<R: RandomSource, S: OpponentStrategy> Match<R, S> {
    /// Match with explicit rules, randomness and opponent behavior
    pub fn with_parts(
        day: u32,
        base_difficulty: f64,
        rules: RuleSet,
        rng: R,
        strategy: S,
    ) -> Result<Self, MatchError> {
        rules.validate()?;
        Ok(Self::build(day, base_difficulty, rules, rng, strategy))
    }

    /// Match over a prepared pool and opponent instead of generated ones
    pub fn with_pool(
        day: u32,
        base_difficulty: f64,
        rules: RuleSet,
        maps: MapPool,
        opponent: Competitor,
        rng: R,
        strategy: S,
    ) -> Result<Self, MatchError> {
        rules.validate()?;
        if maps.tie_break_map().is_none() {
            return Err(MatchError::Config("map pool needs an unplayed tie-break map".into()));
        }
        if maps.iter().any(|m| !m.is_available()) {
            return Err(MatchError::Config("map pool must start with every map available".into()));
        }
        Ok(Self::assemble(day, base_difficulty, rules, maps, opponent, rng, strategy))
    }

    fn build(day: u32, base_difficulty: f64, rules: RuleSet, mut rng: R, strategy: S) -> Self {
        let diff_level = RuleSet::diff_level(base_difficulty);
        let maps = MapPool::generate(
            base_difficulty,
            diff_level,
            rules.bonus_units,
            rules.bonus_unit_points,
            &mut rng,
        );
        let opponent = Competitor::generate_opponent(base_difficulty, &rules, &mut rng);
        Self::assemble(day, base_difficulty, rules, maps, opponent, rng, strategy)
    }

    fn assemble(
        day: u32,
        base_difficulty: f64,
        rules: RuleSet,
        maps: MapPool,
        opponent: Competitor,
        rng: R,
        strategy: S,
    ) -> Self {
        let diff_level = RuleSet::diff_level(base_difficulty);
        let ban_slots = rules.ban_slots(diff_level);
        let rounds_to_win = RuleSet::rounds_to_win(diff_level);
        log::debug!(
            "match day {}: base {:.2}, level {}, {} maps, first to {}, {} ban(s) each",
            day,
            base_difficulty,
            diff_level,
            maps.len(),
            rounds_to_win,
            ban_slots
        );
        Self {
            day,
            base_difficulty,
            diff_level,
            rules,
            maps,
            opponent,
            phase: Phase::Roll,
            turn: Side::Player,
            wins: [0; 2],
            used_bans: [0; 2],
            ban_slots,
            rounds_to_win,
            roll: None,
            tie_break: false,
            current_map: None,
            last_picker: None,
            history: Vec::new(),
            rng,
            strategy,
        }
    }

    /// Perform one logical step on behalf of the engine and the opponent
    ///
    /// Returns [`Step::AwaitingPlayer`] without changing anything when the
    /// player has to act next.
    pub fn advance(&mut self, player: &Competitor) -> Result<Step, MatchError> {
        let result = self.step(player);
        self.guard(result)
    }

    /// Advance until the player has to act or the match is over
    pub fn advance_until_player(&mut self, player: &Competitor) -> Result<Vec<Step>, MatchError> {
        let mut steps = Vec::new();
        loop {
            let step = self.advance(player)?;
            let waiting = matches!(step, Step::AwaitingPlayer(_) | Step::Finished { .. });
            steps.push(step);
            if waiting {
                return Ok(steps);
            }
        }
    }

    pub fn player_ban(&mut self, map_id: u32) -> Result<Step, MatchError> {
        let result = self.try_player_ban(map_id);
        self.guard(result)
    }

    pub fn player_pick(&mut self, map_id: u32) -> Result<Step, MatchError> {
        let result = self.try_player_pick(map_id);
        self.guard(result)
    }

    /// Choose the player's mods for the map being played. Only Free Mod and
    /// Tie-Break maps honor the request; other pools force their own mod.
    pub fn player_select_mods(
        &mut self,
        map_id: u32,
        choice: ModChoice,
    ) -> Result<Step, MatchError> {
        let result = self.try_player_select_mods(map_id, choice);
        self.guard(result)
    }

    fn guard<T>(&mut self, result: Result<T, MatchError>) -> Result<T, MatchError> {
        if let Err(err) = &result {
            if err.is_fatal() && self.phase != Phase::Aborted {
                log::debug!("match day {} aborted: {}", self.day, err);
                self.phase = Phase::Aborted;
            }
        }
        result
    }

    fn ensure_live(&self) -> Result<(), MatchError> {
        match self.phase {
            Phase::Finished => Err(MatchError::MatchFinished),
            Phase::Aborted => Err(MatchError::MatchAborted),
            _ => Ok(()),
        }
    }

    fn expect_phase(&self, expected: Phase) -> Result<(), MatchError> {
        self.ensure_live()?;
        if self.phase != expected {
            return Err(MatchError::WrongPhase { expected, actual: self.phase });
        }
        Ok(())
    }

    fn expect_player_turn(&self) -> Result<(), MatchError> {
        if self.turn != Side::Player {
            return Err(MatchError::NotYourTurn { phase: self.phase });
        }
        Ok(())
    }

    /// Check a map can be banned or voluntarily picked
    fn check_selectable(&self, map_id: u32) -> Result<(), MatchError> {
        let map = self.maps.get(map_id).ok_or(MatchError::UnknownMap(map_id))?;
        if map.pool.is_tie_break() {
            return Err(MatchError::TieBreakProtected(map_id));
        }
        if !map.is_available() {
            return Err(MatchError::MapUnavailable(map_id));
        }
        Ok(())
    }

    fn bans_left(&self, side: Side) -> u32 {
        self.ban_slots.saturating_sub(self.used_bans[side.index()])
    }

    fn step(&mut self, player: &Competitor) -> Result<Step, MatchError> {
        match self.phase {
            Phase::Roll => Ok(self.do_roll()),
            Phase::Ban => {
                if self.turn == Side::Player {
                    self.ensure_choice_left(Phase::Ban)?;
                    return Ok(Step::AwaitingPlayer(Phase::Ban));
                }
                let choice = self.strategy.choose_ban(&self.opponent, &self.maps, &mut self.rng);
                let map_id = self.check_opponent_choice(choice, Phase::Ban)?;
                self.apply_ban(Side::Opponent, map_id)
            }
            Phase::Pick => {
                if self.tie_break {
                    return self.select_tie_break();
                }
                if self.turn == Side::Player {
                    self.ensure_choice_left(Phase::Pick)?;
                    return Ok(Step::AwaitingPlayer(Phase::Pick));
                }
                let choice = self.strategy.choose_pick(&self.opponent, &self.maps, &mut self.rng);
                let map_id = self.check_opponent_choice(choice, Phase::Pick)?;
                self.apply_pick(Side::Opponent, map_id)
            }
            Phase::Mods => {
                let map_id = self.current_map.ok_or(MatchError::NoActiveMap)?;
                let chosen = self.maps.get(map_id).and_then(Beatmap::opponent_mods);
                if chosen.is_some() {
                    return Ok(Step::AwaitingPlayer(Phase::Mods));
                }
                let mods = self.opponent_mods(map_id)?;
                if let Some(map) = self.maps.get_mut(map_id) {
                    map.set_mods(Side::Opponent, mods);
                }
                log::debug!("opponent plays map {} with {}", map_id, mods);
                Ok(Step::ModsSelected { by: Side::Opponent, map_id, mods })
            }
            Phase::Playing => self.play_round(player).map(Step::RoundPlayed),
            Phase::Finished => Ok(Step::Finished { winner: self.leader() }),
            Phase::Aborted => Err(MatchError::MatchAborted),
        }
    }

    fn do_roll(&mut self) -> Step {
        let player = self.rng.roll();
        let opponent = self.rng.roll();
        let first_ban = if player > opponent { Side::Player } else { Side::Opponent };
        let roll = RollResult { player, opponent, first_ban };

        log::debug!("roll: player {} vs opponent {}, {:?} bans first", player, opponent, first_ban);
        self.roll = Some(roll);
        self.turn = first_ban;
        self.phase = Phase::Ban;
        Step::Rolled(roll)
    }

    /// The player cannot be left waiting on a choice that does not exist
    fn ensure_choice_left(&self, phase: Phase) -> Result<(), MatchError> {
        if self.maps.available(false).next().is_none() {
            return Err(MatchError::NoMapAvailable { phase });
        }
        Ok(())
    }

    fn check_opponent_choice(&self, choice: Option<u32>, phase: Phase) -> Result<u32, MatchError> {
        let map_id = choice.ok_or(MatchError::NoMapAvailable { phase })?;
        match self.maps.get(map_id) {
            Some(map) if map.is_available() && !map.pool.is_tie_break() => Ok(map_id),
            _ => Err(MatchError::IllegalOpponentChoice(map_id)),
        }
    }

    fn try_player_ban(&mut self, map_id: u32) -> Result<Step, MatchError> {
        self.expect_phase(Phase::Ban)?;
        self.expect_player_turn()?;
        self.check_selectable(map_id)?;
        self.apply_ban(Side::Player, map_id)
    }

    fn apply_ban(&mut self, side: Side, map_id: u32) -> Result<Step, MatchError> {
        if self.bans_left(side) == 0 {
            return Err(MatchError::BanSlotsExhausted);
        }
        let map = self.maps.get_mut(map_id).ok_or(MatchError::UnknownMap(map_id))?;
        map.mark_banned(side)?;
        self.used_bans[side.index()] += 1;
        log::debug!("{:?} bans map {} ({})", side, map_id, map.pool);

        let other = side.other();
        if self.bans_left(other) > 0 {
            self.turn = other;
        } else if self.bans_left(side) == 0 {
            // whoever made the final ban opens the picks
            self.phase = Phase::Pick;
            self.turn = side;
        }
        Ok(Step::Banned { by: side, map_id })
    }

    fn try_player_pick(&mut self, map_id: u32) -> Result<Step, MatchError> {
        self.expect_phase(Phase::Pick)?;
        if self.tie_break {
            return Err(MatchError::TieBreakForced);
        }
        self.expect_player_turn()?;
        self.check_selectable(map_id)?;
        self.apply_pick(Side::Player, map_id)
    }

    fn apply_pick(&mut self, side: Side, map_id: u32) -> Result<Step, MatchError> {
        let map = self.maps.get_mut(map_id).ok_or(MatchError::UnknownMap(map_id))?;
        if map.pool.is_tie_break() {
            return Err(MatchError::TieBreakProtected(map_id));
        }
        map.mark_picked(Some(side))?;
        log::debug!("{:?} picks map {} ({})", side, map_id, map.pool);

        self.current_map = Some(map_id);
        self.last_picker = Some(side);
        self.phase = Phase::Mods;
        Ok(Step::Picked { by: side, map_id })
    }

    fn select_tie_break(&mut self) -> Result<Step, MatchError> {
        let map_id = self
            .maps
            .tie_break_map()
            .map(|m| m.id)
            .ok_or(MatchError::NoMapAvailable { phase: Phase::Pick })?;
        let map = self.maps.get_mut(map_id).ok_or(MatchError::NoActiveMap)?;
        map.mark_picked(None)?;
        log::debug!("tie-break: map {} selected for both sides", map_id);

        self.current_map = Some(map_id);
        self.phase = Phase::Mods;
        Ok(Step::TieBreakSelected { map_id })
    }

    fn opponent_mods(&mut self, map_id: u32) -> Result<Mods, MatchError> {
        let map = self.maps.get(map_id).ok_or(MatchError::NoActiveMap)?;
        let wanted = self.strategy.choose_mods(&self.opponent, map);
        Ok(map.pool.resolve_mods(ModChoice { hr: wanted.hr, hd: wanted.hd }))
    }

    fn try_player_select_mods(
        &mut self,
        map_id: u32,
        choice: ModChoice,
    ) -> Result<Step, MatchError> {
        self.expect_phase(Phase::Mods)?;
        if self.maps.get(map_id).is_none() {
            return Err(MatchError::UnknownMap(map_id));
        }
        let current = self.current_map.ok_or(MatchError::NoActiveMap)?;
        if current != map_id {
            return Err(MatchError::MapNotActive(map_id));
        }

        let map = self.maps.get_mut(map_id).ok_or(MatchError::NoActiveMap)?;
        let mods = map.pool.resolve_mods(choice);
        map.set_mods(Side::Player, mods);
        log::debug!("player plays map {} with {}", map_id, mods);

        self.phase = Phase::Playing;
        Ok(Step::ModsSelected { by: Side::Player, map_id, mods })
    }

    fn play_round(&mut self, player: &Competitor) -> Result<RoundResult, MatchError> {
        let map_id = self.current_map.ok_or(MatchError::NoActiveMap)?;
        let chosen = self.maps.get(map_id).and_then(Beatmap::opponent_mods);
        let opponent_mods = match chosen {
            Some(mods) => mods,
            None => self.opponent_mods(map_id)?,
        };

        let map = self.maps.get(map_id).ok_or(MatchError::NoActiveMap)?;
        let player_mods = map.player_mods().unwrap_or_else(|| map.pool.forced_mods());
        let player_score = map.simulate_score(player, player_mods, &mut self.rng)?;
        let opponent_score = map.simulate_score(&self.opponent, opponent_mods, &mut self.rng)?;

        let winner = if player_score > opponent_score {
            Side::Player
        } else if opponent_score > player_score {
            Side::Opponent
        } else if self.rng.coin_flip() {
            Side::Player
        } else {
            Side::Opponent
        };

        if let Some(map) = self.maps.get_mut(map_id) {
            map.set_mods(Side::Opponent, opponent_mods);
            map.finish_playing();
        }
        self.wins[winner.index()] += 1;
        self.current_map = None;

        let ended = self.wins.iter().any(|&w| w >= self.rounds_to_win);
        let match_point = self.rounds_to_win - 1;
        if ended {
            self.phase = Phase::Finished;
        } else {
            if self.wins == [match_point; 2] {
                self.tie_break = true;
            }
            self.phase = Phase::Pick;
            self.turn = match self.rules.pick_order {
                PickOrder::Alternate => self.last_picker.map_or(winner, Side::other),
                PickOrder::WinnerPicks => winner,
            };
        }

        let result = RoundResult {
            round: self.history.len() as u32 + 1,
            map_id,
            player_score,
            opponent_score,
            player_mods,
            opponent_mods,
            winner,
            player_wins: self.wins[Side::Player.index()],
            opponent_wins: self.wins[Side::Opponent.index()],
            ended,
        };
        log::debug!(
            "round {} on map {}: {:.0} - {:.0}, {:?} wins ({} - {})",
            result.round,
            map_id,
            player_score,
            opponent_score,
            winner,
            result.player_wins,
            result.opponent_wins
        );
        self.history.push(result);
        Ok(result)
    }

    fn leader(&self) -> Side {
        if self.wins[Side::Player.index()] > self.wins[Side::Opponent.index()] {
            Side::Player
        } else {
            Side::Opponent
        }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn base_difficulty(&self) -> f64 {
        self.base_difficulty
    }

    pub fn diff_level(&self) -> u32 {
        self.diff_level
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Side expected to act in the ban and pick phases
    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn wins(&self, side: Side) -> u32 {
        self.wins[side.index()]
    }

    pub fn used_bans(&self, side: Side) -> u32 {
        self.used_bans[side.index()]
    }

    pub fn ban_slots(&self) -> u32 {
        self.ban_slots
    }

    pub fn rounds_to_win(&self) -> u32 {
        self.rounds_to_win
    }

    pub fn roll(&self) -> Option<RollResult> {
        self.roll
    }

    pub fn opponent(&self) -> &Competitor {
        &self.opponent
    }

    pub fn is_tie_break(&self) -> bool {
        self.tie_break
    }

    pub fn ended(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn winner(&self) -> Option<Side> {
        self.ended().then(|| self.leader())
    }

    pub fn maps(&self) -> &MapPool {
        &self.maps
    }

    pub fn all_maps(&self) -> Vec<&Beatmap> {
        self.maps.iter().collect()
    }

    pub fn available_maps(&self, include_tie_break: bool) -> Vec<&Beatmap> {
        self.maps.available(include_tie_break).collect()
    }

    pub fn map(&self, map_id: u32) -> Option<&Beatmap> {
        self.maps.get(map_id)
    }

    pub fn current_map(&self) -> Option<&Beatmap> {
        self.current_map.and_then(|id| self.maps.get(id))
    }

    pub fn last_round(&self) -> Option<&RoundResult> {
        self.history.last()
    }

    pub fn history(&self) -> &[RoundResult] {
        &self.history
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            day: self.day,
            base_difficulty: self.base_difficulty,
            diff_level: self.diff_level,
            phase: self.phase,
            turn: self.turn,
            player_wins: self.wins(Side::Player),
            opponent_wins: self.wins(Side::Opponent),
            rounds_to_win: self.rounds_to_win,
            ban_slots: self.ban_slots,
            player_bans_used: self.used_bans(Side::Player),
            opponent_bans_used: self.used_bans(Side::Opponent),
            roll: self.roll,
            tie_break: self.tie_break,
            current_map: self.current_map,
            ended: self.ended(),
            winner: self.winner(),
            opponent: self.opponent,
            maps: self.maps.iter().cloned().collect(),
            last_round: self.history.last().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;
    use crate::beatmap::{MapState, PoolType};
    use proptest::prelude::*;
    use std::collections::VecDeque;

    /// Seeded randomness with scripted dice rolls and coin flips
    #[derive(Clone, Debug)]
    struct Scripted {
        inner: SeededRng,
        rolls: VecDeque<u32>,
        coins: VecDeque<bool>,
    }

    impl Scripted {
        fn new(rolls: &[u32], coins: &[bool]) -> Self {
            Self {
                inner: SeededRng::new(&[42u8; 32], 7),
                rolls: rolls.iter().copied().collect(),
                coins: coins.iter().copied().collect(),
            }
        }
    }

    impl RandomSource for Scripted {
        fn next_u64(&mut self) -> u64 {
            self.inner.next_u64()
        }

        fn roll(&mut self) -> u32 {
            match self.rolls.pop_front() {
                Some(r) => r,
                None => self.inner.roll(),
            }
        }

        fn coin_flip(&mut self) -> bool {
            match self.coins.pop_front() {
                Some(c) => c,
                None => self.inner.coin_flip(),
            }
        }
    }

    /// Opponent that bans a scripted list of ids, otherwise plays heuristically
    #[derive(Debug, Default)]
    struct ScriptedBans {
        bans: VecDeque<u32>,
    }

    impl OpponentStrategy for ScriptedBans {
        fn choose_ban(
            &mut self,
            me: &Competitor,
            maps: &MapPool,
            rng: &mut dyn RandomSource,
        ) -> Option<u32> {
            match self.bans.pop_front() {
                Some(id) => Some(id),
                None => HeuristicOpponent.choose_ban(me, maps, rng),
            }
        }

        fn choose_pick(
            &mut self,
            me: &Competitor,
            maps: &MapPool,
            rng: &mut dyn RandomSource,
        ) -> Option<u32> {
            HeuristicOpponent.choose_pick(me, maps, rng)
        }

        fn choose_mods(&mut self, me: &Competitor, map: &Beatmap) -> Mods {
            HeuristicOpponent.choose_mods(me, map)
        }
    }

    fn player() -> Competitor {
        Competitor::new(Attributes::uniform(3.5), 10.0)
    }

    /// Twelve identical NM maps plus a tie-break, all with zero bonus, so
    /// equal competitors always tie and the coin decides every round
    fn flat_pool() -> MapPool {
        let mut maps: Vec<Beatmap> = (1..=12)
            .map(|id| Beatmap::new(id, PoolType::NoMod, 3.0, 3.0, 3.0, 3.0).with_bonus(0, 0.0))
            .collect();
        maps.push(Beatmap::new(13, PoolType::TieBreak, 3.0, 3.0, 3.0, 3.0).with_bonus(0, 0.0));
        MapPool::from_maps(maps)
    }

    fn flat_match(
        rules: RuleSet,
        rolls: &[u32],
        coins: &[bool],
    ) -> Match<Scripted, HeuristicOpponent> {
        flat_match_at(3.0, rules, rolls, coins)
    }

    fn flat_match_at(
        base: f64,
        rules: RuleSet,
        rolls: &[u32],
        coins: &[bool],
    ) -> Match<Scripted, HeuristicOpponent> {
        let rng = Scripted::new(rolls, coins);
        Match::with_pool(7, base, rules, flat_pool(), player(), rng, HeuristicOpponent).unwrap()
    }

    fn first_open(m: &Match<impl RandomSource, impl OpponentStrategy>) -> u32 {
        m.available_maps(false)[0].id
    }

    /// Drive a match to the end, answering every player prompt with the
    /// first open map and no optional mods; `check` runs after every step
    fn play_out<R: RandomSource, S: OpponentStrategy>(
        m: &mut Match<R, S>,
        me: &Competitor,
        mut check: impl FnMut(&Match<R, S>),
    ) -> Result<Side, MatchError> {
        for _ in 0..500 {
            let step = m.advance(me)?;
            match step {
                Step::Finished { winner } => return Ok(winner),
                Step::AwaitingPlayer(Phase::Ban) => {
                    let id = first_open(m);
                    m.player_ban(id)?;
                }
                Step::AwaitingPlayer(Phase::Pick) => {
                    let id = first_open(m);
                    m.player_pick(id)?;
                }
                Step::AwaitingPlayer(Phase::Mods) => {
                    let id = m.current_map().map(|map| map.id).ok_or(MatchError::NoActiveMap)?;
                    m.player_select_mods(id, ModChoice::default())?;
                }
                _ => {}
            }
            check(m);
        }
        panic!("match did not finish");
    }

    #[test]
    fn test_end_to_end_base_three() {
        let seed = [42u8; 32];
        let mut m = Match::seeded(7, 3.0, &seed);
        assert_eq!(m.diff_level(), 1);
        assert_eq!(m.rounds_to_win(), 5);
        assert_eq!(m.ban_slots(), 1);
        assert_eq!(m.phase(), Phase::Roll);

        let winner = play_out(&mut m, &player(), |_| {}).unwrap();

        assert!(m.ended());
        assert_eq!(m.winner(), Some(winner));
        let total = m.wins(Side::Player) + m.wins(Side::Opponent);
        assert!(total >= 5);
        assert_eq!(m.wins(winner), 5);
        assert_eq!(m.history().len() as u32, total);
        let (last, earlier) = m.history().split_last().unwrap();
        assert!(last.ended);
        assert!(earlier.iter().all(|r| !r.ended));
    }

    #[test]
    fn test_match_determinism() {
        let seed = [42u8; 32];
        let mut a = Match::seeded(13, 4.0, &seed);
        let mut b = Match::seeded(13, 4.0, &seed);
        play_out(&mut a, &player(), |_| {}).unwrap();
        play_out(&mut b, &player(), |_| {}).unwrap();
        assert_eq!(a.history(), b.history());
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_different_days_differ() {
        let seed = [42u8; 32];
        let a = Match::seeded(7, 3.0, &seed);
        let b = Match::seeded(13, 3.0, &seed);
        assert_ne!(a.all_maps(), b.all_maps());
    }

    #[test]
    fn test_roll_decides_first_ban() {
        let mut m = flat_match(RuleSet::standard(), &[90, 10], &[]);
        let step = m.advance(&player()).unwrap();
        assert_eq!(
            step,
            Step::Rolled(RollResult { player: 90, opponent: 10, first_ban: Side::Player })
        );
        assert_eq!(m.phase(), Phase::Ban);
        assert_eq!(m.turn(), Side::Player);
        assert_eq!(m.advance(&player()).unwrap(), Step::AwaitingPlayer(Phase::Ban));
    }

    #[test]
    fn test_equal_roll_opponent_bans_first() {
        let mut m = flat_match(RuleSet::standard(), &[50, 50], &[]);
        m.advance(&player()).unwrap();
        assert_eq!(m.roll().map(|r| r.first_ban), Some(Side::Opponent));
        assert_eq!(m.turn(), Side::Opponent);
    }

    #[test]
    fn test_wrong_phase_leaves_state_untouched() {
        let mut m = flat_match(RuleSet::standard(), &[90, 10], &[]);
        let before = m.snapshot();
        assert_eq!(
            m.player_pick(1),
            Err(MatchError::WrongPhase { expected: Phase::Pick, actual: Phase::Roll })
        );
        assert_eq!(
            m.player_select_mods(1, ModChoice::default()),
            Err(MatchError::WrongPhase { expected: Phase::Mods, actual: Phase::Roll })
        );
        assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn test_not_your_turn() {
        let mut m = flat_match(RuleSet::standard(), &[10, 90], &[]);
        m.advance(&player()).unwrap();
        let before = m.snapshot();
        assert_eq!(m.player_ban(1), Err(MatchError::NotYourTurn { phase: Phase::Ban }));
        assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn test_player_ban_rejections() {
        let mut m = flat_match(RuleSet::standard(), &[90, 10], &[]);
        m.advance(&player()).unwrap();
        let before = m.snapshot();
        assert_eq!(m.player_ban(13), Err(MatchError::TieBreakProtected(13)));
        assert_eq!(m.player_ban(99), Err(MatchError::UnknownMap(99)));
        assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn test_final_banner_picks_first() {
        let mut m = flat_match(RuleSet::standard(), &[90, 10], &[]);
        let me = player();
        m.advance(&me).unwrap();
        assert_eq!(m.player_ban(1).unwrap(), Step::Banned { by: Side::Player, map_id: 1 });
        assert_eq!(m.phase(), Phase::Ban);
        assert_eq!(m.turn(), Side::Opponent);

        match m.advance(&me).unwrap() {
            Step::Banned { by: Side::Opponent, map_id } => assert_ne!(map_id, 1),
            other => panic!("unexpected step {:?}", other),
        }
        assert_eq!(m.phase(), Phase::Pick);
        assert_eq!(m.turn(), Side::Opponent);
        assert_eq!(
            m.player_ban(2),
            Err(MatchError::WrongPhase { expected: Phase::Ban, actual: Phase::Pick })
        );
    }

    #[test]
    fn test_bans_alternate_until_exhausted() {
        // level 5 under uncapped legacy rules: three bans each
        let rules = RuleSet::legacy();
        let mut m = flat_match_at(13.0, rules, &[10, 90], &[]);
        assert_eq!(m.ban_slots(), 3);
        let me = player();
        m.advance(&me).unwrap();

        let mut order = Vec::new();
        while m.phase() == Phase::Ban {
            match m.advance(&me).unwrap() {
                Step::AwaitingPlayer(Phase::Ban) => {
                    let id = first_open(&m);
                    m.player_ban(id).unwrap();
                    order.push(Side::Player);
                }
                Step::Banned { by, .. } => order.push(by),
                other => panic!("unexpected step {:?}", other),
            }
        }
        use Side::{Opponent as O, Player as P};
        assert_eq!(order, vec![O, P, O, P, O, P]);
        assert_eq!(m.used_bans(Side::Player), 3);
        assert_eq!(m.used_bans(Side::Opponent), 3);
        assert_eq!(m.turn(), Side::Player);
    }

    #[test]
    fn test_select_mods_for_inactive_map() {
        let mut m = flat_match(RuleSet::standard(), &[10, 90], &[]);
        let me = player();
        m.advance(&me).unwrap(); // roll
        m.advance(&me).unwrap(); // opponent ban
        m.player_ban(first_open(&m)).unwrap();
        assert_eq!(m.turn(), Side::Player);
        let picked = first_open(&m);
        m.player_pick(picked).unwrap();
        assert!(matches!(m.advance(&me).unwrap(), Step::ModsSelected { by: Side::Opponent, .. }));
        assert_eq!(m.advance(&me).unwrap(), Step::AwaitingPlayer(Phase::Mods));

        let other = first_open(&m);
        assert_eq!(
            m.player_select_mods(other, ModChoice::default()),
            Err(MatchError::MapNotActive(other))
        );
        assert_eq!(m.phase(), Phase::Mods);
        m.player_select_mods(picked, ModChoice::default()).unwrap();
        assert_eq!(m.phase(), Phase::Playing);
    }

    #[test]
    fn test_forced_mods_ignore_request() {
        let seed = [42u8; 32];
        let me = player();
        // find a seed whose roll lets the player pick first
        for day in 0..64 {
            let mut m = Match::seeded(day, 3.0, &seed);
            m.advance(&me).unwrap();
            if m.turn() != Side::Opponent {
                continue;
            }
            m.advance(&me).unwrap();
            m.player_ban(first_open(&m)).unwrap();
            let open = m.available_maps(false);
            let dt = match open.iter().find(|map| map.pool == PoolType::DoubleTime) {
                Some(map) => map.id,
                None => continue,
            };
            m.player_pick(dt).unwrap();
            let step = m.player_select_mods(dt, ModChoice { hr: true, hd: true }).unwrap();
            assert_eq!(
                step,
                Step::ModsSelected {
                    by: Side::Player,
                    map_id: dt,
                    mods: Mods { dt: true, ..Mods::NONE },
                }
            );
            return;
        }
        panic!("no suitable seed");
    }

    #[test]
    fn test_tie_break_at_match_point() {
        // player wins the roll, then the coin alternates until 4 - 4
        let coins = [true, false, true, false, true, false, true, false, true];
        let mut m = flat_match(RuleSet::standard(), &[90, 10], &coins);
        let me = player();

        while m.history().len() < 8 {
            match m.advance(&me).unwrap() {
                Step::AwaitingPlayer(Phase::Ban) => {
                    m.player_ban(first_open(&m)).unwrap();
                }
                Step::AwaitingPlayer(Phase::Pick) => {
                    m.player_pick(first_open(&m)).unwrap();
                }
                Step::AwaitingPlayer(Phase::Mods) => {
                    let id = m.current_map().unwrap().id;
                    m.player_select_mods(id, ModChoice::default()).unwrap();
                }
                Step::TieBreakSelected { .. } => panic!("tie-break before match point"),
                _ => {}
            }
        }
        assert_eq!((m.wins(Side::Player), m.wins(Side::Opponent)), (4, 4));
        assert!(m.is_tie_break());
        assert_eq!(m.phase(), Phase::Pick);
        assert_eq!(m.player_pick(first_open(&m)), Err(MatchError::TieBreakForced));

        assert_eq!(m.advance(&me).unwrap(), Step::TieBreakSelected { map_id: 13 });
        let tb = m.current_map().unwrap();
        assert_eq!(tb.id, 13);
        assert_eq!(tb.state(), MapState::Picked { by: None, playing: true });

        m.advance(&me).unwrap(); // opponent mods
        m.player_select_mods(13, ModChoice { hr: false, hd: true }).unwrap();
        let round = match m.advance(&me).unwrap() {
            Step::RoundPlayed(round) => round,
            other => panic!("unexpected step {:?}", other),
        };
        assert_eq!(round.map_id, 13);
        assert_eq!(round.player_mods, Mods { hd: true, ..Mods::NONE });
        assert!(round.ended);
        assert_eq!(round.winner, Side::Player);
        assert_eq!(m.winner(), Some(Side::Player));
    }

    #[test]
    fn test_no_round_after_end() {
        let coins = [true; 5];
        let mut m = flat_match(RuleSet::standard(), &[90, 10], &coins);
        let winner = play_out(&mut m, &player(), |_| {}).unwrap();
        assert_eq!(winner, Side::Player);
        assert_eq!(m.history().len(), 5);
        assert!(!m.is_tie_break());

        let before = m.snapshot();
        assert_eq!(m.advance(&player()).unwrap(), Step::Finished { winner: Side::Player });
        assert_eq!(m.player_pick(1), Err(MatchError::MatchFinished));
        assert_eq!(m.player_ban(1), Err(MatchError::MatchFinished));
        assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn test_alternate_pick_order() {
        // opponent wins every round but picks still alternate
        let mut m = flat_match(RuleSet::standard(), &[90, 10], &[false; 4]);
        let me = player();
        let mut pickers = Vec::new();
        while m.history().len() < 4 {
            match m.advance(&me).unwrap() {
                Step::AwaitingPlayer(Phase::Ban) => {
                    m.player_ban(first_open(&m)).unwrap();
                }
                Step::AwaitingPlayer(Phase::Pick) => {
                    m.player_pick(first_open(&m)).unwrap();
                    pickers.push(Side::Player);
                }
                Step::Picked { by, .. } => pickers.push(by),
                Step::AwaitingPlayer(Phase::Mods) => {
                    let id = m.current_map().unwrap().id;
                    m.player_select_mods(id, ModChoice::default()).unwrap();
                }
                _ => {}
            }
        }
        use Side::{Opponent as O, Player as P};
        assert_eq!(pickers, vec![O, P, O, P]);
    }

    #[test]
    fn test_winner_picks_order() {
        let mut m = flat_match(RuleSet::legacy(), &[90, 10], &[false, false, true]);
        let me = player();
        let mut pickers = Vec::new();
        while m.history().len() < 3 {
            match m.advance(&me).unwrap() {
                Step::AwaitingPlayer(Phase::Ban) => {
                    m.player_ban(first_open(&m)).unwrap();
                }
                Step::AwaitingPlayer(Phase::Pick) => {
                    m.player_pick(first_open(&m)).unwrap();
                    pickers.push(Side::Player);
                }
                Step::Picked { by, .. } => pickers.push(by),
                Step::AwaitingPlayer(Phase::Mods) => {
                    let id = m.current_map().unwrap().id;
                    m.player_select_mods(id, ModChoice::default()).unwrap();
                }
                _ => {}
            }
        }
        assert_eq!(pickers, vec![Side::Opponent, Side::Opponent, Side::Opponent]);
        assert_eq!(m.turn(), Side::Player);
    }

    #[test]
    fn test_illegal_opponent_choice_aborts() {
        let strategy = ScriptedBans { bans: VecDeque::from(vec![13]) };
        let rng = Scripted::new(&[10, 90], &[]);
        let mut m =
            Match::with_pool(7, 3.0, RuleSet::standard(), flat_pool(), player(), rng, strategy)
                .unwrap();
        let me = player();
        m.advance(&me).unwrap();

        let err = m.advance(&me).unwrap_err();
        assert_eq!(err, MatchError::IllegalOpponentChoice(13));
        assert!(err.is_fatal());
        assert_eq!(m.phase(), Phase::Aborted);
        assert_eq!(m.advance(&me), Err(MatchError::MatchAborted));
        assert_eq!(m.player_ban(1), Err(MatchError::MatchAborted));
        assert!(m.map(13).unwrap().is_available());
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let mut rules = RuleSet::standard();
        rules.max_ban_slots = Some(0);
        let result = Match::with_parts(7, 3.0, rules, SeededRng::from_u64(1), HeuristicOpponent);
        assert!(matches!(result, Err(MatchError::Config(_))));

        let mut rules = RuleSet::standard();
        rules.bonus_units = u32::MAX;
        let result = Match::with_parts(7, 3.0, rules, SeededRng::from_u64(1), HeuristicOpponent);
        assert!(matches!(result, Err(MatchError::Config(_))));
    }

    #[test]
    fn test_pool_without_tie_break_rejected() {
        let maps = MapPool::from_maps(vec![Beatmap::new(1, PoolType::NoMod, 1.0, 1.0, 1.0, 1.0)]);
        let rng = SeededRng::from_u64(1);
        let result =
            Match::with_pool(7, 3.0, RuleSet::standard(), maps, player(), rng, HeuristicOpponent);
        assert!(matches!(result, Err(MatchError::Config(_))));
    }

    #[test]
    fn test_advance_until_player() {
        let mut m = flat_match(RuleSet::standard(), &[10, 90], &[]);
        let steps = m.advance_until_player(&player()).unwrap();
        assert!(matches!(steps[0], Step::Rolled(_)));
        assert!(matches!(steps[1], Step::Banned { by: Side::Opponent, .. }));
        assert_eq!(steps.last(), Some(&Step::AwaitingPlayer(Phase::Ban)));
    }

    #[test]
    fn test_snapshot_serializes() {
        let m = Match::seeded(7, 3.0, &[42u8; 32]);
        let json = serde_json::to_string(&m.snapshot()).unwrap();
        let back: MatchSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.phase, Phase::Roll);
        assert_eq!(back.rounds_to_win, 5);
        assert_eq!(back.maps.len(), m.all_maps().len());
        assert!(back.maps.iter().all(Beatmap::is_available));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_match_invariants(seed in any::<[u8; 32]>(), day in 1u32..40, base in 0.0f64..8.0) {
            let mut m = Match::seeded(day, base, &seed);
            let me = Competitor::new(Attributes::uniform(base + 0.5), 20.0);
            let slots = m.ban_slots();
            let rtw = m.rounds_to_win();

            play_out(&mut m, &me, |m| {
                assert!(m.used_bans(Side::Player) <= slots);
                assert!(m.used_bans(Side::Opponent) <= slots);
                if matches!(m.phase(), Phase::Pick | Phase::Mods | Phase::Playing) {
                    assert_eq!(m.used_bans(Side::Player), slots);
                    assert_eq!(m.used_bans(Side::Opponent), slots);
                }
                for map in m.all_maps() {
                    if map.pool.is_tie_break() {
                        assert!(!map.is_banned());
                        if map.is_picked() {
                            assert!(m.is_tie_break());
                            assert_eq!(map.picked_by(), None);
                        }
                    }
                }
                assert!(m.wins(Side::Player) <= rtw && m.wins(Side::Opponent) <= rtw);
            })
            .unwrap();

            prop_assert!(m.ended());
            prop_assert_eq!(m.history().iter().filter(|r| r.ended).count(), 1);
            let total = m.wins(Side::Player) + m.wins(Side::Opponent);
            prop_assert!(total >= rtw && total <= 2 * rtw - 1);
        }
    }
}
