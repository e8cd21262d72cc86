use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use itertools::Itertools;
use num_format::ToFormattedString;
use ql::prelude::{Action, DebugVisualizer};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use crate::action::QbertAction;
use crate::agent::{Agent, Situation};
use crate::board::{Board, Color, Position};
use crate::util;

/// Reward added for each lost life. A multiple of 100, so it goes entirely to the enemy avoider.
pub const LIFE_LOST_PENALTY: f32 = -1000.0;

/// The emulated game, as far as the agent needs to see it
pub trait GameEnvironment {
    /// Board snapshot of the current frame
    fn board(&self) -> Rc<Board>;

    /// Console memory of the current frame
    fn ram(&self) -> &[u8];

    /// Target block color, as shown on screen; `0` while not displayed
    fn goal_color(&self) -> Color;

    /// Executes one frame with the given joystick action and returns the points earned
    fn act(&mut self, action: QbertAction) -> f32;

    fn lives(&self) -> u32;

    fn game_over(&self) -> bool;

    fn reset(&mut self);
}

/// The game reads the joystick only on frames where the first byte of the console memory is zero
/// and the lowest bit of the last byte is set.
pub fn accepting_input(ram: &[u8]) -> bool {
    matches!((ram.first(), ram.last()), (Some(0), Some(last)) if last & 1 == 1)
}

#[derive(Clone, Debug)]
pub struct DriverParameter {
    /// Seed of the random number generator used for exploration and tie breaks
    pub seed: u64,
    /// An episode is cut off after this many frames
    pub max_frames_per_episode: Option<u64>,
}

impl Default for DriverParameter {
    fn default() -> Self {
        Self {
            seed: 0,
            max_frames_per_episode: Some(500_000),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpisodeRecord {
    pub episode: u64,
    pub score: f32,
    pub random_fraction: f32,
}

/// CSV sink with one row per finished episode
pub struct EpisodeLog {
    writer: Box<dyn Write>,
}

impl EpisodeLog {
    pub const HEADER: &'static str = "Episode,Score,RandomFraction";

    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("failed to create episode log {}", path.display()))?;
        Self::new(Box::new(BufWriter::new(file)))
    }

    pub fn new(mut writer: Box<dyn Write>) -> Result<Self> {
        writeln!(writer, "{}", Self::HEADER)?;
        Ok(Self { writer })
    }

    pub fn append(&mut self, record: &EpisodeRecord) -> Result<()> {
        writeln!(self.writer, "{},{},{}", record.episode, record.score, record.random_fraction)?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Plays the game with an [Agent]: feeds it a [Situation] whenever the player landed on a new
/// cell and executes its decisions.
pub struct AgentDriver<E: GameEnvironment, A: Agent, R: Rng> {
    environment: E,
    agent: A,
    param: DriverParameter,
    rng: R,
    episode_log: Option<EpisodeLog>,
    episode: u64,
    high_score: f32,
    // per episode
    action: QbertAction,
    pending_reward: f32,
    score: f32,
    lives: u32,
    last_position: Option<Position>,
    start_color: Color,
    goal_color: Color,
    start_color_outdated: bool,
    level: u32,
    action_counts: FxHashMap<QbertAction, u64>,
}

impl<E: GameEnvironment, A: Agent> AgentDriver<E, A, StdRng> {
    pub fn new(environment: E, agent: A, param: DriverParameter) -> Self {
        let rng = StdRng::seed_from_u64(param.seed);
        Self::with_rng(environment, agent, param, rng)
    }
}

impl<E: GameEnvironment, A: Agent, R: Rng> AgentDriver<E, A, R> {
    pub fn with_rng(environment: E, agent: A, param: DriverParameter, rng: R) -> Self {
        let lives = environment.lives();
        Self {
            environment,
            agent,
            param,
            rng,
            episode_log: None,
            episode: 0,
            high_score: 0.0,
            action: QbertAction::NoOp,
            pending_reward: 0.0,
            score: 0.0,
            lives,
            last_position: None,
            start_color: 0,
            goal_color: 0,
            start_color_outdated: false,
            level: 0,
            action_counts: FxHashMap::default(),
        }
    }

    pub fn with_episode_log(mut self, episode_log: EpisodeLog) -> Self {
        self.episode_log = Some(episode_log);
        self
    }

    /// Processes one frame
    pub fn step_frame(&mut self) {
        let reward = self.environment.act(self.action);
        self.pending_reward += reward;
        self.score += reward;
        self.high_score = self.high_score.max(self.score);

        let lives = self.environment.lives();
        if lives < self.lives {
            log::debug!("life lost, {} left", lives);
            self.pending_reward += LIFE_LOST_PENALTY;
        }
        self.lives = lives;

        let goal_color = self.environment.goal_color();
        if goal_color != 0 && goal_color != self.goal_color {
            if self.goal_color != 0 {
                self.level += 1;
            }
            self.goal_color = goal_color;
            self.start_color_outdated = true;
            log::debug!("level {}, goal color {}", self.level, goal_color);
        }

        if !accepting_input(self.environment.ram()) {
            return;
        }

        let board = self.environment.board();
        if self.start_color_outdated {
            self.start_color = board.dominant_color();
            self.start_color_outdated = false;
        }
        let Some(position) = board.player_position() else {
            return;
        };

        if self.last_position != Some(position) {
            log::trace!("{}", board.one_line_info());
            let situation = Situation {
                board,
                position,
                start_color: self.start_color,
                goal_color: self.goal_color,
                level: self.level,
            };
            self.agent.update(&situation, self.action, self.pending_reward);
            self.action = self.agent.choose_action(&situation, &mut self.rng);
            *self.action_counts.entry(self.action).or_default() += 1;
            self.pending_reward = 0.0;
            self.last_position = Some(position);
        } else if self.pending_reward != 0.0 {
            self.agent.correct_update(self.pending_reward);
            self.pending_reward = 0.0;
        }
    }

    /// Plays until the game is over, then lets the agent persist what it learned and starts a new game.
    ///
    /// Only a failing episode log is an error. A failure to persist the learning tables is logged
    /// and the agent keeps on learning in memory.
    pub fn run_episode(&mut self) -> Result<EpisodeRecord> {
        self.episode += 1;
        let mut frames = 0_u64;
        while !self.environment.game_over() {
            if matches!(self.param.max_frames_per_episode, Some(max) if frames >= max) {
                log::warn!("episode {} cut off after {} frames", self.episode, frames);
                break;
            }
            self.step_frame();
            frames += 1;
        }

        let record = EpisodeRecord {
            episode: self.episode,
            score: self.score,
            random_fraction: self.agent.random_fraction(),
        };
        self.episode_log_line(&record, frames)?;

        if let Err(e) = self.agent.reset() {
            log::warn!("failed to persist the learning tables: {:#}", e);
        }
        self.environment.reset();
        self.reset_episode_state();

        if let Some(episode_log) = self.episode_log.as_mut() {
            episode_log.append(&record)?;
        }
        Ok(record)
    }

    pub fn run(&mut self, episodes: u64) -> Result<Vec<EpisodeRecord>> {
        (0..episodes).map(|_| self.run_episode()).collect()
    }

    fn reset_episode_state(&mut self) {
        self.action = QbertAction::NoOp;
        self.pending_reward = 0.0;
        self.score = 0.0;
        self.lives = self.environment.lives();
        self.last_position = None;
        self.start_color = 0;
        self.goal_color = 0;
        self.start_color_outdated = false;
        self.level = 0;
        self.action_counts.clear();
    }

    fn episode_log_line(&self, record: &EpisodeRecord, frames: u64) -> Result<()> {
        let number_format = util::number_format()?;
        let total_actions: u64 = self.action_counts.values().sum();
        let action_distribution_line = self
            .action_counts
            .iter()
            .sorted_by_key(|(action, _)| action.numeric())
            .map(|(action, &count)| format!("{} {:.1}%", action, 100.0 * count as f32 / total_actions as f32))
            .join(", ");

        log::info!(
            "episode: {}, frames: {}, score: {}, high score: {}, level: {}, random: {:.1}%\n\
    action_distribution (of {}): {}",
            record.episode.to_formatted_string(&number_format),
            frames.to_formatted_string(&number_format),
            (record.score as i64).to_formatted_string(&number_format),
            (self.high_score as i64).to_formatted_string(&number_format),
            self.level,
            100.0 * record.random_fraction,
            total_actions.to_formatted_string(&number_format),
            action_distribution_line
        );
        Ok(())
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn environment(&self) -> &E {
        &self.environment
    }

    pub fn episode(&self) -> u64 {
        self.episode
    }

    pub fn high_score(&self) -> f32 {
        self.high_score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// (start color, goal color) as currently known
    pub fn colors(&self) -> (Color, Color) {
        (self.start_color, self.goal_color)
    }
}
