use std::fmt::{Display, Formatter};
use std::path::Path;
use std::rc::Rc;

use anyhow::Result;
use ql::explore::ExplorationPolicy;
use ql::learn::tabular_learner::{LearnerParameter, TabularLearner};
use rand::Rng;

use crate::action::{QbertAction, ACTION_SLOTS};
use crate::board::{Board, Color, Position};
use crate::encoding::{HazardEncoder, HazardEncoding, PuzzleEncoder, UnifiedEncoder};

/// Everything a learner gets to see from one frame
#[derive(Clone, Debug)]
pub struct Situation {
    pub board: Rc<Board>,
    pub position: Position,
    /// Color of the blocks at level start; `0` while unknown
    pub start_color: Color,
    /// Color the blocks need to get; `0` while unknown
    pub goal_color: Color,
    pub level: u32,
}

/// Decision maker driven frame by frame by the [AgentDriver](crate::driver::AgentDriver)
pub trait Agent {
    fn choose_action<R: Rng + ?Sized>(&mut self, situation: &Situation, rng: &mut R) -> QbertAction;

    /// Learns from the transition into `situation`, reached by `action_taken`
    fn update(&mut self, situation: &Situation, action_taken: QbertAction, reward: f32);

    /// Credits a reward, which arrived while the player stayed in place, to the last transition
    fn correct_update(&mut self, reward: f32);

    /// Ends an episode and persists what was learned
    fn reset(&mut self) -> Result<()>;

    /// Fraction of exploratory actions in the current episode
    fn random_fraction(&self) -> f32;
}

/// Game rewards decomposed into the share of each learner.
///
/// Block color changes are worth 25 points, everything else (catching green creatures, discs,
/// level bonus, penalties) is a multiple of 100. So the part below 100 belongs to the puzzle,
/// the rest to the enemies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewardSplit {
    pub puzzle: f32,
    pub hazard: f32,
}

impl RewardSplit {
    // TODO revisit when rewards other than multiples of 25 show up; those leak into the puzzle share
    pub fn of(reward: f32) -> Self {
        let puzzle = reward.rem_euclid(100.0);
        Self {
            puzzle,
            hazard: reward - puzzle,
        }
    }
}

/// Arbiter configurations, which differ in how enemies are perceived
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubsumptionVariant {
    V1,
    V2,
    V3,
}

impl SubsumptionVariant {
    pub fn hazard_encoding(&self) -> HazardEncoding {
        match self {
            SubsumptionVariant::V1 => HazardEncoding::Basic,
            SubsumptionVariant::V2 => HazardEncoding::SeparateChaser,
            SubsumptionVariant::V3 => HazardEncoding::SeparateChaserWide,
        }
    }

    fn index(&self) -> u8 {
        match self {
            SubsumptionVariant::V1 => 1,
            SubsumptionVariant::V2 => 2,
            SubsumptionVariant::V3 => 3,
        }
    }

    pub fn puzzle_learner_name(&self) -> String {
        format!("s{}-block-solver", self.index())
    }

    pub fn hazard_learner_name(&self) -> String {
        format!("s{}-enemy-avoider", self.index())
    }
}

impl Display for SubsumptionVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "subsumption-v{} ({})", self.index(), self.hazard_encoding())
    }
}

/// Two specialized learners: the block solver acts by default, the enemy avoider takes over
/// whenever an enemy comes close. Both learn from every transition.
pub struct SubsumptionArbiter {
    hazard_encoding: HazardEncoding,
    puzzle_learner: TabularLearner<PuzzleEncoder, ACTION_SLOTS>,
    hazard_learner: TabularLearner<HazardEncoder, ACTION_SLOTS>,
    hazard_learner_authoritative: bool,
}

impl SubsumptionArbiter {
    pub fn new(variant: SubsumptionVariant, policy: ExplorationPolicy, param: LearnerParameter, table_dir: &Path) -> Result<Self> {
        let hazard_encoding = variant.hazard_encoding();
        let puzzle_learner = TabularLearner::new(&variant.puzzle_learner_name(), PuzzleEncoder, policy, param.clone(), table_dir)?;
        let hazard_learner = TabularLearner::new(&variant.hazard_learner_name(), HazardEncoder(hazard_encoding), policy, param, table_dir)?;
        log::info!("agent: {}", variant);
        Ok(Self {
            hazard_encoding,
            puzzle_learner,
            hazard_learner,
            hazard_learner_authoritative: false,
        })
    }

    pub fn has_hazard_nearby(&self, situation: &Situation) -> bool {
        self.hazard_encoding.has_hazard_nearby(&situation.board, situation.position)
    }

    pub fn puzzle_learner(&self) -> &TabularLearner<PuzzleEncoder, ACTION_SLOTS> {
        &self.puzzle_learner
    }

    pub fn hazard_learner(&self) -> &TabularLearner<HazardEncoder, ACTION_SLOTS> {
        &self.hazard_learner
    }

    /// Whether the latest chosen action came from the enemy avoider
    pub fn hazard_learner_authoritative(&self) -> bool {
        self.hazard_learner_authoritative
    }
}

impl Agent for SubsumptionArbiter {
    fn choose_action<R: Rng + ?Sized>(&mut self, situation: &Situation, rng: &mut R) -> QbertAction {
        self.hazard_learner_authoritative = self.has_hazard_nearby(situation);
        if self.hazard_learner_authoritative {
            self.hazard_learner.choose_action(situation, rng)
        } else {
            self.puzzle_learner.choose_action(situation, rng)
        }
    }

    fn update(&mut self, situation: &Situation, action_taken: QbertAction, reward: f32) {
        let split = RewardSplit::of(reward);
        self.puzzle_learner.update(situation, action_taken, split.puzzle);
        self.hazard_learner.update(situation, action_taken, split.hazard);
        if self.hazard_learner_authoritative {
            self.hazard_learner.notify_action_taken();
        } else {
            self.puzzle_learner.notify_action_taken();
        }
    }

    fn correct_update(&mut self, reward: f32) {
        let split = RewardSplit::of(reward);
        self.puzzle_learner.correct_update(split.puzzle);
        self.hazard_learner.correct_update(split.hazard);
    }

    fn reset(&mut self) -> Result<()> {
        self.hazard_learner_authoritative = false;
        let puzzle_result = self.puzzle_learner.reset();
        let hazard_result = self.hazard_learner.reset();
        puzzle_result.and(hazard_result)
    }

    fn random_fraction(&self) -> f32 {
        let random = self.puzzle_learner.random_action_count() + self.hazard_learner.random_action_count();
        let total = self.puzzle_learner.total_action_count() + self.hazard_learner.total_action_count();
        match total {
            0 => 0.0,
            total => random as f32 / total as f32,
        }
    }
}

/// A single learner over the unified view, dealing with blocks and enemies at once
pub struct MonolithicAgent {
    learner: TabularLearner<UnifiedEncoder, ACTION_SLOTS>,
}

impl MonolithicAgent {
    pub const LEARNER_NAME: &'static str = "monolithic-learner";

    pub fn new(policy: ExplorationPolicy, param: LearnerParameter, table_dir: &Path) -> Result<Self> {
        let learner = TabularLearner::new(Self::LEARNER_NAME, UnifiedEncoder, policy, param, table_dir)?;
        log::info!("agent: monolithic");
        Ok(Self { learner })
    }

    pub fn learner(&self) -> &TabularLearner<UnifiedEncoder, ACTION_SLOTS> {
        &self.learner
    }
}

impl Agent for MonolithicAgent {
    fn choose_action<R: Rng + ?Sized>(&mut self, situation: &Situation, rng: &mut R) -> QbertAction {
        self.learner.choose_action(situation, rng)
    }

    fn update(&mut self, situation: &Situation, action_taken: QbertAction, reward: f32) {
        self.learner.update(situation, action_taken, reward);
        self.learner.notify_action_taken();
    }

    fn correct_update(&mut self, reward: f32) {
        self.learner.correct_update(reward);
    }

    fn reset(&mut self) -> Result<()> {
        self.learner.reset()
    }

    fn random_fraction(&self) -> f32 {
        self.learner.random_fraction()
    }
}
