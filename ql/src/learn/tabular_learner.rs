use std::path::{Path, PathBuf};

use anyhow::Result;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::explore::ExplorationPolicy;
use crate::learn::persistence;
use crate::learn::table::{QTable, VisitTable};
use crate::prelude::{Action, QlError, StateKey, View};

/// Maps an observation into the encoding space of one learner.
pub trait StateEncoder {
    type View: View;
    type Observation;
    type Action: Action;

    fn encode(&self, observation: &Self::Observation) -> StateKey<Self::View>;

    /// All movements, which do not lead into certain death (the no-action is not part of it)
    fn moves(&self, observation: &Self::Observation) -> Vec<Self::Action>;
}

#[derive(Clone, Debug)]
pub struct LearnerParameter {
    /// Learning rate (0 < α <= 1)
    pub alpha: f32,
    /// Discount rate; (0 <= 𝛾 <= 1) represents the value of future rewards. The bigger, the more farsighted the agent becomes
    pub gamma: f32,
    /// Whether doing nothing counts as a legal action
    pub allow_noop: bool,
}

impl Default for LearnerParameter {
    fn default() -> Self {
        Self {
            alpha: 0.10,
            gamma: 0.90,
            allow_noop: false,
        }
    }
}

/// Q-learning over a lookup table.
///
/// Keeps one utility row and one visit-count row (`N` action slots each) per encoded state and remembers
/// the most recent transition between two [update](Self::update) calls.
/// The tables survive episodes and are persisted to `<table_dir>/<name>.qtable` on [reset](Self::reset).
pub struct TabularLearner<E: StateEncoder, const N: usize> {
    name: String,
    encoder: E,
    policy: ExplorationPolicy,
    param: LearnerParameter,
    table_file: PathBuf,
    utilities: QTable<E::View, N>,
    visits: VisitTable<E::View, N>,
    current_state: Option<StateKey<E::View>>,
    last_state: Option<StateKey<E::View>>,
    last_action: E::Action,
    random_action_count: u64,
    total_action_count: u64,
    is_random_action: bool,
}

impl<E: StateEncoder, const N: usize> TabularLearner<E, N> {
    /// Creates a learner, continuing with the tables persisted under `table_dir` if there are any.
    pub fn new(name: &str, encoder: E, policy: ExplorationPolicy, param: LearnerParameter, table_dir: &Path) -> Result<Self> {
        if N != E::Action::ACTION_SPACE as usize {
            return Err(QlError(format!("{} table slots do not match an action space of {}", N, E::Action::ACTION_SPACE)).into());
        }
        let table_file = table_dir.join(format!("{}.qtable", name));
        let (utilities, visits) = persistence::load_tables(&table_file)?;
        log::info!("learner {} ({}, {}): {} known states", name, E::View::NAME, policy, utilities.len());

        Ok(Self {
            name: name.to_owned(),
            encoder,
            policy,
            param,
            table_file,
            utilities,
            visits,
            current_state: None,
            last_state: None,
            last_action: E::Action::no_action(),
            random_action_count: 0,
            total_action_count: 0,
            is_random_action: false,
        })
    }

    /// Returns the best action for the observed situation from the point of view of this learner.
    ///
    /// Explores a uniformly chosen legal action when the exploration policy says so (asked with the
    /// smallest visit count among the legal actions); otherwise picks uniformly among the legal actions
    /// with the highest utility.
    pub fn choose_action<R: Rng + ?Sized>(&mut self, observation: &E::Observation, rng: &mut R) -> E::Action {
        let state = self.encoder.encode(observation);
        let actions = self.legal_actions(observation);

        let visits = self.visits.get(state);
        let min_visited = actions.iter().map(|a| visits[slot(a)]).min().unwrap_or(0);

        self.is_random_action = self.policy.should_explore(min_visited, rng);
        let candidates = if self.is_random_action {
            actions
        } else {
            let utilities = self.utilities.get(state);
            let q_max = max_utility(&utilities, &actions);
            actions.into_iter().filter(|a| utilities[slot(a)] == q_max).collect()
        };

        let action = *candidates.choose(rng).unwrap_or(&E::Action::no_action());
        log::trace!(
            "{}: state {:?} -> {} ({})",
            self.name,
            state,
            action,
            if self.is_random_action { "explore" } else { "exploit" }
        );
        action
    }

    /// Moves on to the observed state and credits `reward` to the transition, which led here with `action_taken`:
    ///
    /// `Q[prev][a] += α · (reward + γ · max_a' Q[curr][a'] − Q[prev][a])`
    ///
    /// where `a'` ranges over the actions legal from the current state.
    pub fn update(&mut self, observation: &E::Observation, action_taken: E::Action, reward: f32) {
        self.last_state = self.current_state;
        let current_state = self.encoder.encode(observation);
        self.current_state = Some(current_state);
        self.last_action = action_taken;

        if let Some(last_state) = self.last_state {
            let actions = self.legal_actions(observation);
            let q_max = max_utility(&self.utilities.get(current_state), &actions);
            let slot = slot(&action_taken);
            let q = &mut self.utilities.row_mut(last_state)[slot];
            *q += self.param.alpha * (reward + self.param.gamma * q_max - *q);
            self.visits.increment(last_state, slot);
        }
    }

    /// Assigns an additional reward to the most recent transition, without changing the state.
    pub fn correct_update(&mut self, reward: f32) {
        if let Some(last_state) = self.last_state {
            self.utilities.row_mut(last_state)[slot(&self.last_action)] += self.param.alpha * reward;
        }
    }

    /// Notifies this learner that its suggested action was taken
    pub fn notify_action_taken(&mut self) {
        self.total_action_count += 1;
        if self.is_random_action {
            self.random_action_count += 1;
        }
    }

    /// Ends an episode: forgets the transition trace, zeroes the action counters and persists the tables.
    ///
    /// A persistence error leaves the learner fully usable; the in-memory tables stay authoritative.
    pub fn reset(&mut self) -> Result<()> {
        self.current_state = None;
        self.last_state = None;
        self.last_action = E::Action::no_action();
        self.random_action_count = 0;
        self.total_action_count = 0;
        self.is_random_action = false;
        self.save()
    }

    pub fn save(&self) -> Result<()> {
        persistence::save_tables(&self.table_file, &self.utilities, &self.visits)
    }

    pub fn legal_actions(&self, observation: &E::Observation) -> Vec<E::Action> {
        let mut actions = self.encoder.moves(observation);
        if self.param.allow_noop || actions.is_empty() {
            actions.push(E::Action::no_action());
        }
        actions
    }

    pub fn encode(&self, observation: &E::Observation) -> StateKey<E::View> {
        self.encoder.encode(observation)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_file(&self) -> &Path {
        &self.table_file
    }

    pub fn utilities(&self) -> &QTable<E::View, N> {
        &self.utilities
    }

    pub fn visits(&self) -> &VisitTable<E::View, N> {
        &self.visits
    }

    /// The (previous state, current state) pair of the transition trace
    pub fn trace(&self) -> (Option<StateKey<E::View>>, Option<StateKey<E::View>>) {
        (self.last_state, self.current_state)
    }

    pub fn random_action_count(&self) -> u64 {
        self.random_action_count
    }

    pub fn total_action_count(&self) -> u64 {
        self.total_action_count
    }

    pub fn random_fraction(&self) -> f32 {
        match self.total_action_count {
            0 => 0.0,
            total => self.random_action_count as f32 / total as f32,
        }
    }
}

fn slot<A: Action>(action: &A) -> usize {
    action.numeric() as usize
}

fn max_utility<A: Action, const N: usize>(utilities: &[f32; N], actions: &[A]) -> f32 {
    actions
        .iter()
        .map(|a| utilities[slot(a)])
        .fold(f32::NEG_INFINITY, f32::max)
}
