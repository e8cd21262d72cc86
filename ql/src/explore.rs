use std::fmt::{Display, Formatter};

use anyhow::Result;
use rand::Rng;

use crate::prelude::QlError;

/// Decides whether a state, whose legal actions have been tried at least `visit_count` times,
/// should be explored with a random action instead of exploiting the learned utilities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ExplorationPolicy {
    /// Random action with a fixed probability, regardless of the visit count
    EpsilonGreedy { epsilon: f64 },
    /// Random action with probability `1 / (visit_count + 1)`
    InverseProportional,
    /// Random action as long as `visit_count < threshold`
    Threshold { threshold: u32 },
}

impl ExplorationPolicy {
    pub fn should_explore<R: Rng + ?Sized>(&self, visit_count: u32, rng: &mut R) -> bool {
        match *self {
            ExplorationPolicy::EpsilonGreedy { epsilon } => rng.gen::<f64>() < epsilon,
            ExplorationPolicy::InverseProportional => rng.gen_range(0..=visit_count) == 0,
            ExplorationPolicy::Threshold { threshold } => visit_count < threshold,
        }
    }

    /// Parses a policy by name, e.g. `("epsilon_greedy", Some("0.1"))` or `("inverse_proportional", None)`
    pub fn parse(name: &str, argument: Option<&str>) -> Result<Self> {
        match name {
            "inverse_proportional" => Ok(ExplorationPolicy::InverseProportional),
            "epsilon_greedy" => {
                let epsilon = argument
                    .and_then(|a| a.parse::<f64>().ok())
                    .ok_or_else(|| QlError::from("missing epsilon"))?;
                if !(0.0..=1.0).contains(&epsilon) {
                    return Err(QlError(format!("epsilon {} out of range [0, 1]", epsilon)).into());
                }
                Ok(ExplorationPolicy::EpsilonGreedy { epsilon })
            }
            "threshold" => {
                let threshold = argument
                    .and_then(|a| a.parse::<u32>().ok())
                    .ok_or_else(|| QlError::from("missing threshold"))?;
                Ok(ExplorationPolicy::Threshold { threshold })
            }
            _ => Err(QlError(format!("invalid exploration policy '{}'", name)).into()),
        }
    }
}

impl Default for ExplorationPolicy {
    fn default() -> Self {
        ExplorationPolicy::InverseProportional
    }
}

impl Display for ExplorationPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExplorationPolicy::EpsilonGreedy { epsilon } => write!(f, "epsilon_greedy {}", epsilon),
            ExplorationPolicy::InverseProportional => write!(f, "inverse_proportional"),
            ExplorationPolicy::Threshold { threshold } => write!(f, "threshold {}", threshold),
        }
    }
}
