//! Q*bert player built on tabular Q-learning: two learners arbitrated by subsumption,
//! or a single monolithic one.

pub mod action;
pub mod agent;
pub mod board;
pub mod driver;
pub mod encoding;
pub mod util;
