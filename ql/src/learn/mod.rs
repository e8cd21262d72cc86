pub mod persistence;
pub mod table;
pub mod tabular_learner;
