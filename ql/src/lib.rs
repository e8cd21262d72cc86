pub mod explore;
pub mod learn;
pub mod log;
pub mod prelude;
