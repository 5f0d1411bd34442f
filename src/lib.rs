pub mod cli;
pub mod config;
pub mod data;
pub mod logging;
pub mod optimizer;
pub mod parallel;
pub mod server;

pub use config::RosterConstraints;
pub use data::candidate::{Candidate, Position, PositionCategory};
pub use optimizer::{optimize_roster, OptimizeError, Solution};
