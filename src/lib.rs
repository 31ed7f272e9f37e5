pub mod agent;
pub mod config;
pub mod core;
pub mod error;
pub mod log;
pub mod orchestration;
pub mod render;
pub mod runner;
pub mod scenario;

pub use error::{Error, Result};
pub use runner::{RunOutcome, ScenarioRunner};
pub use scenario::{Scenario, ScenarioPlan};
