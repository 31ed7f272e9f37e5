//! Integration test suite for chief.
//!
//! These tests drive the public API end to end: planning a scenario,
//! running it through the simulated orchestrator and checking the
//! outcome. No network access is needed.
//!
//! # Test Categories
//!
//! - `scenario_e2e`: Full scenario runs through `ScenarioRunner`
//! - `planner_properties`: Structural properties of every plan
//! - `simulated_orchestrator`: Scheduling, failure and budget behaviour
//! - `config_layering`: Config file, environment and orchestrator selection

mod fixtures;

mod config_layering;
mod planner_properties;
mod scenario_e2e;
mod simulated_orchestrator;
