//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - Building plans with the default planner config
//! - Runners backed by a latency-free simulated orchestrator
//! - Querying the recorded event stream

use std::time::Duration;

use chief::orchestration::{OrchestratorEvent, SimulatedOrchestrator, SimulationConfig};
use chief::runner::{RunOutcome, ScenarioRunner};
use chief::scenario::{self, PlannerConfig, Scenario, ScenarioPlan};

pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

pub fn plan_for(scenario: Scenario) -> ScenarioPlan {
    scenario::plan(scenario, &PlannerConfig::default()).expect("built-in scenario must plan")
}

pub fn runner_with(config: SimulationConfig) -> ScenarioRunner<SimulatedOrchestrator> {
    ScenarioRunner::new(SimulatedOrchestrator::new(config), TEST_TIMEOUT)
}

/// Run `plan` and return its outcome with every event the callback saw.
pub async fn run_recorded(
    plan: &ScenarioPlan,
    config: SimulationConfig,
) -> (RunOutcome, EventLog) {
    let mut events = Vec::new();
    let outcome = runner_with(config)
        .run(plan, |e| events.push(e.clone()))
        .await
        .expect("run should finish");
    (outcome, EventLog(events))
}

/// Recorded events in emission order.
pub struct EventLog(pub Vec<OrchestratorEvent>);

impl EventLog {
    pub fn started(&self, id: &str) -> Option<usize> {
        self.0.iter().position(
            |e| matches!(e, OrchestratorEvent::TaskStarted { task, .. } if task == id),
        )
    }

    pub fn completed(&self, id: &str) -> Option<usize> {
        self.0.iter().position(
            |e| matches!(e, OrchestratorEvent::TaskCompleted { task, .. } if task == id),
        )
    }

    pub fn failed(&self, id: &str) -> Option<&str> {
        self.0.iter().find_map(|e| match e {
            OrchestratorEvent::TaskFailed { task, error } if task == id => Some(error.as_str()),
            _ => None,
        })
    }

    pub fn count(&self, pred: impl Fn(&OrchestratorEvent) -> bool) -> usize {
        self.0.iter().filter(|e| pred(e)).count()
    }
}
