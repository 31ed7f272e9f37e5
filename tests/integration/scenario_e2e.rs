//! End-to-end scenario runs.
//!
//! Each test plans a built-in scenario and drives it through
//! `ScenarioRunner` with the simulated orchestrator.

use std::collections::HashSet;

use chief::agent::AgentRole;
use chief::orchestration::{GateStatus, OrchestratorEvent, SimulationConfig};
use chief::scenario::Scenario;

use crate::fixtures::{plan_for, run_recorded, runner_with};

/// Given the basic scenario
/// When it runs with every gate passing
/// Then three tasks are queued, one per distinct role, and all complete
#[tokio::test]
async fn test_basic_queues_three_tasks_and_completes() {
    let plan = plan_for(Scenario::Basic);
    let (outcome, events) = run_recorded(&plan, SimulationConfig::instant()).await;

    let queued: Vec<&str> = outcome.queued.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(queued, vec!["comprehend", "generate", "test"]);

    let roles: Vec<AgentRole> = plan.tasks.iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![AgentRole::Analyst, AgentRole::Developer, AgentRole::Tester]
    );
    let distinct: HashSet<AgentRole> = roles.iter().copied().collect();
    assert_eq!(distinct.len(), 3);

    assert_eq!(outcome.report.tasks_completed, outcome.report.total_tasks);
    assert_eq!(outcome.report.total_tasks, 3);
    assert!(outcome.is_success());

    let json = serde_json::to_value(&outcome.report).unwrap();
    assert_eq!(json["tasksCompleted"], json["totalTasks"]);

    assert_eq!(
        events.count(|e| matches!(e, OrchestratorEvent::TaskStarted { .. })),
        3
    );
}

/// Given the enterprise scenario
/// When it is queued
/// Then five tasks arrive and validate/generate-frontend carry the right dependencies
#[tokio::test]
async fn test_enterprise_queues_five_tasks_with_dependencies() {
    let plan = plan_for(Scenario::Enterprise);
    let (outcome, events) = run_recorded(&plan, SimulationConfig::instant()).await;

    assert_eq!(outcome.queued.len(), 5);

    let validate = plan.task("validate").unwrap();
    let deps: Vec<&str> = validate.dependencies.iter().map(|d| d.as_str()).collect();
    assert_eq!(deps, vec!["generate", "test"]);

    let frontend = plan.task("generate-frontend").unwrap();
    let deps: Vec<&str> = frontend.dependencies.iter().map(|d| d.as_str()).collect();
    assert_eq!(deps, vec!["generate"]);

    assert!(events.completed("generate").unwrap() < events.started("generate-frontend").unwrap());
    assert!(events.completed("test").unwrap() < events.started("validate").unwrap());
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_every_scenario_succeeds_with_defaults() {
    for scenario in Scenario::all() {
        let plan = plan_for(scenario);
        let (outcome, _) = run_recorded(&plan, SimulationConfig::instant()).await;
        assert!(outcome.is_success(), "{} should succeed", scenario);
        assert_eq!(outcome.agents.len(), plan.roles.len());
        assert!(outcome.report.total_tokens <= plan.total_token_budget());
    }
}

/// Given a fullstack run where the tests gate reports an error
/// Then the run is not a success even though every task completed
#[tokio::test]
async fn test_gate_error_fails_fullstack() {
    let config = SimulationConfig {
        gates: vec![
            chief::orchestration::GateSpec::new("lint", GateStatus::Skipped),
            chief::orchestration::GateSpec::new("tests", GateStatus::Error),
        ],
        ..SimulationConfig::instant()
    };
    let (outcome, _) = run_recorded(&plan_for(Scenario::Fullstack), config).await;
    assert!(outcome.report.all_completed());
    assert!(!outcome.is_success());
    let rejected: Vec<&str> = outcome.rejected_gates().map(|g| g.gate.as_str()).collect();
    assert_eq!(rejected, vec!["tests"]);
}

#[tokio::test]
async fn test_check_reports_all_scenarios_clean() {
    for scenario in Scenario::all() {
        let report = runner_with(SimulationConfig::instant())
            .check(&plan_for(scenario))
            .await
            .unwrap();
        assert!(report.passed(), "{}: {:?}", scenario, report.problems);
    }
}

#[tokio::test]
async fn test_outcome_json_shape() {
    let (outcome, _) = run_recorded(&plan_for(Scenario::Basic), SimulationConfig::instant()).await;
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["scenario"], "basic");
    assert_eq!(json["queued"].as_array().unwrap().len(), 3);
    assert_eq!(json["report"]["tasksFailed"], 0);
    assert!(json["failures"].as_array().unwrap().is_empty());
}
