//! Scheduling behaviour of the simulated orchestrator under full scenarios.

use std::time::Duration;

use chief::orchestration::{
    GateSpec, GateStatus, Orchestrator, OrchestratorEvent, SimulatedOrchestrator, SimulationConfig,
};
use chief::runner::ScenarioRunner;
use chief::scenario::Scenario;
use chief::Error;

use crate::fixtures::{plan_for, run_recorded};

#[tokio::test]
async fn test_dependents_never_start_before_dependencies_complete() {
    let plan = plan_for(Scenario::Fullstack);
    let config = SimulationConfig {
        task_latency_ms: 20,
        max_concurrent: 5,
        ..SimulationConfig::default()
    };
    let (_, events) = run_recorded(&plan, config).await;

    for task in &plan.tasks {
        let start = events.started(task.id.as_str()).unwrap();
        for dep in &task.dependencies {
            let done = events.completed(dep.as_str()).unwrap();
            assert!(done < start, "'{}' started before '{}' completed", task.id, dep);
        }
    }
}

#[tokio::test]
async fn test_failure_spares_siblings() {
    let config = SimulationConfig {
        fail_tasks: vec!["test".to_string()],
        ..SimulationConfig::instant()
    };
    let (outcome, events) = run_recorded(&plan_for(Scenario::Enterprise), config).await;

    assert!(events.failed("test").unwrap().contains("simulated failure"));
    assert_eq!(events.failed("validate"), Some("dependency 'test' failed"));
    assert!(events.started("validate").is_none());
    assert!(events.completed("generate-frontend").is_some());

    assert_eq!(outcome.report.tasks_failed, 2);
    assert_eq!(outcome.report.tasks_completed, 3);
    assert_eq!(outcome.report.unfinished(), 0);
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn test_root_failure_fails_everything_downstream() {
    let config = SimulationConfig {
        fail_tasks: vec!["comprehend".to_string()],
        ..SimulationConfig::instant()
    };
    let (outcome, events) = run_recorded(&plan_for(Scenario::Fullstack), config).await;

    assert_eq!(outcome.report.tasks_completed, 0);
    assert_eq!(outcome.report.tasks_failed, 5);
    assert_eq!(
        events.count(|e| matches!(e, OrchestratorEvent::TaskStarted { .. })),
        1
    );
    let failed: Vec<&str> = outcome.failures.iter().map(|f| f.task.as_str()).collect();
    assert_eq!(failed[0], "comprehend");
    assert_eq!(failed.len(), 5);
}

#[tokio::test]
async fn test_budget_exhaustion_fails_tasks() {
    // comprehend costs 3000 tokens = 0.045 USD; generate would add 0.09.
    let config = SimulationConfig {
        budget_limit: Some(0.1),
        ..SimulationConfig::instant()
    };
    let (outcome, events) = run_recorded(&plan_for(Scenario::Basic), config).await;

    assert!(events.completed("comprehend").is_some());
    assert!(events.failed("generate").unwrap().contains("budget limit of $0.10"));
    assert_eq!(events.failed("test"), Some("dependency 'generate' failed"));
    assert!(outcome.report.total_cost <= 0.1);
    assert!(!outcome.is_success());
}

#[tokio::test]
async fn test_skipped_gates_do_not_fail_run() {
    let config = SimulationConfig {
        gates: vec![
            GateSpec::new("lint", GateStatus::Skipped),
            GateSpec::new("tests", GateStatus::Skipped),
        ],
        ..SimulationConfig::instant()
    };
    let (outcome, events) = run_recorded(&plan_for(Scenario::Fullstack), config).await;
    assert_eq!(
        events.count(|e| matches!(e, OrchestratorEvent::QualityGateResult { .. })),
        2
    );
    assert!(outcome.is_success());
}

#[tokio::test(start_paused = true)]
async fn test_run_exceeding_timeout_returns_execution_timeout() {
    let config = SimulationConfig {
        task_latency_ms: 30_000,
        ..SimulationConfig::default()
    };
    let mut runner = ScenarioRunner::new(
        SimulatedOrchestrator::new(config),
        Duration::from_millis(100),
    );
    let result = runner.run(&plan_for(Scenario::Enterprise), |_| {}).await;
    assert!(matches!(result, Err(Error::ExecutionTimeout(_))));

    let report = runner.orchestrator().final_report();
    assert_eq!(report.total_tasks, 5);
    assert_eq!(report.tasks_completed, 0);
}

#[tokio::test(start_paused = true)]
async fn test_report_duration_covers_latency() {
    let config = SimulationConfig {
        task_latency_ms: 2_000,
        ..SimulationConfig::default()
    };
    let (outcome, _) = run_recorded(&plan_for(Scenario::Basic), config).await;
    // Three tasks in a chain.
    let duration = outcome.report.duration();
    assert!(duration >= Duration::from_millis(6_000), "{:?}", duration);
    assert!(duration < Duration::from_millis(7_000), "{:?}", duration);
}
