//! Config file, environment overrides and orchestrator selection.

use std::collections::HashMap;

use chief::config::Config;
use chief::runner::{orchestrator_with, ScenarioRunner};
use chief::scenario::{self, Scenario};
use chief::Error;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_environment_overrides_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chief.toml");
    std::fs::write(&path, "scenario = \"fullstack\"\nbudget = 4.0\n").unwrap();

    let mut config = Config::load_from(&path).unwrap();
    config
        .apply_env_with(env(&[("CHIEF_SCENARIO", "enterprise")]))
        .unwrap();
    assert_eq!(config.scenario, Scenario::Enterprise);
    assert_eq!(config.budget, 4.0);
}

#[tokio::test]
async fn test_file_config_drives_a_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chief.toml");
    std::fs::write(
        &path,
        r#"
scenario = "basic"

[planner]
project = "Ledger API"

[simulation]
task_latency_ms = 0
fail_tasks = ["test"]
"#,
    )
    .unwrap();

    let config = Config::load_from(&path).unwrap();
    let plan = scenario::plan(config.scenario, &config.planner).unwrap();
    assert!(plan.task("generate").unwrap().objective.contains("Ledger API"));

    let orchestrator = orchestrator_with(&config, env(&[])).unwrap();
    let outcome = ScenarioRunner::new(orchestrator, config.timeout())
        .run(&plan, |_| {})
        .await
        .unwrap();
    assert_eq!(outcome.report.tasks_completed, 2);
    assert_eq!(outcome.failures.len(), 1);
}

#[test]
fn test_live_mode_without_key_is_configuration_error() {
    let mut config = Config::default();
    config
        .apply_env_with(env(&[("CHIEF_MOCK", "false")]))
        .unwrap();
    let err = orchestrator_with(&config, env(&[])).err().unwrap();
    assert!(matches!(err, Error::Configuration(_)));
    assert!(err.is_fatal());
}
