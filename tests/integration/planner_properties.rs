//! Structural properties that hold for every built-in scenario.

use std::collections::HashSet;

use chief::core::TaskGraph;
use chief::scenario::{plan, plan_named, PlannerConfig, Scenario};
use chief::Error;

use crate::fixtures::plan_for;

#[test]
fn test_plans_are_non_empty_unique_and_acyclic() {
    for scenario in Scenario::all() {
        let plan = plan_for(scenario);
        assert!(!plan.tasks.is_empty(), "{} has no tasks", scenario);

        let ids: HashSet<&str> = plan.task_ids().into_iter().collect();
        assert_eq!(ids.len(), plan.tasks.len(), "{} repeats an id", scenario);

        let graph = TaskGraph::from_definitions(&plan.tasks).unwrap();
        assert_eq!(graph.topological_order().unwrap().len(), plan.tasks.len());
        assert!(plan.validate().is_ok());
    }
}

#[test]
fn test_dependencies_only_point_backwards() {
    for scenario in Scenario::all() {
        let plan = plan_for(scenario);
        for (i, task) in plan.tasks.iter().enumerate() {
            let earlier: HashSet<&str> = plan.tasks[..i].iter().map(|t| t.id.as_str()).collect();
            for dep in &task.dependencies {
                assert!(
                    earlier.contains(dep.as_str()),
                    "{}: '{}' depends on later task '{}'",
                    scenario,
                    task.id,
                    dep
                );
            }
        }
    }
}

#[test]
fn test_fullstack_extends_basic() {
    let basic = plan_for(Scenario::Basic);
    let fullstack = plan_for(Scenario::Fullstack);

    let basic_ids: HashSet<&str> = basic.task_ids().into_iter().collect();
    let fullstack_ids: HashSet<&str> = fullstack.task_ids().into_iter().collect();
    assert!(basic_ids.is_subset(&fullstack_ids));
    assert_eq!(fullstack_ids.len(), basic_ids.len() + 2);
    for role in &basic.roles {
        assert!(fullstack.roles.contains(role));
    }
}

#[test]
fn test_enterprise_matches_fullstack_structure() {
    let fullstack = plan_for(Scenario::Fullstack);
    let enterprise = plan_for(Scenario::Enterprise);

    assert_eq!(fullstack.roles, enterprise.roles);
    assert_eq!(fullstack.task_ids(), enterprise.task_ids());
    for (f, e) in fullstack.tasks.iter().zip(&enterprise.tasks) {
        assert_eq!(f.dependencies, e.dependencies);
        assert_eq!(f.role, e.role);
        assert_eq!(f.task_type, e.task_type);
        assert_eq!(f.token_budget, e.token_budget);
    }

    for id in ["comprehend", "generate"] {
        let f = fullstack.task(id).unwrap();
        let e = enterprise.task(id).unwrap();
        assert!(e.objective.starts_with(&f.objective));
        assert!(e.objective.len() > f.objective.len());
        assert!(e.success_criteria.len() > f.success_criteria.len());
    }
    for id in ["test", "validate", "generate-frontend"] {
        assert_eq!(fullstack.task(id), enterprise.task(id));
    }
}

#[test]
fn test_planning_is_deterministic() {
    let config = PlannerConfig::default();
    for scenario in Scenario::all() {
        assert_eq!(plan(scenario, &config).unwrap(), plan(scenario, &config).unwrap());
    }
}

#[test]
fn test_unknown_scenario_is_configuration_error() {
    for name in ["", "premium", "basic2", "full stack"] {
        let err = plan_named(name, &PlannerConfig::default()).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "'{}' gave {:?}", name, err);
    }
    assert!(plan_named("  FullStack ", &PlannerConfig::default()).is_ok());
}

#[test]
fn test_planner_config_flows_into_tasks() {
    let config = PlannerConfig {
        project: "Inventory Service".to_string(),
        artifact_root: "artifacts/".to_string(),
    };
    let plan = plan(Scenario::Fullstack, &config).unwrap();
    assert!(plan.task("comprehend").unwrap().objective.contains("Inventory Service"));
    assert_eq!(
        plan.task("validate").unwrap().context_files,
        vec!["artifacts/generate", "artifacts/test"]
    );
}
