//! Scenario presets and the task planner.
//!
//! A scenario bundles the agent roles a run needs with an ordered list of
//! task definitions. `plan` is a pure function of the scenario and the
//! `PlannerConfig` passed in: same inputs, same plan.
//!
//! `fullstack` extends `basic` with a validation step and a frontend
//! task. `enterprise` has the same structure as `fullstack` but widens the
//! comprehension and generation tasks with authentication, persistence and
//! deployment requirements.

use crate::agent::AgentRole;
use crate::core::{TaskDefinition, TaskGraph, TaskId, TaskType};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    Basic,
    Fullstack,
    Enterprise,
}

impl Scenario {
    pub fn all() -> [Scenario; 3] {
        [Scenario::Basic, Scenario::Fullstack, Scenario::Enterprise]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scenario::Basic => "basic",
            Scenario::Fullstack => "fullstack",
            Scenario::Enterprise => "enterprise",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::Basic => "Analyze, implement and test a small API (3 agents, 3 tasks)",
            Scenario::Fullstack => {
                "Basic plus review and a frontend client (5 agents, 5 tasks)"
            }
            Scenario::Enterprise => {
                "Fullstack with authentication, database and Docker requirements"
            }
        }
    }

    fn roles(&self) -> Vec<AgentRole> {
        let mut roles = vec![AgentRole::Analyst, AgentRole::Developer, AgentRole::Tester];
        if *self != Scenario::Basic {
            roles.extend([AgentRole::Reviewer, AgentRole::Frontend]);
        }
        roles
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Scenario {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Scenario::Basic),
            "fullstack" => Ok(Scenario::Fullstack),
            "enterprise" => Ok(Scenario::Enterprise),
            other => Err(Error::config(format!(
                "unknown scenario '{}' (expected basic, fullstack or enterprise)",
                other
            ))),
        }
    }
}

/// Inputs to the planner that are not part of the scenario itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Project name interpolated into objectives.
    pub project: String,
    /// Prefix for the logical artifact path of every task.
    pub artifact_root: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            project: "TODO API".to_string(),
            artifact_root: "output".to_string(),
        }
    }
}

impl PlannerConfig {
    pub fn artifact_path(&self, id: &TaskId) -> String {
        format!("{}/{}", self.artifact_root.trim_end_matches('/'), id)
    }
}

/// The roles and tasks for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioPlan {
    pub scenario: Scenario,
    pub roles: Vec<AgentRole>,
    pub tasks: Vec<TaskDefinition>,
}

impl ScenarioPlan {
    pub fn task(&self, id: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_ids(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.id.as_str()).collect()
    }

    pub fn total_token_budget(&self) -> u64 {
        self.tasks.iter().map(|t| u64::from(t.token_budget)).sum()
    }

    pub fn graph(&self) -> Result<TaskGraph> {
        TaskGraph::from_definitions(&self.tasks)
    }

    /// Check the plan is runnable.
    ///
    /// Every violation is reported as a configuration error: plans are
    /// static, so a bad one is a bug in the preset, not a runtime fault.
    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            return Err(Error::config(format!(
                "scenario '{}' defines no tasks",
                self.scenario
            )));
        }

        let graph = self.graph().map_err(|e| self.graph_error(e))?;
        graph
            .topological_order()
            .map_err(|e| self.graph_error(e))?;

        let roles: HashSet<AgentRole> = self.roles.iter().copied().collect();
        for task in &self.tasks {
            if task.token_budget == 0 {
                return Err(Error::config(format!(
                    "task '{}' has a zero token budget",
                    task.id
                )));
            }
            if !roles.contains(&task.role) {
                return Err(Error::config(format!(
                    "task '{}' needs role '{}' which scenario '{}' does not request",
                    task.id, task.role, self.scenario
                )));
            }
        }
        Ok(())
    }

    fn graph_error(&self, err: Error) -> Error {
        match err {
            Error::Configuration(_) => err,
            other => Error::config(format!(
                "scenario '{}' has an invalid task graph: {}",
                self.scenario, other
            )),
        }
    }
}

/// Build the plan for `scenario`.
pub fn plan(scenario: Scenario, config: &PlannerConfig) -> Result<ScenarioPlan> {
    let mut tasks = basic_tasks(config);
    if scenario != Scenario::Basic {
        tasks.extend(fullstack_tasks(config));
    }
    if scenario == Scenario::Enterprise {
        apply_enterprise_requirements(&mut tasks);
    }

    let plan = ScenarioPlan {
        scenario,
        roles: scenario.roles(),
        tasks,
    };
    plan.validate()?;
    Ok(plan)
}

/// Parse `name` and build its plan.
pub fn plan_named(name: &str, config: &PlannerConfig) -> Result<ScenarioPlan> {
    plan(name.parse()?, config)
}

fn context_for(config: &PlannerConfig, deps: &[&str]) -> Vec<String> {
    deps.iter()
        .map(|d| config.artifact_path(&TaskId::new(*d)))
        .collect()
}

fn basic_tasks(config: &PlannerConfig) -> Vec<TaskDefinition> {
    let project = &config.project;
    vec![
        TaskDefinition::new(
            "comprehend",
            TaskType::Comprehension,
            AgentRole::Analyst,
            format!(
                "Analyze the existing codebase and identify the components needed for the {}",
                project
            ),
            5000,
        )
        .with_criteria(&[
            "Identify main components and their responsibilities",
            "Document the data flow",
            "List integration points",
        ]),
        TaskDefinition::new(
            "generate",
            TaskType::Generation,
            AgentRole::Developer,
            format!(
                "Implement the {} with CRUD endpoints for todo items",
                project
            ),
            10000,
        )
        .depends_on(&["comprehend"])
        .with_context(context_for(config, &["comprehend"]))
        .with_criteria(&[
            "RESTful endpoints for create, read, update and delete",
            "Input validation on every endpoint",
            "Consistent error responses",
        ]),
        TaskDefinition::new(
            "test",
            TaskType::Generation,
            AgentRole::Tester,
            format!("Write a test suite for the {} endpoints", project),
            8000,
        )
        .depends_on(&["generate"])
        .with_context(context_for(config, &["generate"]))
        .with_criteria(&[
            "Unit tests for every endpoint",
            "Edge cases and error paths covered",
            "At least 80% line coverage",
        ]),
    ]
}

fn fullstack_tasks(config: &PlannerConfig) -> Vec<TaskDefinition> {
    let project = &config.project;
    vec![
        TaskDefinition::new(
            "validate",
            TaskType::Validation,
            AgentRole::Reviewer,
            format!("Review the {} implementation and its tests", project),
            3000,
        )
        .depends_on(&["generate", "test"])
        .with_context(context_for(config, &["generate", "test"]))
        .with_criteria(&[
            "All tests pass",
            "No lint errors",
            "Complexity within configured limits",
        ]),
        TaskDefinition::new(
            "generate-frontend",
            TaskType::Generation,
            AgentRole::Frontend,
            format!("Build a web frontend that consumes the {}", project),
            10000,
        )
        .depends_on(&["generate"])
        .with_context(context_for(config, &["generate"]))
        .with_criteria(&[
            "Components to list, add, edit and delete todos",
            "API client wired to the backend endpoints",
            "Responsive layout",
        ]),
    ]
}

fn apply_enterprise_requirements(tasks: &mut [TaskDefinition]) {
    for task in tasks.iter_mut() {
        match task.id.as_str() {
            "comprehend" => {
                task.objective.push_str(
                    ", including authentication, database persistence and Docker deployment requirements",
                );
                task.success_criteria
                    .push("Identify security, persistence and deployment requirements".to_string());
            }
            "generate" => {
                task.objective.push_str(
                    ", secured with JWT authentication, persisted in PostgreSQL and packaged with Docker",
                );
                task.success_criteria.extend([
                    "JWT authentication on protected endpoints".to_string(),
                    "PostgreSQL persistence with migrations".to_string(),
                    "Dockerfile and docker-compose configuration".to_string(),
                ]);
            }
            _ => {}
        }
    }
}
