//! Task definitions for scenario plans.
//!
//! A task definition is the static description of one unit of work: what
//! it should achieve, which tasks must finish first, which artifacts it
//! reads, and which agent role executes it.

use crate::agent::AgentRole;
use serde::{Deserialize, Serialize};

/// Identifier of a task, unique within a run (e.g. `"generate"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl PartialEq<str> for TaskId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TaskId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Kind of work a task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Read and understand existing material.
    Comprehension,
    /// Produce new artifacts.
    Generation,
    /// Check produced artifacts; triggers quality gates.
    Validation,
}

impl std::fmt::Display for TaskType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskType::Comprehension => write!(f, "comprehension"),
            TaskType::Generation => write!(f, "generation"),
            TaskType::Validation => write!(f, "validation"),
        }
    }
}

/// Static description of one unit of work in a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub id: TaskId,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub objective: String,
    pub dependencies: Vec<TaskId>,
    /// Logical references to outputs of earlier tasks.
    pub context_files: Vec<String>,
    pub success_criteria: Vec<String>,
    pub token_budget: u32,
    pub role: AgentRole,
}

impl TaskDefinition {
    /// Create a task with no dependencies, context or criteria.
    pub fn new(
        id: &str,
        task_type: TaskType,
        role: AgentRole,
        objective: impl Into<String>,
        token_budget: u32,
    ) -> Self {
        Self {
            id: TaskId::new(id),
            task_type,
            objective: objective.into(),
            dependencies: Vec::new(),
            context_files: Vec::new(),
            success_criteria: Vec::new(),
            token_budget,
            role,
        }
    }

    pub fn depends_on(mut self, ids: &[&str]) -> Self {
        self.dependencies.extend(ids.iter().map(|id| TaskId::new(*id)));
        self
    }

    pub fn with_context(mut self, paths: impl IntoIterator<Item = String>) -> Self {
        self.context_files.extend(paths);
        self
    }

    pub fn with_criteria(mut self, criteria: &[&str]) -> Self {
        self.success_criteria
            .extend(criteria.iter().map(|c| c.to_string()));
        self
    }

    pub fn is_validation(&self) -> bool {
        self.task_type == TaskType::Validation
    }
}
