//! Lifecycle events emitted by an orchestrator.
//!
//! Events are delivered over an unbounded channel in the order they were
//! emitted. Consumers process them on a single loop.

use crate::agent::AgentId;
use crate::core::TaskId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub type EventSender = mpsc::UnboundedSender<OrchestratorEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<OrchestratorEvent>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum OrchestratorEvent {
    TaskStarted {
        task: TaskId,
        agent: AgentId,
    },
    /// `progress` is in `[0, 1]`.
    TaskProgress {
        task: TaskId,
        progress: f64,
    },
    TaskCompleted {
        task: TaskId,
        result: TaskResult,
    },
    TaskFailed {
        task: TaskId,
        error: String,
    },
    QualityGateResult {
        gate: String,
        result: GateResult,
    },
}

/// Output of a completed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    pub tokens_used: u64,
    pub cost: f64,
    /// Short description of what the task produced.
    pub output: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateStatus {
    Pass,
    Fail,
    Skipped,
    Error,
}

impl GateStatus {
    /// Skipped gates are treated as not applicable and do not fail a run.
    pub fn is_acceptable(&self) -> bool {
        matches!(self, GateStatus::Pass | GateStatus::Skipped)
    }
}

impl std::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateStatus::Pass => write!(f, "pass"),
            GateStatus::Fail => write!(f, "fail"),
            GateStatus::Skipped => write!(f, "skipped"),
            GateStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateResult {
    pub status: GateStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
