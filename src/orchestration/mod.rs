//! Orchestrator boundary.
//!
//! The orchestrator owns agent execution: it accepts agents and task
//! definitions, runs tasks in dependency order, streams lifecycle events
//! and produces the final report. This crate drives it through the
//! `Orchestrator` trait; `SimulatedOrchestrator` is the in-process
//! implementation used for mock runs.

mod events;
mod report;
mod simulated;

pub use events::{
    EventReceiver, EventSender, GateResult, GateStatus, OrchestratorEvent, TaskResult,
};
pub use report::FinalReport;
pub use simulated::{GateSpec, SimulatedOrchestrator, SimulationConfig};

use crate::agent::{Agent, AgentConfig, AgentId};
use crate::core::{TaskDefinition, TaskId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Acknowledgement for a queued task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedTask {
    pub id: TaskId,
    pub objective: String,
}

#[async_trait]
pub trait Orchestrator: Send {
    async fn create_agent(&mut self, config: AgentConfig) -> crate::Result<Agent>;

    /// Queue a task for `agent`.
    ///
    /// # Errors
    /// Fails when a dependency was not queued earlier, the id is already
    /// queued, or the agent is unknown.
    async fn queue_task(
        &mut self,
        task: &TaskDefinition,
        agent: AgentId,
    ) -> crate::Result<QueuedTask>;

    /// Receive every event emitted from now on, in emission order.
    fn subscribe(&mut self) -> EventReceiver;

    async fn start_execution(&mut self) -> crate::Result<()>;

    /// Resolve once every queued task has reached a terminal state.
    async fn wait_for_completion(&mut self) -> crate::Result<()>;

    fn final_report(&self) -> FinalReport;

    /// Cancel in-flight work.
    async fn shutdown(&mut self) -> crate::Result<()>;
}

#[async_trait]
impl<T: Orchestrator + ?Sized> Orchestrator for Box<T> {
    async fn create_agent(&mut self, config: AgentConfig) -> crate::Result<Agent> {
        (**self).create_agent(config).await
    }

    async fn queue_task(
        &mut self,
        task: &TaskDefinition,
        agent: AgentId,
    ) -> crate::Result<QueuedTask> {
        (**self).queue_task(task, agent).await
    }

    fn subscribe(&mut self) -> EventReceiver {
        (**self).subscribe()
    }

    async fn start_execution(&mut self) -> crate::Result<()> {
        (**self).start_execution().await
    }

    async fn wait_for_completion(&mut self) -> crate::Result<()> {
        (**self).wait_for_completion().await
    }

    fn final_report(&self) -> FinalReport {
        (**self).final_report()
    }

    async fn shutdown(&mut self) -> crate::Result<()> {
        (**self).shutdown().await
    }
}
