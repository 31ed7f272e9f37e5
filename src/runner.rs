//! Demo driver.
//!
//! `ScenarioRunner` walks a `ScenarioPlan` through an `Orchestrator`:
//! agents first, then tasks in plan order, then execution. Events are
//! consumed on one loop while completion races the run timeout.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::agent::{Agent, AgentId, AgentRole};
use crate::config::Config;
use crate::core::TaskId;
use crate::orchestration::{
    FinalReport, GateStatus, Orchestrator, OrchestratorEvent, QueuedTask, SimulatedOrchestrator,
};
use crate::scenario::{Scenario, ScenarioPlan};
use crate::{clog, clog_debug, clog_error, clog_warn, Error, Result};

/// Timeout used by the end-to-end self check.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskFailure {
    pub task: TaskId,
    pub error: String,
}

impl From<TaskFailure> for Error {
    fn from(failure: TaskFailure) -> Self {
        Error::TaskFailure {
            task: failure.task.to_string(),
            error: failure.error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateOutcome {
    pub gate: String,
    pub status: GateStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// What a finished run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub scenario: Scenario,
    pub agents: Vec<Agent>,
    pub queued: Vec<QueuedTask>,
    pub report: FinalReport,
    pub failures: Vec<TaskFailure>,
    pub gates: Vec<GateOutcome>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.report.all_completed()
            && self.failures.is_empty()
            && self.gates.iter().all(|g| g.status.is_acceptable())
    }

    pub fn rejected_gates(&self) -> impl Iterator<Item = &GateOutcome> {
        self.gates.iter().filter(|g| !g.status.is_acceptable())
    }
}

/// Per-run view of the event stream.
#[derive(Debug, Default)]
pub struct RunMonitor {
    events: usize,
    failures: Vec<TaskFailure>,
    gates: Vec<GateOutcome>,
}

impl RunMonitor {
    pub fn record(&mut self, event: &OrchestratorEvent) {
        self.events += 1;
        match event {
            OrchestratorEvent::TaskStarted { .. }
            | OrchestratorEvent::TaskProgress { .. }
            | OrchestratorEvent::TaskCompleted { .. } => {}
            OrchestratorEvent::TaskFailed { task, error } => {
                self.failures.push(TaskFailure {
                    task: task.clone(),
                    error: error.clone(),
                });
            }
            OrchestratorEvent::QualityGateResult { gate, result } => {
                self.gates.push(GateOutcome {
                    gate: gate.clone(),
                    status: result.status,
                    task: result.task.clone(),
                    message: result.message.clone(),
                });
            }
        }
    }

    pub fn event_count(&self) -> usize {
        self.events
    }
}

pub struct ScenarioRunner<O> {
    orchestrator: O,
    timeout: Duration,
}

impl<O: Orchestrator> ScenarioRunner<O> {
    pub fn new(orchestrator: O, timeout: Duration) -> Self {
        Self {
            orchestrator,
            timeout,
        }
    }

    pub fn orchestrator(&self) -> &O {
        &self.orchestrator
    }

    /// Run `plan` to completion, passing every event to `on_event` in
    /// emission order.
    ///
    /// # Errors
    /// Boundary errors from the orchestrator abort the run before
    /// execution. `ExecutionTimeout` is returned after shutting the
    /// orchestrator down when the run outlives the timeout. Task failures
    /// are not errors; they are collected in the outcome.
    pub async fn run<F>(&mut self, plan: &ScenarioPlan, mut on_event: F) -> Result<RunOutcome>
    where
        F: FnMut(&OrchestratorEvent),
    {
        plan.validate()?;
        clog!(
            "Running scenario '{}': {} roles, {} tasks, timeout {:?}",
            plan.scenario,
            plan.roles.len(),
            plan.tasks.len(),
            self.timeout
        );

        let mut agents = Vec::with_capacity(plan.roles.len());
        let mut by_role: HashMap<AgentRole, AgentId> = HashMap::new();
        for role in &plan.roles {
            let agent = self
                .orchestrator
                .create_agent(role.template().config())
                .await?;
            clog_debug!("Agent ready: {} ({}) {}", agent.name, agent.role, agent.id.short());
            by_role.insert(*role, agent.id);
            agents.push(agent);
        }

        let mut queued = Vec::with_capacity(plan.tasks.len());
        for task in &plan.tasks {
            let agent = by_role.get(&task.role).copied().ok_or_else(|| {
                Error::config(format!(
                    "task '{}' needs role {} which has no agent",
                    task.id, task.role
                ))
            })?;
            queued.push(self.orchestrator.queue_task(task, agent).await?);
        }

        let mut events = self.orchestrator.subscribe();
        self.orchestrator.start_execution().await?;

        let mut monitor = RunMonitor::default();
        let timeout = self.timeout;
        let orchestrator = &mut self.orchestrator;
        let consumed = tokio::time::timeout(timeout, async {
            let completion = orchestrator.wait_for_completion();
            tokio::pin!(completion);
            loop {
                tokio::select! {
                    biased;
                    Some(event) = events.recv() => {
                        monitor.record(&event);
                        on_event(&event);
                    }
                    result = &mut completion => break result,
                }
            }
        })
        .await;

        match consumed {
            Ok(result) => result?,
            Err(_) => {
                clog_error!("Scenario '{}' timed out after {:?}", plan.scenario, timeout);
                if let Err(e) = self.orchestrator.shutdown().await {
                    clog_warn!("Shutdown after timeout failed: {}", e);
                }
                return Err(Error::ExecutionTimeout(timeout));
            }
        }

        // Events emitted just before completion may still be buffered.
        while let Ok(event) = events.try_recv() {
            monitor.record(&event);
            on_event(&event);
        }

        let report = self.orchestrator.final_report();
        clog!(
            "Scenario '{}' finished: {}/{} completed, {} failed, {} events",
            plan.scenario,
            report.tasks_completed,
            report.total_tasks,
            report.tasks_failed,
            monitor.event_count()
        );

        Ok(RunOutcome {
            scenario: plan.scenario,
            agents,
            queued,
            report,
            failures: monitor.failures,
            gates: monitor.gates,
        })
    }

    /// Run `plan` with at most `CHECK_TIMEOUT` and compare the outcome
    /// against the plan.
    pub async fn check(&mut self, plan: &ScenarioPlan) -> Result<CheckReport> {
        self.timeout = self.timeout.min(CHECK_TIMEOUT);
        let outcome = self.run(plan, |_| {}).await?;
        let problems = verify(plan, &outcome);
        for problem in &problems {
            clog_warn!("check '{}': {}", plan.scenario, problem);
        }
        Ok(CheckReport { outcome, problems })
    }
}

#[derive(Debug, Clone)]
pub struct CheckReport {
    pub outcome: RunOutcome,
    pub problems: Vec<String>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Differences between what `plan` asked for and what the run did.
pub fn verify(plan: &ScenarioPlan, outcome: &RunOutcome) -> Vec<String> {
    let mut problems = Vec::new();

    if outcome.queued.len() != plan.tasks.len() {
        problems.push(format!(
            "queued {} tasks, plan has {}",
            outcome.queued.len(),
            plan.tasks.len()
        ));
    }
    for (queued, task) in outcome.queued.iter().zip(&plan.tasks) {
        if queued.id != task.id {
            problems.push(format!(
                "expected '{}' to be queued, got '{}'",
                task.id, queued.id
            ));
        }
    }
    if outcome.agents.len() != plan.roles.len() {
        problems.push(format!(
            "created {} agents, plan needs {}",
            outcome.agents.len(),
            plan.roles.len()
        ));
    }
    let report = &outcome.report;
    if report.total_tasks != plan.tasks.len() {
        problems.push(format!(
            "report counts {} tasks, plan has {}",
            report.total_tasks,
            plan.tasks.len()
        ));
    }
    if report.tasks_completed != report.total_tasks {
        problems.push(format!(
            "{} of {} tasks completed",
            report.tasks_completed, report.total_tasks
        ));
    }
    for failure in &outcome.failures {
        problems.push(format!("task '{}' failed: {}", failure.task, failure.error));
    }
    for gate in outcome.rejected_gates() {
        problems.push(format!("quality gate '{}' reported {}", gate.gate, gate.status));
    }
    problems
}

/// Build the orchestrator a config asks for.
pub fn orchestrator_for(config: &Config) -> Result<Box<dyn Orchestrator>> {
    orchestrator_with(config, |key| std::env::var(key).ok())
}

/// Like `orchestrator_for`, reading the API key through `lookup`.
///
/// # Errors
/// `Configuration` in live mode: without an API key, and otherwise
/// because this build only ships the simulated orchestrator.
pub fn orchestrator_with<F>(config: &Config, lookup: F) -> Result<Box<dyn Orchestrator>>
where
    F: Fn(&str) -> Option<String>,
{
    if config.mock {
        clog_debug!("Using simulated orchestrator");
        return Ok(Box::new(SimulatedOrchestrator::new(config.simulation_config())));
    }
    if Config::api_key_with(lookup).is_none() {
        return Err(Error::config(
            "live mode requires CHIEF_API_KEY or ANTHROPIC_API_KEY to be set",
        ));
    }
    Err(Error::config(
        "no live orchestrator backend is linked into this build; rerun with --mock",
    ))
}
