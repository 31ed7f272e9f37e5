//! In-process orchestrator used for mock runs.
//!
//! `SimulatedOrchestrator` executes queued tasks without any model calls.
//! It honours dependencies, runs up to `max_concurrent` tasks at a time,
//! charges a deterministic token cost against an optional budget, reports
//! quality gates after validation tasks and can be told to fail specific
//! tasks.

use super::events::{
    EventReceiver, EventSender, GateResult, GateStatus, OrchestratorEvent, TaskResult,
};
use super::report::FinalReport;
use super::{Orchestrator, QueuedTask};
use crate::agent::{Agent, AgentConfig, AgentId};
use crate::core::{TaskDefinition, TaskGraph, TaskId};
use crate::error::{Error, Result};
use crate::{clog, clog_debug, clog_trace, clog_warn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A quality gate and the status the simulation reports for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateSpec {
    pub name: String,
    pub status: GateStatus,
}

impl GateSpec {
    pub fn new(name: &str, status: GateStatus) -> Self {
        Self {
            name: name.to_string(),
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub max_concurrent: usize,
    /// Simulated wall time of one task.
    pub task_latency_ms: u64,
    /// Progress events per task, the last one at 1.0.
    pub progress_steps: u32,
    /// Fraction of a task's token budget it consumes.
    pub token_usage_ratio: f64,
    pub cost_per_1k_tokens: f64,
    /// USD; tasks that would exceed it fail without starting.
    pub budget_limit: Option<f64>,
    /// Task ids forced to fail.
    pub fail_tasks: Vec<String>,
    /// Reported after each validation task, in order.
    pub gates: Vec<GateSpec>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 3,
            task_latency_ms: 150,
            progress_steps: 4,
            token_usage_ratio: 0.6,
            cost_per_1k_tokens: 0.015,
            budget_limit: None,
            fail_tasks: Vec::new(),
            gates: vec![
                GateSpec::new("lint", GateStatus::Pass),
                GateSpec::new("tests", GateStatus::Pass),
                GateSpec::new("complexity", GateStatus::Skipped),
            ],
        }
    }
}

impl SimulationConfig {
    /// Default settings without latency; used by tests and self checks.
    pub fn instant() -> Self {
        Self {
            task_latency_ms: 0,
            ..Default::default()
        }
    }

    pub fn task_latency(&self) -> Duration {
        Duration::from_millis(self.task_latency_ms)
    }

    fn tokens_for(&self, task: &TaskDefinition) -> u64 {
        let ratio = self.token_usage_ratio.clamp(0.0, 1.0);
        (f64::from(task.token_budget) * ratio).round() as u64
    }

    fn cost_for(&self, tokens: u64) -> f64 {
        tokens as f64 / 1000.0 * self.cost_per_1k_tokens
    }

    fn should_fail(&self, id: &TaskId) -> bool {
        self.fail_tasks.iter().any(|f| id == f.as_str())
    }
}

/// Fans events out to every subscriber.
///
/// Sends happen under the lock so all subscribers observe one order.
#[derive(Default)]
struct EventBus {
    subscribers: Mutex<Vec<EventSender>>,
}

impl EventBus {
    fn subscribe(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.subscribers).push(tx);
        rx
    }

    fn emit(&self, event: OrchestratorEvent) {
        clog_trace!("event: {:?}", event);
        lock(&self.subscribers).retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[derive(Debug, Default)]
struct Ledger {
    total_tasks: usize,
    completed: usize,
    failed: usize,
    total_cost: f64,
    total_tokens: u64,
    started: Option<Instant>,
    finished: Option<Instant>,
}

#[derive(Default)]
struct Shared {
    bus: EventBus,
    ledger: Mutex<Ledger>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct SimulatedOrchestrator {
    config: SimulationConfig,
    agents: HashMap<AgentId, Agent>,
    graph: TaskGraph,
    assignments: HashMap<TaskId, AgentId>,
    shared: Arc<Shared>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    started: bool,
}

impl SimulatedOrchestrator {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            agents: HashMap::new(),
            graph: TaskGraph::new(),
            assignments: HashMap::new(),
            shared: Arc::new(Shared::default()),
            cancel: CancellationToken::new(),
            handle: None,
            started: false,
        }
    }
}

impl Default for SimulatedOrchestrator {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

#[async_trait]
impl Orchestrator for SimulatedOrchestrator {
    async fn create_agent(&mut self, config: AgentConfig) -> Result<Agent> {
        let agent = Agent {
            id: AgentId::new(),
            name: config.name,
            role: config.role,
        };
        clog_debug!(
            "create_agent: {} ({}) id={}",
            agent.name,
            agent.role,
            agent.id.short()
        );
        self.agents.insert(agent.id, agent.clone());
        Ok(agent)
    }

    async fn queue_task(&mut self, task: &TaskDefinition, agent: AgentId) -> Result<QueuedTask> {
        if self.started {
            return Err(Error::InvalidState(format!(
                "cannot queue '{}' after execution started",
                task.id
            )));
        }
        let assignee = self
            .agents
            .get(&agent)
            .ok_or_else(|| Error::UnknownAgent(agent.to_string()))?;
        if assignee.role != task.role {
            clog_warn!(
                "task '{}' wants role {} but is assigned to {} ({})",
                task.id,
                task.role,
                assignee.name,
                assignee.role
            );
        }
        if self.graph.contains(&task.id) {
            return Err(Error::DuplicateTask(task.id.to_string()));
        }
        if let Some(missing) = task.dependencies.iter().find(|d| !self.graph.contains(d)) {
            return Err(Error::UnknownDependency {
                task: task.id.to_string(),
                dependency: missing.to_string(),
            });
        }

        self.graph.add_task(task.clone())?;
        for dep in &task.dependencies {
            self.graph.add_dependency(dep, &task.id)?;
        }
        self.assignments.insert(task.id.clone(), agent);
        clog_debug!("queue_task: {} -> agent {}", task.id, agent.short());

        Ok(QueuedTask {
            id: task.id.clone(),
            objective: task.objective.clone(),
        })
    }

    fn subscribe(&mut self) -> EventReceiver {
        self.shared.bus.subscribe()
    }

    async fn start_execution(&mut self) -> Result<()> {
        if self.started {
            return Err(Error::InvalidState("execution already started".to_string()));
        }
        self.started = true;

        {
            let mut ledger = lock(&self.shared.ledger);
            ledger.total_tasks = self.graph.task_count();
            ledger.started = Some(Instant::now());
        }
        clog!(
            "Simulated execution starting: {} tasks, {} agents, max_concurrent={}",
            self.graph.task_count(),
            self.agents.len(),
            self.config.max_concurrent
        );

        let schedule = Schedule {
            graph: std::mem::take(&mut self.graph),
            assignments: std::mem::take(&mut self.assignments),
            config: self.config.clone(),
            shared: Arc::clone(&self.shared),
            cancel: self.cancel.clone(),
        };
        self.handle = Some(tokio::spawn(schedule.run()));
        Ok(())
    }

    async fn wait_for_completion(&mut self) -> Result<()> {
        if !self.started {
            return Err(Error::InvalidState(
                "execution has not been started".to_string(),
            ));
        }
        if let Some(handle) = self.handle.as_mut() {
            let joined = handle.await;
            self.handle = None;
            joined.map_err(|e| Error::TaskJoin(e.to_string()))?;
        }
        Ok(())
    }

    fn final_report(&self) -> FinalReport {
        let ledger = lock(&self.shared.ledger);
        let duration = match (ledger.started, ledger.finished) {
            (Some(start), Some(end)) => end.duration_since(start),
            (Some(start), None) => start.elapsed(),
            _ => Duration::ZERO,
        };
        FinalReport {
            tasks_completed: ledger.completed,
            total_tasks: if self.started {
                ledger.total_tasks
            } else {
                self.graph.task_count()
            },
            tasks_failed: ledger.failed,
            total_cost: ledger.total_cost,
            total_tokens: ledger.total_tokens,
            duration_ms: duration.as_millis() as u64,
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        clog!("Simulated orchestrator shutting down");
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            handle.await.map_err(|e| Error::TaskJoin(e.to_string()))?;
        }
        Ok(())
    }
}

type Outcome = std::result::Result<TaskResult, String>;

/// State owned by the background scheduling task.
struct Schedule {
    graph: TaskGraph,
    assignments: HashMap<TaskId, AgentId>,
    config: SimulationConfig,
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

impl Schedule {
    async fn run(self) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(TaskId, Outcome)>();
        let mut completed: HashSet<TaskId> = HashSet::new();
        let mut failed: HashSet<TaskId> = HashSet::new();
        let mut running: HashSet<TaskId> = HashSet::new();
        let mut committed_cost = 0.0;
        let max_concurrent = self.config.max_concurrent.max(1);

        loop {
            let excluded: HashSet<TaskId> = running.union(&failed).cloned().collect();
            let ready: Vec<TaskDefinition> = self
                .graph
                .ready_tasks(&completed, &excluded)
                .into_iter()
                .cloned()
                .collect();

            for task in ready {
                if running.len() >= max_concurrent {
                    break;
                }
                let Some(agent) = self.assignments.get(&task.id).copied() else {
                    self.fail(&task.id, "no agent assigned".to_string(), &mut failed);
                    continue;
                };
                let tokens = self.config.tokens_for(&task);
                let cost = self.config.cost_for(tokens);
                if let Some(limit) = self.config.budget_limit {
                    if committed_cost + cost > limit {
                        self.fail(
                            &task.id,
                            format!("budget limit of ${:.2} reached", limit),
                            &mut failed,
                        );
                        continue;
                    }
                }
                committed_cost += cost;
                running.insert(task.id.clone());

                let worker = Worker {
                    task,
                    agent,
                    tokens,
                    cost,
                    config: self.config.clone(),
                    shared: Arc::clone(&self.shared),
                    done: done_tx.clone(),
                    cancel: self.cancel.child_token(),
                };
                tokio::spawn(worker.run());
            }

            if running.is_empty() {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    clog_warn!("Execution cancelled with {} task(s) running", running.len());
                    break;
                }
                Some((id, outcome)) = done_rx.recv() => {
                    running.remove(&id);
                    match outcome {
                        Ok(result) => {
                            completed.insert(id.clone());
                            self.complete(&id, result);
                        }
                        Err(error) => self.fail(&id, error, &mut failed),
                    }
                }
                else => break,
            }
        }

        let mut ledger = lock(&self.shared.ledger);
        ledger.finished = Some(Instant::now());
        clog!(
            "Simulated execution finished: {} completed, {} failed of {}",
            ledger.completed,
            ledger.failed,
            ledger.total_tasks
        );
    }

    fn complete(&self, id: &TaskId, result: TaskResult) {
        {
            let mut ledger = lock(&self.shared.ledger);
            ledger.completed += 1;
            ledger.total_tokens += result.tokens_used;
            ledger.total_cost += result.cost;
        }
        self.shared.bus.emit(OrchestratorEvent::TaskCompleted {
            task: id.clone(),
            result,
        });

        let is_validation = self.graph.get(id).is_some_and(|t| t.is_validation());
        if is_validation {
            for gate in &self.config.gates {
                self.shared.bus.emit(OrchestratorEvent::QualityGateResult {
                    gate: gate.name.clone(),
                    result: GateResult {
                        status: gate.status,
                        task: Some(id.clone()),
                        message: None,
                    },
                });
            }
        }
    }

    /// Fail `id` and everything downstream of it.
    fn fail(&self, id: &TaskId, error: String, failed: &mut HashSet<TaskId>) {
        if !failed.insert(id.clone()) {
            return;
        }
        clog_warn!("Task '{}' failed: {}", id, error);
        self.record_failure(id, error);

        for dependent in self.graph.transitive_dependents(id) {
            if failed.insert(dependent.clone()) {
                self.record_failure(&dependent, format!("dependency '{}' failed", id));
            }
        }
    }

    fn record_failure(&self, id: &TaskId, error: String) {
        lock(&self.shared.ledger).failed += 1;
        self.shared.bus.emit(OrchestratorEvent::TaskFailed {
            task: id.clone(),
            error,
        });
    }
}

/// One simulated task execution.
struct Worker {
    task: TaskDefinition,
    agent: AgentId,
    tokens: u64,
    cost: f64,
    config: SimulationConfig,
    shared: Arc<Shared>,
    done: mpsc::UnboundedSender<(TaskId, Outcome)>,
    cancel: CancellationToken,
}

impl Worker {
    async fn run(self) {
        self.shared.bus.emit(OrchestratorEvent::TaskStarted {
            task: self.task.id.clone(),
            agent: self.agent,
        });

        let steps = self.config.progress_steps;
        let latency = self.config.task_latency();
        if steps == 0 {
            if !self.pause(latency).await {
                return;
            }
        } else {
            let step = latency / steps;
            for i in 1..=steps {
                if !self.pause(step).await {
                    return;
                }
                self.shared.bus.emit(OrchestratorEvent::TaskProgress {
                    task: self.task.id.clone(),
                    progress: f64::from(i) / f64::from(steps),
                });
            }
        }

        let outcome = if self.config.should_fail(&self.task.id) {
            Err(format!("simulated failure in task '{}'", self.task.id))
        } else {
            Ok(TaskResult {
                tokens_used: self.tokens,
                cost: self.cost,
                output: format!("{} output for '{}'", self.task.task_type, self.task.id),
            })
        };
        let _ = self.done.send((self.task.id.clone(), outcome));
    }

    /// Sleep unless cancelled first. Returns false on cancellation.
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
