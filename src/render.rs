//! Terminal formatting for plans, events and run outcomes.

use std::fmt::Write;

use crate::orchestration::{FinalReport, GateStatus, OrchestratorEvent};
use crate::runner::{CheckReport, RunOutcome};
use crate::scenario::{Scenario, ScenarioPlan};

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const GRAY: &str = "\x1b[90m";
const CYAN: &str = "\x1b[36m";
const RESET: &str = "\x1b[0m";

fn paint(color: &str, text: impl std::fmt::Display) -> String {
    format!("{}{}{}", color, text, RESET)
}

/// Gate status with color codes for terminal.
pub fn format_gate_status(status: GateStatus) -> String {
    match status {
        GateStatus::Pass => paint(GREEN, status),
        GateStatus::Fail => paint(RED, status),
        GateStatus::Error => paint(RED, status),
        GateStatus::Skipped => paint(GRAY, status),
    }
}

/// Truncate a string to a maximum length, adding "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}

pub fn format_scenarios() -> String {
    let mut out = String::from("Available scenarios:\n");
    for scenario in Scenario::all() {
        let _ = writeln!(out, "  {:<12} {}", scenario.as_str(), scenario.description());
    }
    out
}

pub fn format_plan(plan: &ScenarioPlan) -> String {
    let graph = plan.graph().ok();
    let mut out = String::new();
    let _ = writeln!(out, "Scenario: {}", plan.scenario);
    let roles: Vec<&str> = plan.roles.iter().map(|r| r.as_str()).collect();
    let _ = writeln!(out, "Agents:   {}", roles.join(", "));
    let _ = writeln!(
        out,
        "Tasks:    {} ({} dependencies, {} tokens budgeted)",
        plan.tasks.len(),
        graph.as_ref().map_or(0, |g| g.dependency_count()),
        plan.total_token_budget()
    );
    out.push('\n');

    for (i, task) in plan.tasks.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {} [{}] {} - {} tokens",
            i + 1,
            paint(CYAN, &task.id),
            task.task_type,
            task.role,
            task.token_budget
        );
        if !task.dependencies.is_empty() {
            let deps: Vec<&str> = task.dependencies.iter().map(|d| d.as_str()).collect();
            let _ = writeln!(out, "     after: {}", deps.join(", "));
        }
        if let Some(graph) = &graph {
            let unblocks: Vec<&str> = graph
                .dependents_of(&task.id)
                .iter()
                .map(|d| d.as_str())
                .collect();
            if !unblocks.is_empty() {
                let _ = writeln!(out, "     unblocks: {}", unblocks.join(", "));
            }
        }
        let _ = writeln!(out, "     {}", truncate_string(&task.objective, 100));
    }
    out
}

/// One line for an event. Progress lines are only produced when `verbose`.
pub fn format_event(event: &OrchestratorEvent, verbose: bool) -> Option<String> {
    let line = match event {
        OrchestratorEvent::TaskStarted { task, agent } => {
            format!("{} {} (agent {})", paint(YELLOW, "started  "), task, agent.short())
        }
        OrchestratorEvent::TaskProgress { task, progress } => {
            if !verbose {
                return None;
            }
            format!("{} {} {:>3.0}%", paint(GRAY, "progress "), task, progress * 100.0)
        }
        OrchestratorEvent::TaskCompleted { task, result } => format!(
            "{} {} ({} tokens, ${:.4})",
            paint(GREEN, "completed"),
            task,
            result.tokens_used,
            result.cost
        ),
        OrchestratorEvent::TaskFailed { task, error } => {
            format!("{} {}: {}", paint(RED, "failed   "), task, error)
        }
        OrchestratorEvent::QualityGateResult { gate, result } => {
            let mut line = format!("gate      {}: {}", gate, format_gate_status(result.status));
            if let Some(message) = &result.message {
                let _ = write!(line, " ({})", message);
            }
            line
        }
    };
    Some(line)
}

pub fn format_report(report: &FinalReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  Tasks:    {}/{} completed, {} failed ({:.0}%)",
        report.tasks_completed,
        report.total_tasks,
        report.tasks_failed,
        report.success_rate()
    );
    let _ = writeln!(out, "  Tokens:   {}", report.total_tokens);
    let _ = writeln!(out, "  Cost:     ${:.4}", report.total_cost);
    let _ = writeln!(out, "  Duration: {:.2}s", report.duration().as_secs_f64());
    out
}

pub fn format_outcome(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    let status = if outcome.is_success() {
        paint(GREEN, "succeeded")
    } else {
        paint(RED, "failed")
    };
    let _ = writeln!(out, "Scenario '{}' {}", outcome.scenario, status);
    out.push_str(&format_report(&outcome.report));

    if !outcome.gates.is_empty() {
        let gates: Vec<String> = outcome
            .gates
            .iter()
            .map(|g| format!("{}={}", g.gate, format_gate_status(g.status)))
            .collect();
        let _ = writeln!(out, "  Gates:    {}", gates.join(", "));
    }
    for failure in &outcome.failures {
        let _ = writeln!(out, "  {} {}: {}", paint(RED, "x"), failure.task, failure.error);
    }
    out
}

pub fn format_check(check: &CheckReport) -> String {
    let mut out = String::new();
    if check.passed() {
        let _ = writeln!(
            out,
            "{} check '{}': {} tasks completed",
            paint(GREEN, "ok"),
            check.outcome.scenario,
            check.outcome.report.tasks_completed
        );
    } else {
        let _ = writeln!(out, "{} check '{}'", paint(RED, "FAILED"), check.outcome.scenario);
        for problem in &check.problems {
            let _ = writeln!(out, "  - {}", problem);
        }
    }
    out
}
