//! Final run report.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub tasks_completed: usize,
    pub total_tasks: usize,
    pub tasks_failed: usize,
    /// USD.
    pub total_cost: f64,
    pub total_tokens: u64,
    /// Milliseconds from start of execution to the last terminal task.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
}

impl FinalReport {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn all_completed(&self) -> bool {
        self.total_tasks > 0 && self.tasks_completed == self.total_tasks
    }

    /// Tasks that reached neither terminal state.
    pub fn unfinished(&self) -> usize {
        self.total_tasks
            .saturating_sub(self.tasks_completed + self.tasks_failed)
    }

    /// Completed tasks as a percentage of the total.
    pub fn success_rate(&self) -> f64 {
        if self.total_tasks == 0 {
            return 0.0;
        }
        self.tasks_completed as f64 * 100.0 / self.total_tasks as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_json_keys() {
        let report = FinalReport {
            tasks_completed: 3,
            total_tasks: 3,
            tasks_failed: 0,
            total_cost: 0.2,
            total_tokens: 13800,
            duration_ms: 1500,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"tasksCompleted\":3"));
        assert!(json.contains("\"totalTasks\":3"));
        assert!(json.contains("\"tasksFailed\":0"));
        assert!(json.contains("\"totalTokens\":13800"));
        assert!(json.contains("\"duration\":1500"));
        assert_eq!(report.duration(), Duration::from_millis(1500));
    }

    #[test]
    fn test_report_counts() {
        let report = FinalReport {
            tasks_completed: 3,
            total_tasks: 5,
            tasks_failed: 1,
            ..Default::default()
        };
        assert!(!report.all_completed());
        assert_eq!(report.unfinished(), 1);
        assert!((report.success_rate() - 60.0).abs() < f64::EPSILON);
        assert!(!FinalReport::default().all_completed());
        assert_eq!(FinalReport::default().success_rate(), 0.0);
    }
}
