use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::source::RegistrationId;

/// Observable lifecycle state of a periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not started, or stopped. Reads as paused.
    Idle,
    /// Registered and executing work on delivered ticks.
    Running,
    /// Registered, but ticks are only counted.
    Paused,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Idle => "idle",
            TaskStatus::Running => "running",
            TaskStatus::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Point-in-time view of a task, for diagnostics and dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSnapshot {
    pub name: String,
    pub delay: u64,
    /// Raw interval, -1 for one-shot tasks.
    pub interval: i64,
    pub status: TaskStatus,
    pub total_ticks: u64,
    pub executed_ticks: u64,
    pub last_execution: Option<DateTime<Utc>>,
    pub registration: Option<RegistrationId>,
}

impl TaskSnapshot {
    /// Ticks delivered while paused.
    pub fn skipped_ticks(&self) -> u64 {
        self.total_ticks.saturating_sub(self.executed_ticks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display() {
        assert_eq!(TaskStatus::Idle.to_string(), "idle");
        assert_eq!(TaskStatus::Running.to_string(), "running");
        assert_eq!(TaskStatus::Paused.to_string(), "paused");
    }

    #[test]
    fn snapshot_serializes_for_dashboards() {
        let snapshot = TaskSnapshot {
            name: "autosave".to_string(),
            delay: 5,
            interval: -1,
            status: TaskStatus::Paused,
            total_ticks: 10,
            executed_ticks: 4,
            last_execution: None,
            registration: Some(RegistrationId(3)),
        };
        assert_eq!(snapshot.skipped_ticks(), 6);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "Paused");
        assert_eq!(json["interval"], -1);
        assert_eq!(json["registration"], 3);
    }
}
