use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::task::{Priority, Status, Task, TaskId};

/// Display form used by the table and analytics views.
pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// A task flattened for the table view. Unknown statuses read as To Do and
/// unknown priorities as Medium.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TaskRow {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub start_date: String,
    pub due_date: String,
}

impl TaskRow {
    pub fn from_entity(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status_or_default(),
            priority: task.priority(),
            start_date: format_date(task.start_date),
            due_date: format_date(task.due_date),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusCount {
    pub status: Status,
    pub count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PriorityCount {
    pub priority: Priority,
    pub count: usize,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompletedTask {
    pub id: TaskId,
    pub title: String,
    pub completed_on: String,
    pub days_taken: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AnalyticsReport {
    pub total: usize,
    /// Whole percent.
    pub completion_rate: u32,
    pub by_status: Vec<StatusCount>,
    pub by_priority: Vec<PriorityCount>,
    pub avg_completion_days: f64,
    pub overdue: usize,
    pub recently_completed: Vec<CompletedTask>,
}
