use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::task::{Priority, Status, Task};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Title is required")]
    MissingTitle,
    #[error("Due date must be after start date")]
    DueBeforeStart,
}

/// The create/edit form. Serializes to the POST body the server expects.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
}

impl TaskForm {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Prefill an edit form from an existing task.
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            start_date: task.start_date,
            due_date: task.due_date,
            priority: task.priority(),
        }
    }

    /// Input-time checks. Collects every problem rather than stopping at the
    /// first one.
    pub fn validate(&self) -> Result<(), Vec<FormError>> {
        let mut errors = Vec::new();

        if self.title.trim().is_empty() {
            errors.push(FormError::MissingTitle);
        }
        if let (Some(start), Some(due)) = (self.start_date, self.due_date) {
            if start > due {
                errors.push(FormError::DueBeforeStart);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Partial update body. Only the fields that are set go on the wire; a date
/// set to `Some(None)` is sent as `null` and clears it on the server.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

impl From<TaskForm> for TaskPatch {
    fn from(form: TaskForm) -> Self {
        Self {
            title: Some(form.title),
            description: Some(form.description),
            status: None,
            priority: Some(form.priority),
            start_date: Some(form.start_date),
            due_date: Some(form.due_date),
        }
    }
}
