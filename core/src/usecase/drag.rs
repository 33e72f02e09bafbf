//! Turning a drag-and-drop gesture into a status change.
//!
//! A session goes `Idle -> Dragging -> (Dropped | Cancelled)`. A drop on any
//! column yields exactly one [`MoveIntent`]; every status accepts every task,
//! including the one it is already in. Releasing anywhere else cancels.

use thiserror::Error;

use crate::model::task::{Status, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveIntent {
    pub task_id: TaskId,
    pub status: Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { task_id: TaskId },
    Dropped(MoveIntent),
    Cancelled { task_id: TaskId },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DragError {
    #[error("task {0} is already being dragged")]
    AlreadyDragging(TaskId),
}

#[derive(Debug, Clone, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn state(&self) -> DragState {
        self.state
    }

    /// The task currently carried, if any.
    pub fn payload(&self) -> Option<TaskId> {
        match self.state {
            DragState::Dragging { task_id } => Some(task_id),
            _ => None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.payload().is_some()
    }

    /// Picks up a task. A finished session can start over.
    pub fn begin(&mut self, task_id: TaskId) -> Result<(), DragError> {
        if let DragState::Dragging { task_id: current } = self.state {
            return Err(DragError::AlreadyDragging(current));
        }
        tracing::trace!(task_id = %task_id, "drag started");
        self.state = DragState::Dragging { task_id };
        Ok(())
    }

    /// Ends the gesture. `target` is the column under the pointer, `None`
    /// when released outside every column.
    pub fn release(&mut self, target: Option<Status>) -> Option<MoveIntent> {
        let task_id = self.payload()?;
        match target {
            Some(status) => {
                let intent = MoveIntent { task_id, status };
                self.state = DragState::Dropped(intent);
                tracing::debug!(task_id = %task_id, %status, "task dropped");
                Some(intent)
            }
            None => {
                self.state = DragState::Cancelled { task_id };
                tracing::debug!(task_id = %task_id, "drag cancelled");
                None
            }
        }
    }

    pub fn cancel(&mut self) {
        let _ = self.release(None);
    }

    /// Back to idle after a finished gesture has been rendered.
    pub fn reset(&mut self) {
        if !self.is_dragging() {
            self.state = DragState::Idle;
        }
    }
}
