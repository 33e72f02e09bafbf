//! In-memory stand-in for the remote service, used by store tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;

use crate::gateway::error::GatewayError;
use crate::gateway::traits::{GatewayResult, TaskGateway};
use crate::model::form::{TaskForm, TaskPatch};
use crate::model::task::{Task, TaskId};

#[derive(Default)]
pub struct FakeGateway {
    tasks: Mutex<Vec<Task>>,
    next_id: Mutex<u64>,
    fail_all: Mutex<bool>,
    latencies: Mutex<VecDeque<Duration>>,
}

impl FakeGateway {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks.iter().map(|t| t.id.0).max().unwrap_or(0);
        Self {
            tasks: Mutex::new(tasks),
            next_id: Mutex::new(next_id),
            ..Self::default()
        }
    }

    /// Every following call answers 500 after its latency.
    pub fn fail_all(&self, fail: bool) {
        *self.fail_all.lock() = fail;
    }

    /// Latencies handed out to calls in the order they arrive.
    pub fn queue_latencies(&self, latencies: &[u64]) {
        self.latencies
            .lock()
            .extend(latencies.iter().map(|ms| Duration::from_millis(*ms)));
    }

    pub fn server_tasks(&self) -> Vec<Task> {
        self.tasks.lock().clone()
    }

    /// The server applies a request as soon as it arrives; only the
    /// response is delayed.
    async fn respond<T>(&self, result: GatewayResult<T>) -> GatewayResult<T> {
        let latency = self.latencies.lock().pop_front();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        result
    }

    fn check_available(&self) -> GatewayResult<()> {
        if *self.fail_all.lock() {
            return Err(GatewayError::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }

    fn apply_create(&self, form: &TaskForm) -> GatewayResult<Task> {
        self.check_available()?;
        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            TaskId(*next)
        };
        let mut task = Task::new(id, form.title.clone());
        task.description = Some(form.description.clone());
        task.priority = form.priority.label().to_string();
        task.start_date = form.start_date;
        task.due_date = form.due_date;
        self.tasks.lock().push(task.clone());
        Ok(task)
    }

    fn apply_update(&self, id: TaskId, patch: &TaskPatch) -> GatewayResult<Task> {
        self.check_available()?;
        let mut tasks = self.tasks.lock();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Self::not_found(id))?;
        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = Some(description.clone());
        }
        if let Some(status) = patch.status {
            task.set_status(status);
        }
        if let Some(priority) = patch.priority {
            task.priority = priority.label().to_string();
        }
        if let Some(start) = patch.start_date {
            task.start_date = start;
        }
        if let Some(due) = patch.due_date {
            task.due_date = due;
        }
        Ok(task.clone())
    }

    fn apply_delete(&self, id: TaskId) -> GatewayResult<()> {
        self.check_available()?;
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == before {
            return Err(Self::not_found(id));
        }
        Ok(())
    }

    fn not_found(id: TaskId) -> GatewayError {
        GatewayError::Status {
            status: StatusCode::NOT_FOUND,
            body: format!("task {} not found", id),
        }
    }
}

#[async_trait]
impl TaskGateway for FakeGateway {
    async fn list(&self) -> GatewayResult<Vec<Task>> {
        let result = self.check_available().map(|_| self.tasks.lock().clone());
        self.respond(result).await
    }

    async fn create(&self, form: &TaskForm) -> GatewayResult<Task> {
        let result = self.apply_create(form);
        self.respond(result).await
    }

    async fn update(&self, id: TaskId, patch: &TaskPatch) -> GatewayResult<Task> {
        let result = self.apply_update(id, patch);
        self.respond(result).await
    }

    async fn delete(&self, id: TaskId) -> GatewayResult<()> {
        let result = self.apply_delete(id);
        self.respond(result).await
    }
}
