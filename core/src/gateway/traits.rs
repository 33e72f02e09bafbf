use async_trait::async_trait;

use crate::gateway::error::GatewayError;
use crate::model::form::{TaskForm, TaskPatch};
use crate::model::task::{Task, TaskId};

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Remote task resource. One call per method, no retries.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    async fn list(&self) -> GatewayResult<Vec<Task>>;
    async fn create(&self, form: &TaskForm) -> GatewayResult<Task>;
    async fn update(&self, id: TaskId, patch: &TaskPatch) -> GatewayResult<Task>;
    async fn delete(&self, id: TaskId) -> GatewayResult<()>;
}
