pub mod dto;
pub mod reconcile;
pub mod task_store;
