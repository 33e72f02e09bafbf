pub mod config;
pub mod gateway;
pub mod input;
pub mod model;
pub mod service;
pub mod time;
pub mod usecase;

pub use config::AppConfig;
pub use gateway::{GatewayError, GatewayResult, HttpTaskGateway, TaskGateway};
pub use input::{apply_to_form, expand_key, parse_args, split_words, ParsedInput};
pub use model::collection::TaskCollection;
pub use model::form::{FormError, TaskForm, TaskPatch};
pub use model::task::{Priority, Status, Task, TaskId};
pub use service::dto::{AnalyticsReport, TaskRow};
pub use service::reconcile::{MutationOutcome, ReconcilePolicy};
pub use service::task_store::TaskStore;
pub use time::parse_human_date;
pub use usecase::analytics::build_report;
pub use usecase::board::{project_board, BoardColumn};
pub use usecase::drag::{DragSession, DragState, MoveIntent};
pub use usecase::table::TableView;
