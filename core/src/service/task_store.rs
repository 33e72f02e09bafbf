//! Client-side task state and its reconciliation with the remote service.
//!
//! Mutations never block the caller: each one records a ticket, applies any
//! optimistic edit, and schedules the gateway call on the runtime. Failures
//! are logged and swallowed. The returned handle resolves to the outcome for
//! callers that want to wait.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::gateway::TaskGateway;
use crate::model::collection::TaskCollection;
use crate::model::form::{TaskForm, TaskPatch};
use crate::model::task::{Status, Task, TaskId};
use crate::service::reconcile::{
    MutationKind, MutationLedger, MutationOutcome, ReconcilePolicy, Target, Ticket,
};
use crate::usecase::drag::MoveIntent;

#[derive(Default)]
struct StoreState {
    tasks: Arc<TaskCollection>,
    ledger: MutationLedger,
}

impl StoreState {
    /// Copy-on-write: readers holding a snapshot keep the old collection.
    fn tasks_mut(&mut self) -> &mut TaskCollection {
        Arc::make_mut(&mut self.tasks)
    }
}

pub struct TaskStore<G: TaskGateway + 'static> {
    gateway: Arc<G>,
    state: Arc<Mutex<StoreState>>,
    runtime: Handle,
    policy: ReconcilePolicy,
}

impl<G: TaskGateway + 'static> Clone for TaskStore<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            state: Arc::clone(&self.state),
            runtime: self.runtime.clone(),
            policy: self.policy,
        }
    }
}

impl<G: TaskGateway + 'static> TaskStore<G> {
    pub fn new(gateway: Arc<G>, runtime: Handle) -> Self {
        Self {
            gateway,
            state: Arc::new(Mutex::new(StoreState::default())),
            runtime,
            policy: ReconcilePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The current collection. Later mutations do not alter a snapshot.
    pub fn snapshot(&self) -> Arc<TaskCollection> {
        Arc::clone(&self.state.lock().tasks)
    }

    pub fn pending(&self) -> Vec<Ticket> {
        self.state.lock().ledger.pending().to_vec()
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.state.lock().ledger.is_pending(id)
    }

    /// Drops every local task. In-flight responses still settle normally.
    pub fn clear(&self) {
        self.state.lock().tasks = Arc::new(TaskCollection::default());
    }

    fn issue(&self, kind: MutationKind, target: Target) -> Ticket {
        self.state.lock().ledger.issue(kind, target)
    }

    pub fn load(&self) -> JoinHandle<MutationOutcome> {
        let ticket = self.issue(MutationKind::Load, Target::All);
        let gateway = Arc::clone(&self.gateway);
        let state = Arc::clone(&self.state);

        self.runtime.spawn(async move {
            let result = gateway.list().await;
            let mut state = state.lock();
            state.ledger.settle(&ticket);

            match result {
                Ok(tasks) => {
                    let count = tasks.len();
                    state.tasks = Arc::new(TaskCollection::new(tasks));
                    tracing::info!(count, seq = ticket.seq, "tasks loaded");
                    MutationOutcome::Confirmed
                }
                Err(error) => {
                    tracing::error!(%error, seq = ticket.seq, "error fetching tasks");
                    MutationOutcome::Failed { rolled_back: false }
                }
            }
        })
    }

    pub fn create(&self, form: TaskForm) -> JoinHandle<MutationOutcome> {
        let draft = Uuid::new_v4();
        let ticket = self.issue(MutationKind::Create, Target::Draft(draft));
        tracing::debug!(%draft, title = %form.title, seq = ticket.seq, "create issued");
        let gateway = Arc::clone(&self.gateway);
        let state = Arc::clone(&self.state);

        self.runtime.spawn(async move {
            let result = gateway.create(&form).await;
            let mut state = state.lock();
            state.ledger.settle(&ticket);

            match result {
                Ok(task) => {
                    let id = task.id;
                    state.tasks_mut().upsert(task);
                    tracing::info!(task_id = %id, %draft, "task created");
                    MutationOutcome::Confirmed
                }
                Err(error) => {
                    tracing::error!(%error, %draft, "error creating task");
                    MutationOutcome::Failed { rolled_back: false }
                }
            }
        })
    }

    /// Sends the whole form. Local state only changes once the server answers.
    pub fn update(&self, id: TaskId, form: TaskForm) -> JoinHandle<MutationOutcome> {
        let ticket = self.issue(MutationKind::Update, Target::Task(id));
        let patch = TaskPatch::from(form);
        let gateway = Arc::clone(&self.gateway);
        let state = Arc::clone(&self.state);

        self.runtime.spawn(async move {
            let result = gateway.update(id, &patch).await;
            let mut state = state.lock();
            let newest = state.ledger.settle(&ticket);

            match result {
                Ok(server) => merge_response(&mut state, &ticket, id, newest, server, Some(&patch)),
                Err(error) => {
                    tracing::error!(%error, task_id = %id, "error updating task");
                    MutationOutcome::Failed { rolled_back: false }
                }
            }
        })
    }

    /// Applies `status` locally before the request is even sent.
    pub fn move_task(&self, id: TaskId, status: Status) -> JoinHandle<MutationOutcome> {
        let (ticket, previous) = {
            let mut state = self.state.lock();
            let previous = state.tasks.get(id).map(|t| t.status.clone());
            if previous.is_some() {
                if let Some(task) = state.tasks_mut().get_mut(id) {
                    task.set_status(status);
                }
            } else {
                tracing::warn!(task_id = %id, "moving a task that is not loaded");
            }
            (state.ledger.issue(MutationKind::Move, Target::Task(id)), previous)
        };
        tracing::debug!(task_id = %id, %status, seq = ticket.seq, "move applied locally");

        let gateway = Arc::clone(&self.gateway);
        let state = Arc::clone(&self.state);
        let policy = self.policy;

        self.runtime.spawn(async move {
            let result = gateway.update(id, &TaskPatch::status(status)).await;
            let mut state = state.lock();
            let newest = state.ledger.settle(&ticket);

            match result {
                Ok(server) => merge_response(&mut state, &ticket, id, newest, server, None),
                Err(error) => {
                    let restorable = policy.rollback_failed_moves && newest;
                    match previous {
                        Some(before) if restorable && state.tasks.contains(id) => {
                            if let Some(task) = state.tasks_mut().get_mut(id) {
                                task.status = before;
                            }
                            tracing::warn!(%error, task_id = %id, "move failed, status restored");
                            MutationOutcome::Failed { rolled_back: true }
                        }
                        _ => {
                            tracing::error!(%error, task_id = %id, %status, "error updating task status");
                            MutationOutcome::Failed { rolled_back: false }
                        }
                    }
                }
            }
        })
    }

    pub fn apply_intent(&self, intent: MoveIntent) -> JoinHandle<MutationOutcome> {
        self.move_task(intent.task_id, intent.status)
    }

    pub fn remove(&self, id: TaskId) -> JoinHandle<MutationOutcome> {
        let ticket = self.issue(MutationKind::Remove, Target::Task(id));
        let gateway = Arc::clone(&self.gateway);
        let state = Arc::clone(&self.state);

        self.runtime.spawn(async move {
            let result = gateway.delete(id).await;
            let mut state = state.lock();
            state.ledger.settle(&ticket);

            match result {
                // A confirmed delete is final whatever else was issued since.
                Ok(()) => match state.tasks_mut().remove(id) {
                    Some(_) => {
                        tracing::info!(task_id = %id, "task deleted");
                        MutationOutcome::Confirmed
                    }
                    None => {
                        tracing::debug!(task_id = %id, "deleted task was already gone");
                        MutationOutcome::Vanished
                    }
                },
                Err(error) => {
                    tracing::error!(%error, task_id = %id, "error deleting task");
                    MutationOutcome::Failed { rolled_back: false }
                }
            }
        })
    }
}

fn merge_response(
    state: &mut StoreState,
    ticket: &Ticket,
    id: TaskId,
    newest: bool,
    server: Task,
    edit: Option<&TaskPatch>,
) -> MutationOutcome {
    if !newest {
        tracing::debug!(task_id = %id, seq = ticket.seq, kind = ?ticket.kind, "stale response discarded");
        return MutationOutcome::Superseded;
    }
    if !state.tasks.contains(id) {
        tracing::warn!(task_id = %id, kind = ?ticket.kind, "response for a task no longer present");
        return MutationOutcome::Vanished;
    }
    if let Some(task) = state.tasks_mut().get_mut(id) {
        match edit {
            Some(patch) => task.merge_edit(server, patch),
            None => task.merge_from(server),
        }
    }
    tracing::info!(task_id = %id, kind = ?ticket.kind, "task updated");
    MutationOutcome::Confirmed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fake::FakeGateway;
    use crate::model::task::Priority;
    use crate::usecase::board::project_board;
    use crate::usecase::drag::DragSession;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn todo(id: u64) -> Task {
        Task::new(TaskId(id), format!("task {}", id))
    }

    fn store_with(tasks: Vec<Task>) -> (Arc<FakeGateway>, TaskStore<FakeGateway>) {
        let gateway = Arc::new(FakeGateway::with_tasks(tasks.clone()));
        let store = TaskStore::new(Arc::clone(&gateway), Handle::current());
        store.state.lock().tasks = Arc::new(TaskCollection::new(tasks));
        (gateway, store)
    }

    fn bucket_ids(store: &TaskStore<FakeGateway>, status: Status) -> Vec<TaskId> {
        let snapshot = store.snapshot();
        let board = project_board(snapshot.as_ref());
        board
            .iter()
            .find(|c| c.status == status)
            .map(|c| c.tasks.iter().map(|t| t.id).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_move_is_visible_before_the_response() {
        let (_gateway, store) = store_with(vec![todo(1)]);

        let handle = store.move_task(TaskId(1), Status::Completed);

        // Nothing has run on the runtime yet.
        assert!(store.is_pending(TaskId(1)));
        assert_eq!(bucket_ids(&store, Status::Completed), vec![TaskId(1)]);
        assert!(bucket_ids(&store, Status::ToDo).is_empty());

        assert_eq!(handle.await.unwrap(), MutationOutcome::Confirmed);
        assert_eq!(bucket_ids(&store, Status::Completed), vec![TaskId(1)]);
        assert!(store.pending().is_empty());
    }

    #[tokio::test]
    async fn test_failed_move_is_not_reverted_by_default() {
        let (gateway, store) = store_with(vec![todo(1)]);
        gateway.fail_all(true);

        let outcome = store.move_task(TaskId(1), Status::Completed).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Failed { rolled_back: false });
        assert_eq!(
            store.snapshot().get(TaskId(1)).unwrap().status(),
            Some(Status::Completed)
        );
        assert_eq!(gateway.server_tasks()[0].status(), Some(Status::ToDo));
    }

    #[tokio::test]
    async fn test_failed_move_rolls_back_when_enabled() {
        let (gateway, store) = store_with(vec![todo(1)]);
        let store = store.with_policy(ReconcilePolicy {
            rollback_failed_moves: true,
        });
        gateway.fail_all(true);

        let handle = store.move_task(TaskId(1), Status::Expired);
        assert_eq!(bucket_ids(&store, Status::Expired), vec![TaskId(1)]);

        assert_eq!(handle.await.unwrap(), MutationOutcome::Failed { rolled_back: true });
        assert_eq!(bucket_ids(&store, Status::ToDo), vec![TaskId(1)]);
    }

    #[tokio::test]
    async fn test_failed_remove_keeps_the_task() {
        let (gateway, store) = store_with(vec![todo(1)]);
        gateway.fail_all(true);

        let outcome = store.remove(TaskId(1)).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Failed { rolled_back: false });
        assert!(store.snapshot().contains(TaskId(1)));
    }

    #[tokio::test]
    async fn test_remove_drops_the_task_on_success() {
        let (gateway, store) = store_with(vec![todo(1), todo(2)]);

        let handle = store.remove(TaskId(1));
        assert!(store.snapshot().contains(TaskId(1)));

        assert_eq!(handle.await.unwrap(), MutationOutcome::Confirmed);
        assert!(!store.snapshot().contains(TaskId(1)));
        assert_eq!(gateway.server_tasks().len(), 1);
    }

    #[tokio::test]
    async fn test_update_waits_for_the_server_and_merges() {
        let (_gateway, store) = store_with(vec![todo(1)]);
        let mut form = TaskForm::new("Renamed");
        form.priority = Priority::High;
        form.due_date = NaiveDate::from_ymd_opt(2025, 9, 1);

        let handle = store.update(TaskId(1), form);
        assert_eq!(store.snapshot().get(TaskId(1)).unwrap().title, "task 1");

        assert_eq!(handle.await.unwrap(), MutationOutcome::Confirmed);
        let snapshot = store.snapshot();
        let task = snapshot.get(TaskId(1)).unwrap();
        assert_eq!(task.title, "Renamed");
        assert_eq!(task.priority(), Priority::High);
        assert_eq!(task.due_date, NaiveDate::from_ymd_opt(2025, 9, 1));
        assert_eq!(task.status(), Some(Status::ToDo));
    }

    #[tokio::test]
    async fn test_edit_can_clear_a_due_date() {
        let mut task = todo(1);
        task.due_date = NaiveDate::from_ymd_opt(2025, 1, 1);
        let (gateway, store) = store_with(vec![task.clone()]);

        let mut form = TaskForm::from_task(&task);
        let parsed = crate::input::parse_args(&["due:-".to_string()]);
        assert!(crate::input::apply_to_form(&parsed, &mut form).is_empty());
        assert_eq!(form.due_date, None);

        assert_eq!(store.update(TaskId(1), form).await.unwrap(), MutationOutcome::Confirmed);
        assert_eq!(store.snapshot().get(TaskId(1)).unwrap().due_date, None);
        assert_eq!(gateway.server_tasks()[0].due_date, None);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_entry_untouched() {
        let (gateway, store) = store_with(vec![todo(1)]);
        let before = store.snapshot();
        gateway.fail_all(true);

        let outcome = store.update(TaskId(1), TaskForm::new("never")).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Failed { rolled_back: false });
        assert_eq!(*store.snapshot(), *before);
    }

    #[tokio::test]
    async fn test_failed_create_adds_nothing() {
        let (gateway, store) = store_with(vec![]);
        gateway.fail_all(true);

        let outcome = store.create(TaskForm::new("lost")).await.unwrap();

        assert_eq!(outcome, MutationOutcome::Failed { rolled_back: false });
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_create_then_reload_round_trip() {
        let (_gateway, store) = store_with(vec![]);
        let mut form = TaskForm::new("Book flights");
        form.description = "before March".to_string();
        form.start_date = NaiveDate::from_ymd_opt(2025, 2, 1);
        form.due_date = NaiveDate::from_ymd_opt(2025, 2, 20);
        form.priority = Priority::Low;

        let handle = store.create(form.clone());
        assert!(store.snapshot().is_empty());
        assert_eq!(store.pending()[0].kind, MutationKind::Create);
        assert_eq!(handle.await.unwrap(), MutationOutcome::Confirmed);

        store.clear();
        assert_eq!(store.load().await.unwrap(), MutationOutcome::Confirmed);

        let snapshot = store.snapshot();
        let task = snapshot
            .iter()
            .find(|t| t.title == "Book flights")
            .expect("created task survives reload");
        assert_eq!(TaskForm::from_task(task), form);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_previous_collection() {
        let (gateway, store) = store_with(vec![todo(1)]);
        gateway.fail_all(true);

        let outcome = store.load().await.unwrap();

        assert_eq!(outcome, MutationOutcome::Failed { rolled_back: false });
        assert!(store.snapshot().contains(TaskId(1)));
    }

    #[tokio::test]
    async fn test_snapshot_is_not_torn_by_later_mutations() {
        let (_gateway, store) = store_with(vec![todo(1)]);
        let before = store.snapshot();

        store.move_task(TaskId(1), Status::WorkInProgress).await.unwrap();

        assert_eq!(before.get(TaskId(1)).unwrap().status(), Some(Status::ToDo));
        assert_eq!(
            store.snapshot().get(TaskId(1)).unwrap().status(),
            Some(Status::WorkInProgress)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_last_issued_write_wins() {
        let (gateway, store) = store_with(vec![todo(1)]);
        // First request answers last.
        gateway.queue_latencies(&[50, 10]);

        let slow = store.update(TaskId(1), TaskForm::new("first edit"));
        let fast = store.update(TaskId(1), TaskForm::new("second edit"));

        assert_eq!(fast.await.unwrap(), MutationOutcome::Confirmed);
        assert_eq!(slow.await.unwrap(), MutationOutcome::Superseded);
        assert_eq!(store.snapshot().get(TaskId(1)).unwrap().title, "second edit");
        assert_eq!(gateway.server_tasks()[0].title, "second edit");
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_response_after_delete_is_discarded() {
        let (gateway, store) = store_with(vec![todo(1)]);
        gateway.queue_latencies(&[50, 10]);

        let moved = store.move_task(TaskId(1), Status::WorkInProgress);
        let removed = store.remove(TaskId(1));

        assert_eq!(removed.await.unwrap(), MutationOutcome::Confirmed);
        assert_eq!(moved.await.unwrap(), MutationOutcome::Superseded);
        assert!(store.snapshot().is_empty());
        assert!(gateway.server_tasks().is_empty());
    }

    #[tokio::test]
    async fn test_drop_on_column_moves_through_the_store() {
        let (gateway, store) = store_with(vec![todo(1)]);
        let mut drag = DragSession::default();

        drag.begin(TaskId(1)).unwrap();
        let intent = drag.release(Some(Status::WorkInProgress)).unwrap();
        store.apply_intent(intent).await.unwrap();

        assert_eq!(gateway.server_tasks()[0].status(), Some(Status::WorkInProgress));
        assert_eq!(bucket_ids(&store, Status::WorkInProgress), vec![TaskId(1)]);
    }

    #[tokio::test]
    async fn test_cancelled_drag_never_reaches_the_store() {
        let (gateway, store) = store_with(vec![todo(1)]);
        let mut drag = DragSession::default();

        drag.begin(TaskId(1)).unwrap();
        assert!(drag.release(None).is_none());

        assert!(store.pending().is_empty());
        assert_eq!(gateway.server_tasks()[0].status(), Some(Status::ToDo));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create(String),
        Update(usize, String),
        Delete(usize),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            "[a-z]{1,8}".prop_map(Op::Create),
            (any::<usize>(), "[a-z]{1,8}").prop_map(|(i, t)| Op::Update(i, t)),
            any::<usize>().prop_map(Op::Delete),
        ]
    }

    proptest! {
        #[test]
        fn prop_successful_sequences_converge(ops in prop::collection::vec(op_strategy(), 1..20)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let (local, server) = runtime.block_on(async {
                let (gateway, store) = store_with(vec![todo(1), todo(2)]);
                for op in ops {
                    let ids: Vec<TaskId> = store.snapshot().iter().map(|t| t.id).collect();
                    let outcome = match op {
                        Op::Create(title) => store.create(TaskForm::new(title)).await.unwrap(),
                        Op::Update(i, title) if !ids.is_empty() => {
                            store.update(ids[i % ids.len()], TaskForm::new(title)).await.unwrap()
                        }
                        Op::Delete(i) if !ids.is_empty() => {
                            store.remove(ids[i % ids.len()]).await.unwrap()
                        }
                        _ => MutationOutcome::Confirmed,
                    };
                    assert_eq!(outcome, MutationOutcome::Confirmed);
                }

                let mut local = store.snapshot().as_slice().to_vec();
                let mut server = gateway.server_tasks();
                local.sort_by_key(|t| t.id);
                server.sort_by_key(|t| t.id);
                (local, server)
            });

            prop_assert_eq!(local, server);
        }
    }
}
