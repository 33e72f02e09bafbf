use ratatui::layout::{Position, Rect};
use ratatui::widgets::TableState;
use taskdeck_core::{
    apply_to_form, parse_args, project_board, split_words, DragSession, MutationOutcome, Status,
    Task, TaskForm, TaskGateway, TaskId, TaskStore,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Board,
    Table,
    Analytics,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Board, Tab::Table, Tab::Analytics];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Board => "Board",
            Tab::Table => "Table",
            Tab::Analytics => "Analytics",
        }
    }

    pub fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Adding,
    Editing(TaskId),
    ConfirmDelete(TaskId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardHit {
    pub id: TaskId,
    pub column: usize,
    pub row: usize,
    pub rect: Rect,
}

/// Screen regions from the last frame, used to resolve mouse positions.
#[derive(Debug, Default)]
pub struct HitMap {
    pub columns: Vec<(Status, Rect)>,
    pub cards: Vec<CardHit>,
}

impl HitMap {
    pub fn clear(&mut self) {
        self.columns.clear();
        self.cards.clear();
    }

    pub fn column_at(&self, x: u16, y: u16) -> Option<Status> {
        let pos = Position::new(x, y);
        self.columns
            .iter()
            .find(|(_, rect)| rect.contains(pos))
            .map(|(status, _)| *status)
    }

    pub fn card_at(&self, x: u16, y: u16) -> Option<CardHit> {
        let pos = Position::new(x, y);
        self.cards.iter().find(|c| c.rect.contains(pos)).copied()
    }
}

pub struct Message {
    pub text: String,
    pub error: bool,
}

pub struct App<G: TaskGateway + 'static> {
    pub store: TaskStore<G>,
    runtime: Handle,
    pub tab: Tab,
    pub column: usize,
    pub row: usize,
    pub table_state: TableState,
    pub drag: DragSession,
    /// Column the carried card would land in.
    pub hover: Option<Status>,
    pub hits: HitMap,
    pub input: String,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub message: Option<Message>,
    inflight: Vec<(&'static str, JoinHandle<MutationOutcome>)>,
}

impl<G: TaskGateway + 'static> App<G> {
    pub fn new(store: TaskStore<G>, runtime: Handle) -> Self {
        let mut app = App {
            store,
            runtime,
            tab: Tab::Board,
            column: 0,
            row: 0,
            table_state: TableState::default(),
            drag: DragSession::default(),
            hover: None,
            hits: HitMap::default(),
            input: String::new(),
            input_mode: InputMode::Normal,
            cursor_position: 0,
            message: None,
            inflight: Vec::new(),
        };
        app.reload();
        app
    }

    fn track(&mut self, action: &'static str, handle: JoinHandle<MutationOutcome>) {
        self.inflight.push((action, handle));
    }

    fn info(&mut self, text: impl Into<String>) {
        self.message = Some(Message { text: text.into(), error: false });
    }

    fn fail(&mut self, text: impl Into<String>) {
        self.message = Some(Message { text: text.into(), error: true });
    }

    /// Collects outcomes of finished mutations. Called once per frame.
    pub fn tick(&mut self) {
        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.inflight)
            .into_iter()
            .partition(|(_, handle)| handle.is_finished());
        self.inflight = running;

        for (action, handle) in finished {
            match self.runtime.block_on(handle) {
                Ok(MutationOutcome::Failed { rolled_back: true }) => {
                    self.fail(format!("{} failed, change reverted", action))
                }
                Ok(MutationOutcome::Failed { rolled_back: false }) => {
                    self.fail(format!("{} failed, see log for details", action))
                }
                Ok(MutationOutcome::Vanished) => self.info(format!("{}: task no longer exists", action)),
                Ok(MutationOutcome::Confirmed) if action == "Load" => self.message = None,
                Ok(_) => {}
                Err(e) => self.fail(format!("{} aborted: {}", action, e)),
            }
        }
        self.clamp_selection();
    }

    pub fn busy(&self) -> bool {
        !self.inflight.is_empty()
    }

    pub fn reload(&mut self) {
        let handle = self.store.load();
        self.track("Load", handle);
        self.info("Loading tasks...");
    }

    pub fn set_tab(&mut self, tab: Tab) {
        if self.drag.is_dragging() {
            return;
        }
        self.tab = tab;
        self.clamp_selection();
    }

    pub fn next_tab(&mut self) {
        let next = Tab::ALL[(self.tab.index() + 1) % Tab::ALL.len()];
        self.set_tab(next);
    }

    fn column_len(&self, column: usize) -> usize {
        let snapshot = self.store.snapshot();
        project_board(snapshot.as_ref())
            .get(column)
            .map_or(0, |c| c.tasks.len())
    }

    fn clamp_selection(&mut self) {
        let len = self.column_len(self.column);
        if self.row >= len {
            self.row = len.saturating_sub(1);
        }

        let rows = self.store.snapshot().len();
        match self.table_state.selected() {
            _ if rows == 0 => self.table_state.select(None),
            Some(i) if i >= rows => self.table_state.select(Some(rows - 1)),
            None => self.table_state.select(Some(0)),
            _ => {}
        }
    }

    pub fn selected_task(&self) -> Option<Task> {
        let snapshot = self.store.snapshot();
        match self.tab {
            Tab::Board => project_board(snapshot.as_ref())
                .get(self.column)
                .and_then(|c| c.tasks.get(self.row))
                .map(|t| (*t).clone()),
            Tab::Table => self
                .table_state
                .selected()
                .and_then(|i| snapshot.as_slice().get(i))
                .cloned(),
            Tab::Analytics => None,
        }
    }

    pub fn next(&mut self) {
        match self.tab {
            Tab::Board => {
                let len = self.column_len(self.column);
                if len > 0 {
                    self.row = (self.row + 1) % len;
                }
            }
            Tab::Table => {
                let len = self.store.snapshot().len();
                if len == 0 {
                    return;
                }
                let i = match self.table_state.selected() {
                    Some(i) if i + 1 < len => i + 1,
                    _ => 0,
                };
                self.table_state.select(Some(i));
            }
            Tab::Analytics => {}
        }
    }

    pub fn previous(&mut self) {
        match self.tab {
            Tab::Board => {
                let len = self.column_len(self.column);
                if len > 0 {
                    self.row = if self.row == 0 { len - 1 } else { self.row - 1 };
                }
            }
            Tab::Table => {
                let len = self.store.snapshot().len();
                if len == 0 {
                    return;
                }
                let i = match self.table_state.selected() {
                    Some(0) | None => len - 1,
                    Some(i) => i - 1,
                };
                self.table_state.select(Some(i));
            }
            Tab::Analytics => {}
        }
    }

    /// Left/right on the board. While carrying a card this moves the drop
    /// target instead of the selection.
    pub fn shift_column(&mut self, forward: bool) {
        if self.tab != Tab::Board {
            return;
        }
        let count = Status::ALL.len();
        if self.drag.is_dragging() {
            let current = self
                .hover
                .and_then(|s| Status::ALL.iter().position(|x| *x == s))
                .unwrap_or(self.column);
            let target = if forward { (current + 1) % count } else { (current + count - 1) % count };
            self.hover = Some(Status::ALL[target]);
            return;
        }
        self.column = if forward { (self.column + 1) % count } else { (self.column + count - 1) % count };
        self.row = 0;
    }

    // --- Drag and drop ---

    /// Keyboard pick-up of the selected card, or drop if one is carried.
    pub fn grab_or_drop(&mut self) {
        if self.drag.is_dragging() {
            let target = self.hover;
            self.drop_on(target);
            return;
        }
        if self.tab != Tab::Board {
            return;
        }
        if let Some(task) = self.selected_task() {
            self.begin_drag(task.id, Some(Status::ALL[self.column]));
        }
    }

    fn begin_drag(&mut self, id: TaskId, hover: Option<Status>) {
        match self.drag.begin(id) {
            Ok(()) => {
                self.hover = hover;
                self.info(format!("Moving #{}: choose a column and release", id));
            }
            Err(e) => self.fail(e.to_string()),
        }
    }

    fn drop_on(&mut self, target: Option<Status>) {
        let intent = self.drag.release(target);
        self.hover = None;
        self.drag.reset();

        match intent {
            Some(intent) => {
                let handle = self.store.apply_intent(intent);
                self.track("Move", handle);
                self.follow(intent.task_id, intent.status);
                self.info(format!("Moved #{} to {}", intent.task_id, intent.status));
            }
            None => self.info("Move cancelled"),
        }
    }

    pub fn cancel_drag(&mut self) {
        if self.drag.is_dragging() {
            self.drop_on(None);
        }
    }

    /// Keeps the selection on a card after it changed column.
    fn follow(&mut self, id: TaskId, status: Status) {
        let Some(column) = Status::ALL.iter().position(|s| *s == status) else {
            return;
        };
        let snapshot = self.store.snapshot();
        let board = project_board(snapshot.as_ref());
        if let Some(row) = board[column].tasks.iter().position(|t| t.id == id) {
            self.column = column;
            self.row = row;
        }
    }

    pub fn mouse_down(&mut self, x: u16, y: u16) {
        if self.tab != Tab::Board || self.input_mode != InputMode::Normal {
            return;
        }
        if let Some(card) = self.hits.card_at(x, y) {
            self.column = card.column;
            self.row = card.row;
            let hover = self.hits.column_at(x, y);
            self.begin_drag(card.id, hover);
        }
    }

    pub fn mouse_drag(&mut self, x: u16, y: u16) {
        if self.drag.is_dragging() {
            self.hover = self.hits.column_at(x, y);
        }
    }

    pub fn mouse_up(&mut self, x: u16, y: u16) {
        if self.drag.is_dragging() {
            let target = self.hits.column_at(x, y);
            self.drop_on(target);
        }
    }

    // --- Delete ---

    pub fn ask_delete(&mut self) {
        if let Some(task) = self.selected_task() {
            self.input_mode = InputMode::ConfirmDelete(task.id);
        }
    }

    pub fn confirm_delete(&mut self, yes: bool) {
        if let InputMode::ConfirmDelete(id) = self.input_mode {
            if yes {
                let handle = self.store.remove(id);
                self.track("Delete", handle);
                self.info(format!("Deleting #{}", id));
            }
        }
        self.input_mode = InputMode::Normal;
    }

    // --- Input line ---

    pub fn enter_add_mode(&mut self) {
        self.input_mode = InputMode::Adding;
        self.input.clear();
        self.cursor_position = 0;
    }

    pub fn enter_edit_mode(&mut self) {
        if let Some(task) = self.selected_task() {
            self.input = form_line(&TaskForm::from_task(&task));
            self.cursor_position = self.input.chars().count();
            self.input_mode = InputMode::Editing(task.id);
        }
    }

    pub fn exit_input_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn input_char(&mut self, c: char) {
        let byte_index = self.input.chars().take(self.cursor_position).map(|c| c.len_utf8()).sum();
        self.input.insert(byte_index, c);
        self.cursor_position += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let byte_index: usize = self.input.chars().take(self.cursor_position - 1).map(|c| c.len_utf8()).sum();
            self.input.remove(byte_index);
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn submit_command(&mut self) {
        if self.input.trim().is_empty() {
            self.exit_input_mode();
            return;
        }

        let (mut form, editing) = match self.input_mode {
            InputMode::Adding => (TaskForm::default(), None),
            InputMode::Editing(id) => match self.store.snapshot().get(id) {
                Some(task) => (TaskForm::from_task(task), Some(id)),
                None => {
                    self.fail(format!("Task #{} is no longer loaded", id));
                    self.exit_input_mode();
                    return;
                }
            },
            _ => return,
        };

        let parsed = parse_args(&split_words(&self.input));
        let warnings = apply_to_form(&parsed, &mut form);

        // Invalid input keeps the line open for correction.
        if let Err(errors) = form.validate() {
            let text: Vec<String> = errors.iter().map(ToString::to_string).collect();
            self.fail(text.join("; "));
            return;
        }

        match editing {
            None => {
                let handle = self.store.create(form);
                self.track("Create", handle);
            }
            Some(id) => {
                let handle = self.store.update(id, form);
                self.track("Update", handle);
            }
        }

        if warnings.is_empty() {
            self.message = None;
        } else {
            self.fail(warnings.join("; "));
        }
        self.input.clear();
        self.cursor_position = 0;
        self.exit_input_mode();
    }
}

/// Renders a form back into the `key:value` syntax the input line accepts.
pub fn form_line(form: &TaskForm) -> String {
    let mut parts = vec![form.title.clone()];
    if !form.description.is_empty() {
        parts.push(format!("desc:\"{}\"", form.description.replace('"', "'")));
    }
    if let Some(d) = form.start_date {
        parts.push(format!("start:{}", d.format("%Y-%m-%d")));
    }
    if let Some(d) = form.due_date {
        parts.push(format!("due:{}", d.format("%Y-%m-%d")));
    }
    parts.push(format!("pri:{}", form.priority.label().to_lowercase()));
    parts.join(" ")
}
