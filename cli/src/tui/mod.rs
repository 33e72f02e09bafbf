pub mod app;
pub mod ui;

use std::io;
use std::time::Duration;
use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use taskdeck_core::{TaskGateway, TaskStore};
use tokio::runtime::Handle;

use crate::tui::app::{App, InputMode, Tab};

pub fn run<G: TaskGateway + 'static>(store: TaskStore<G>, runtime: Handle) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, runtime);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!(error = %err, "tui exited with an error");
    }
    res
}

fn run_app<B: Backend, G: TaskGateway + 'static>(terminal: &mut Terminal<B>, app: &mut App<G>) -> Result<()> {
    loop {
        app.tick();
        terminal
            .draw(|f| ui::draw(f, app))
            .map_err(|e| io::Error::other(e.to_string()))?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if handle_key(app, key) {
                    return Ok(());
                }
            }
            Event::Mouse(mouse) => handle_mouse(app, mouse),
            _ => {}
        }
    }
}

/// Returns true when the user asked to quit.
fn handle_key<G: TaskGateway + 'static>(app: &mut App<G>, key: KeyEvent) -> bool {
    match app.input_mode {
        InputMode::Normal if app.drag.is_dragging() => match key.code {
            KeyCode::Esc => app.cancel_drag(),
            KeyCode::Left | KeyCode::Char('h') => app.shift_column(false),
            KeyCode::Right | KeyCode::Char('l') => app.shift_column(true),
            KeyCode::Char(' ') | KeyCode::Enter => app.grab_or_drop(),
            _ => {}
        },
        InputMode::Normal => match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => app.next_tab(),
            KeyCode::Char('1') => app.set_tab(Tab::Board),
            KeyCode::Char('2') => app.set_tab(Tab::Table),
            KeyCode::Char('3') => app.set_tab(Tab::Analytics),
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::Left | KeyCode::Char('h') => app.shift_column(false),
            KeyCode::Right | KeyCode::Char('l') => app.shift_column(true),
            KeyCode::Char(' ') | KeyCode::Enter => app.grab_or_drop(),
            KeyCode::Char('d') | KeyCode::Delete => app.ask_delete(),
            KeyCode::Char('a') => app.enter_add_mode(),
            KeyCode::Char('e') => app.enter_edit_mode(),
            KeyCode::Char('r') => app.reload(),
            _ => {}
        },
        InputMode::ConfirmDelete(_) => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_delete(true),
            _ => app.confirm_delete(false),
        },
        InputMode::Adding | InputMode::Editing(_) => match key.code {
            KeyCode::Enter => app.submit_command(),
            KeyCode::Esc => app.exit_input_mode(),
            KeyCode::Char(c) => app.input_char(c),
            KeyCode::Backspace => app.delete_char(),
            KeyCode::Left => app.move_cursor_left(),
            KeyCode::Right => app.move_cursor_right(),
            _ => {}
        },
    }
    false
}

fn handle_mouse<G: TaskGateway + 'static>(app: &mut App<G>, mouse: MouseEvent) {
    let (x, y) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.mouse_down(x, y),
        MouseEventKind::Drag(MouseButton::Left) => app.mouse_drag(x, y),
        MouseEventKind::Up(MouseButton::Left) => app.mouse_up(x, y),
        MouseEventKind::ScrollDown if !app.drag.is_dragging() => app.next(),
        MouseEventKind::ScrollUp if !app.drag.is_dragging() => app.previous(),
        _ => {}
    }
}
