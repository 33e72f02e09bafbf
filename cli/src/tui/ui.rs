use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, BorderType, Cell, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};
use taskdeck_core::{build_report, project_board, TableView, Task, TaskGateway};
use taskdeck_core::usecase::board::unplaced;
use unicode_width::UnicodeWidthStr;

use crate::stats::{draw_analytics, rgb};
use crate::table::truncate;
use crate::tui::app::{App, CardHit, InputMode, Tab};

const CARD_HEIGHT: u16 = 4;

pub fn draw<G: TaskGateway + 'static>(f: &mut Frame, app: &mut App<G>) {
    let size = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3), // Tabs
            Constraint::Min(1),    // Content
            Constraint::Length(3), // Input / status
            Constraint::Length(1), // Footer/Help
        ])
        .split(size);

    draw_tabs(f, app, main_chunks[0]);

    app.hits.clear();
    match app.tab {
        Tab::Board => draw_board(f, app, main_chunks[1]),
        Tab::Table => draw_table(f, app, main_chunks[1]),
        Tab::Analytics => {
            let snapshot = app.store.snapshot();
            draw_analytics(f, &build_report(snapshot.as_ref()), main_chunks[1]);
        }
    }

    draw_input(f, app, main_chunks[2]);

    let help = match app.tab {
        Tab::Board if app.drag.is_dragging() => "h/l: Target column | Space/Enter: Drop | Esc: Cancel",
        Tab::Board => "h/j/k/l: Navigate | Space or mouse: Drag | a: Add | e: Edit | d: Delete | r: Reload | Tab: View | q: Quit",
        Tab::Table => "j/k: Navigate | a: Add | e: Edit | d: Delete | r: Reload | Tab: View | q: Quit",
        Tab::Analytics => "r: Reload | Tab: View | q: Quit",
    };
    let footer = Paragraph::new(help)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    f.render_widget(footer, main_chunks[3]);
}

fn draw_tabs<G: TaskGateway + 'static>(f: &mut Frame, app: &App<G>, area: Rect) {
    let spinner = if app.busy() { " ⟳ " } else { "" };
    let tabs = Tabs::new(Tab::ALL.map(Tab::title).to_vec())
        .select(app.tab.index())
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .title(format!(" TASKDECK{} ", spinner))
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded),
        );
    f.render_widget(tabs, area);
}

fn card_lines<'a>(task: &'a Task, width: usize) -> Vec<Line<'a>> {
    let priority = task.priority();
    let due = task
        .due_date
        .map(|d| d.format("%b %-d").to_string())
        .unwrap_or_default();
    vec![
        Line::from(Span::styled(
            truncate(&task.title, width),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(priority.label(), Style::default().fg(rgb(priority.color()))),
            Span::raw("  "),
            Span::styled(due, Style::default().fg(Color::DarkGray)),
        ]),
    ]
}

fn draw_board<G: TaskGateway + 'static>(f: &mut Frame, app: &mut App<G>, area: Rect) {
    let snapshot = app.store.snapshot();
    let board = project_board(snapshot.as_ref());
    let carried = app.drag.payload();
    let stray = unplaced(snapshot.as_ref()).len();

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, board.len() as u32); 4])
        .split(area);

    for (ci, (column, rect)) in board.iter().zip(columns.iter()).enumerate() {
        let color = rgb(column.status.color());
        let targeted = carried.is_some() && app.hover == Some(column.status);
        let mut block = Block::default()
            .title(Span::styled(
                format!(" {} ({}) ", column.status, column.tasks.len()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .borders(Borders::ALL)
            .border_type(if targeted { BorderType::Thick } else { BorderType::Rounded })
            .border_style(Style::default().fg(if targeted { color } else { Color::DarkGray }));
        if stray > 0 && ci + 1 == board.len() {
            block = block.title_bottom(
                Line::from(format!(" {} not shown ", stray)).alignment(Alignment::Right),
            );
        }
        let inner = block.inner(*rect);
        f.render_widget(block, *rect);
        app.hits.columns.push((column.status, *rect));

        let visible = (inner.height / CARD_HEIGHT).max(1) as usize;
        let offset = if ci == app.column && app.row >= visible { app.row + 1 - visible } else { 0 };

        for (slot, (row, task)) in column.tasks.iter().enumerate().skip(offset).take(visible).enumerate() {
            let card_rect = Rect {
                x: inner.x,
                y: inner.y + slot as u16 * CARD_HEIGHT,
                width: inner.width,
                height: CARD_HEIGHT.min(inner.height),
            };
            let selected = ci == app.column && row == app.row && app.tab == Tab::Board;
            let pending = app.store.is_pending(task.id);

            let mut style = Style::default();
            if Some(task.id) == carried {
                style = style.add_modifier(Modifier::DIM | Modifier::ITALIC);
            }
            let border = if selected { color } else { Color::DarkGray };
            let title = format!("#{}{}", task.id, if pending { " …" } else { "" });

            let card = Paragraph::new(card_lines(task, inner.width.saturating_sub(2) as usize))
                .style(style)
                .block(
                    Block::default()
                        .title(Span::styled(title, Style::default().fg(Color::DarkGray)))
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(border)),
                );
            f.render_widget(card, card_rect);
            app.hits.cards.push(CardHit { id: task.id, column: ci, row, rect: card_rect });
        }

        let hidden = column.tasks.len().saturating_sub(offset + visible);
        if hidden > 0 && inner.height > 0 {
            let more = Paragraph::new(format!("+{} more", hidden))
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Right);
            let last = Rect { y: inner.y + inner.height - 1, height: 1, ..inner };
            f.render_widget(more, last);
        }
    }
}

fn draw_table<G: TaskGateway + 'static>(f: &mut Frame, app: &mut App<G>, area: Rect) {
    let snapshot = app.store.snapshot();
    let view = TableView::from_tasks(snapshot.as_ref());

    let rows: Vec<Row> = view
        .rows
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.title.clone()).style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(row.description.clone()),
                Cell::from(row.status.label()).style(Style::default().fg(rgb(row.status.color()))),
                Cell::from(row.priority.label()).style(Style::default().fg(rgb(row.priority.color()))),
                Cell::from(row.start_date.clone()),
                Cell::from(row.due_date.clone()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(22), // Title
            Constraint::Min(10),        // Description
            Constraint::Length(18),     // Status
            Constraint::Length(8),      // Priority
            Constraint::Length(13),     // Start
            Constraint::Length(13),     // Due
        ],
    )
    .header(
        Row::new(vec!["Title", "Description", "Status", "Priority", "Start Date", "Due Date"])
            .style(Style::default().fg(Color::Yellow)),
    )
    .block(
        Block::default()
            .title(" Tasks ")
            .title_bottom(Line::from(format!(" {} ", view.summary())).alignment(Alignment::Right))
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded),
    )
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol(">> ");

    f.render_stateful_widget(table, area, &mut app.table_state);
}

fn draw_input<G: TaskGateway + 'static>(f: &mut Frame, app: &App<G>, area: Rect) {
    let block = Block::default().borders(Borders::ALL).border_type(BorderType::Rounded);

    match app.input_mode {
        InputMode::Adding | InputMode::Editing(_) => {
            let title = match app.input_mode {
                InputMode::Editing(id) => format!(" Edit #{} (Enter: save, Esc: cancel) ", id),
                _ => " New task: title desc:\"..\" start:date due:date pri:h|m|l ".to_string(),
            };
            let input = Paragraph::new(app.input.as_str())
                .style(Style::default().fg(Color::Yellow))
                .block(block.title(title).border_style(Style::default().fg(Color::Yellow)));
            f.render_widget(input, area);

            let before: String = app.input.chars().take(app.cursor_position).collect();
            f.set_cursor_position(Position::new(area.x + 1 + before.width() as u16, area.y + 1));
        }
        InputMode::ConfirmDelete(id) => {
            let title = app
                .store
                .snapshot()
                .get(id)
                .map(|t| t.title.clone())
                .unwrap_or_default();
            let prompt = Paragraph::new(format!("Delete #{} \"{}\"? (y/n)", id, title))
                .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
                .block(block);
            f.render_widget(prompt, area);
        }
        InputMode::Normal => {
            let (text, color) = match &app.message {
                Some(m) if m.error => (m.text.as_str(), Color::Red),
                Some(m) => (m.text.as_str(), Color::Green),
                None => ("", Color::Reset),
            };
            let status = Paragraph::new(text)
                .style(Style::default().fg(color))
                .wrap(Wrap { trim: true })
                .block(block);
            f.render_widget(status, area);
        }
    }
}
