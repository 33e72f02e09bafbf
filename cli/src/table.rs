use tabled::builder::Builder;
use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};
use taskdeck_core::{project_board, Status, TableView, TaskCollection};
use taskdeck_core::usecase::board::unplaced;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TITLE_WIDTH: usize = 32;
const DESCRIPTION_WIDTH: usize = 40;
const CARD_WIDTH: usize = 24;

#[derive(Tabled)]
struct ListRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Start Date")]
    start: String,
    #[tabled(rename = "Due Date")]
    due: String,
}

/// Cuts `text` to at most `max` terminal columns, marking the cut with `…`.
pub fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn paint(text: &str, (r, g, b): (u8, u8, u8)) -> String {
    format!("\x1b[1;38;2;{};{};{}m{}\x1b[0m", r, g, b, text)
}

pub fn show_table(tasks: &TaskCollection) {
    let view = TableView::from_tasks(tasks);
    if view.rows.is_empty() {
        println!("No tasks found.");
        println!("{}", view.summary());
        return;
    }

    let rows: Vec<ListRow> = view
        .rows
        .iter()
        .map(|row| ListRow {
            id: row.id.to_string(),
            title: truncate(&row.title, TITLE_WIDTH),
            description: truncate(&row.description, DESCRIPTION_WIDTH),
            status: paint(row.status.label(), row.status.color()),
            priority: paint(row.priority.label(), row.priority.color()),
            start: row.start_date.clone(),
            due: row.due_date.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));

    println!("{}", table);
    println!("{}", view.summary());
}

pub fn show_board(tasks: &TaskCollection) {
    let board = project_board(tasks);
    let depth = board.iter().map(|c| c.tasks.len()).max().unwrap_or(0);

    let mut builder = Builder::default();
    builder.push_record(
        board
            .iter()
            .map(|c| paint(&format!("{} ({})", c.status, c.tasks.len()), c.status.color())),
    );
    for i in 0..depth {
        builder.push_record(board.iter().map(|c| match c.tasks.get(i) {
            Some(task) => format!(
                "#{} {}\n{}",
                task.id,
                truncate(&task.title, CARD_WIDTH),
                paint(task.priority().label(), task.priority().color())
            ),
            None => String::new(),
        }));
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{}", table);

    let hidden = unplaced(tasks);
    if !hidden.is_empty() {
        let ids: Vec<String> = hidden.iter().map(|t| format!("#{}", t.id)).collect();
        println!(
            "{} task(s) with a status outside {:?} are not shown: {}",
            hidden.len(),
            Status::ALL.map(Status::label),
            ids.join(", ")
        );
    }
}
