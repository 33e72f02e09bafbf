use std::{io, time::Duration};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Bar, BarChart, BarGroup, Block, Borders, BorderType, Cell, Gauge, Paragraph, Row, Table},
};
use taskdeck_core::AnalyticsReport;

// --- THEME ---
struct Theme {
    primary: Color,
    muted: Color,
    text: Color,
    good: Color,
    bad: Color,
}

const THEME: Theme = Theme {
    primary: Color::Cyan,
    muted: Color::DarkGray,
    text: Color::White,
    good: Color::Rgb(0x00, 0xC4, 0x9F),
    bad: Color::Rgb(0xF7, 0x37, 0x4F),
};

pub fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

/// Full-screen dashboard for the `stats` command.
pub fn run(report: &AnalyticsReport) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = (|| -> Result<()> {
        loop {
            terminal.draw(|f| {
                let area = f.area();
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .margin(1)
                    .constraints([Constraint::Min(10), Constraint::Length(1)])
                    .split(area);
                draw_analytics(f, report, chunks[0]);
                let help = Paragraph::new(Line::from(vec![
                    Span::styled("QUIT: ", Style::default().fg(THEME.muted)),
                    Span::styled("q", Style::default().fg(THEME.text)),
                ]))
                .alignment(Alignment::Center);
                f.render_widget(help, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press
                        && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                    {
                        return Ok(());
                    }
                }
            }
        }
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

pub fn draw_analytics(frame: &mut Frame, report: &AnalyticsReport, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),  // Summary cards
            Constraint::Min(8),     // Charts
            Constraint::Length(9),  // Recently completed
        ])
        .split(area);

    draw_summary(frame, report, rows[0]);

    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[1]);
    draw_status_chart(frame, report, charts[0]);
    draw_priority_chart(frame, report, charts[1]);

    draw_recent(frame, report, rows[2]);
}

fn card<'a>(title: &'a str) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(THEME.muted))
        .title(title)
}

fn draw_summary(frame: &mut Frame, report: &AnalyticsReport, area: Rect) {
    let cells = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let figure = |value: String, color: Color| {
        Paragraph::new(Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
    };

    frame.render_widget(
        figure(report.total.to_string(), THEME.primary).block(card(" Total Tasks ")),
        cells[0],
    );

    let gauge = Gauge::default()
        .block(card(" Completion Rate "))
        .gauge_style(Style::default().fg(THEME.good))
        .ratio((report.completion_rate as f64 / 100.0).min(1.0))
        .label(format!("{}%", report.completion_rate));
    frame.render_widget(gauge, cells[1]);

    frame.render_widget(
        figure(format!("{:.1} days", report.avg_completion_days), THEME.text)
            .block(card(" Avg. Completion Time ")),
        cells[2],
    );

    let overdue_color = if report.overdue > 0 { THEME.bad } else { THEME.good };
    frame.render_widget(
        figure(report.overdue.to_string(), overdue_color).block(card(" Overdue ")),
        cells[3],
    );
}

fn draw_status_chart(frame: &mut Frame, report: &AnalyticsReport, area: Rect) {
    let bars: Vec<Bar> = report
        .by_status
        .iter()
        .map(|s| {
            Bar::default()
                .label(s.status.label())
                .value(s.count as u64)
                .style(Style::default().fg(rgb(s.status.color())))
                .text_value(s.count.to_string())
        })
        .collect();

    let chart = BarChart::default()
        .block(card(" Task Status Distribution "))
        .bar_width(12)
        .bar_gap(2)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn draw_priority_chart(frame: &mut Frame, report: &AnalyticsReport, area: Rect) {
    let bars: Vec<Bar> = report
        .by_priority
        .iter()
        .map(|p| {
            Bar::default()
                .label(p.priority.label())
                .value(p.count as u64)
                .style(Style::default().fg(rgb(p.priority.color())))
                .text_value(p.count.to_string())
        })
        .collect();

    let chart = BarChart::default()
        .block(card(" Priority Distribution "))
        .bar_width(8)
        .bar_gap(2)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn draw_recent(frame: &mut Frame, report: &AnalyticsReport, area: Rect) {
    if report.recently_completed.is_empty() {
        frame.render_widget(
            Paragraph::new("No completed tasks yet")
                .style(Style::default().fg(THEME.muted))
                .alignment(Alignment::Center)
                .block(card(" Recently Completed ")),
            area,
        );
        return;
    }

    let rows: Vec<Row> = report
        .recently_completed
        .iter()
        .map(|c| {
            let took = c
                .days_taken
                .map(|d| format!("{} days", d))
                .unwrap_or_else(|| "-".to_string());
            Row::new(vec![
                Cell::from(c.title.clone()),
                Cell::from(c.completed_on.clone()),
                Cell::from(took),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Min(20), Constraint::Length(14), Constraint::Length(10)],
    )
    .header(Row::new(vec!["Task", "Completed", "Took"]).style(Style::default().fg(THEME.primary)))
    .block(card(" Recently Completed "));
    frame.render_widget(table, area);
}
