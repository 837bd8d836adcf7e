use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame,
};

use super::{mastery_bar, truncate};
use crate::models::MasteryLevel;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Stats + mastery row
            Constraint::Length(3), // Daily mission
            Constraint::Min(0),    // Areas + recent sessions
        ])
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[0]);
    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[2]);

    draw_stats(f, app, top[0]);
    draw_mastery(f, app, top[1]);
    draw_mission(f, app, chunks[1]);
    draw_areas(f, app, bottom[0]);
    draw_recent_sessions(f, app, bottom[1]);
}

fn stat_line<'a>(label: &'a str, value: String, color: Color) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(color)),
    ])
}

fn draw_stats(f: &mut Frame, app: &App, area: Rect) {
    let stats = &app.stats;

    let text = vec![
        Line::from(vec![
            Span::styled("Cards: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}", stats.total_cards),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        stat_line("Studied: ", format!("{}", stats.studied_cards), Color::White),
        stat_line("Attempts: ", format!("{}", stats.total_attempts), Color::White),
        stat_line(
            "Accuracy: ",
            format!("{:.0}%", stats.accuracy() * 100.0),
            Color::Cyan,
        ),
        stat_line(
            "Needs review: ",
            format!("{}", stats.needs_review),
            if stats.needs_review > 0 {
                Color::Yellow
            } else {
                Color::White
            },
        ),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Stats ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn draw_mastery(f: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = MasteryLevel::ALL
        .iter()
        .rev()
        .map(|level| {
            Line::from(vec![
                Span::styled(mastery_bar(*level), Style::default().fg(Color::Green)),
                Span::raw(" "),
                Span::styled(
                    format!("{:<13}", level.label()),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{}", app.stats.count_for(*level)),
                    Style::default().fg(Color::Yellow),
                ),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Mastery ")
        .title_style(Style::default().fg(Color::Green));

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_mission(f: &mut Frame, app: &App, area: Rect) {
    let mission = &app.mission;
    let ratio = if mission.goal == 0 {
        1.0
    } else {
        (mission.answered as f64 / mission.goal as f64).min(1.0)
    };
    let label = if mission.is_complete() {
        format!("{}/{} done", mission.answered, mission.goal)
    } else {
        format!("{}/{} ({} to go)", mission.answered, mission.goal, mission.remaining())
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Daily Mission ")
                .title_style(Style::default().fg(Color::Magenta)),
        )
        .gauge_style(Style::default().fg(if mission.is_complete() {
            Color::Green
        } else {
            Color::Magenta
        }))
        .ratio(ratio)
        .label(label);

    f.render_widget(gauge, area);
}

fn draw_areas(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .stats
        .by_area
        .iter()
        .map(|a| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<26}", truncate(&a.area, 24)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:>4}/{:<4}", a.studied_cards, a.total_cards),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!(" {:>3.0}%", a.accuracy() * 100.0),
                    Style::default().fg(Color::Yellow),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" By Area ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(List::new(items).block(block), area);
}

fn draw_recent_sessions(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .recent_sessions
        .iter()
        .map(|s| {
            let (state, color) = if s.completed {
                ("Done", Color::Green)
            } else {
                ("Open", Color::Cyan)
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<8}", s.updated_at.format("%b %d").to_string()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{:<18}", truncate(&s.area, 16)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:>3}/{:<3} ", s.cards_reviewed, s.total_cards),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled(state, Style::default().fg(color)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Recent Sessions ")
        .title_style(Style::default().fg(Color::Magenta));

    f.render_widget(List::new(items).block(block), area);
}
