use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    draw_selection(f, app, chunks[0]);
    draw_themes(f, app, chunks[1]);
}

fn draw_selection(f: &mut Frame, app: &App, area: Rect) {
    let themes = if app.selected_themes.is_empty() {
        "all themes".to_string()
    } else {
        app.selected_themes
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };

    let line = Line::from(vec![
        Span::styled("Mode: ", Style::default().fg(Color::Gray)),
        Span::styled(
            app.session_type.as_str(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("Studying: ", Style::default().fg(Color::Gray)),
        Span::styled(themes, Style::default().fg(Color::Cyan)),
    ]);

    let title = format!(
        " {} ",
        app.selected_area.as_deref().unwrap_or("No area selected")
    );
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_themes(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .themes
        .items
        .iter()
        .map(|theme| {
            let checked = app.selected_themes.contains(theme);
            let (mark, color) = if checked {
                ("[x] ", Color::Green)
            } else {
                ("[ ] ", Color::DarkGray)
            };
            ListItem::new(Line::from(vec![
                Span::styled(mark, Style::default().fg(color)),
                Span::styled(theme.as_str(), Style::default().fg(Color::White)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Themes ")
        .title_style(Style::default().fg(Color::Cyan));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.themes.selected);
    f.render_stateful_widget(list, area, &mut state);
}
