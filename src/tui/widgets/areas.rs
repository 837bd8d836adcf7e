use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::truncate;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Areas ")
        .title_style(Style::default().fg(Color::Cyan));

    if app.areas.items.is_empty() {
        let empty = Paragraph::new("No flashcards yet. Import some with `lexcards import <file>`.")
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let items: Vec<ListItem> = app
        .areas
        .items
        .iter()
        .map(|name| {
            let stats = app.stats.by_area.iter().find(|a| &a.area == name);
            let (studied, total) = stats.map_or((0, 0), |a| (a.studied_cards, a.total_cards));
            let accuracy = stats.map_or(0.0, |a| a.accuracy());

            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<34}", truncate(name, 32)),
                    Style::default().fg(Color::White),
                ),
                Span::styled(
                    format!("{:>5}/{:<5}", studied, total),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled(
                    format!("{:>4.0}%", accuracy * 100.0),
                    Style::default().fg(Color::Yellow),
                ),
            ]))
        })
        .collect();

    let header = Line::from(vec![
        Span::styled(
            format!("{:<36}", "Area"),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "Studied    Accuracy",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        ),
    ]);

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.areas.selected);

    let header_area = Rect {
        x: area.x + 1,
        y: area.y + 1,
        width: area.width.saturating_sub(2),
        height: 1,
    };
    f.render_widget(Paragraph::new(header), header_area);

    let list_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: area.height.saturating_sub(1),
    };
    f.render_stateful_widget(list, list_area, &mut state);
}
