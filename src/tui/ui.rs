use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{areas, dashboard, study, themes};
use super::{App, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_help_bar(f, app, chunks[2]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Dashboard", "Areas", "Study"];
    let selected = match app.view {
        View::Dashboard => 0,
        View::Areas | View::Themes => 1,
        View::Study => 2,
    };

    let tabs = Tabs::new(tab_titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" lexcards · {} ", app.user())),
        )
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Dashboard => dashboard::draw(f, app, area),
        View::Areas => areas::draw(f, app, area),
        View::Themes => themes::draw(f, app, area),
        View::Study => study::draw(f, app, area),
    }
}

fn key(k: &str) -> Span<'_> {
    Span::styled(k, Style::default().fg(Color::Cyan))
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    if let Some(status) = &app.status {
        let line = Line::from(Span::styled(
            status.as_str(),
            Style::default().fg(Color::Yellow),
        ));
        let bar = Paragraph::new(line).style(Style::default().bg(Color::DarkGray));
        f.render_widget(bar, area);
        return;
    }

    let mut spans = Vec::new();
    match app.view {
        View::Dashboard => {
            spans.extend([key("h/l"), Span::raw(" Views  ")]);
            spans.extend([key("^r"), Span::raw(" Refresh  ")]);
        }
        View::Areas => {
            spans.extend([key("j/k"), Span::raw(" Nav  ")]);
            spans.extend([key("g/G"), Span::raw(" Top/Bot  ")]);
            spans.extend([key("l/<CR>"), Span::raw(" Themes  ")]);
        }
        View::Themes => {
            spans.extend([key("j/k"), Span::raw(" Nav  ")]);
            spans.extend([key("<Space>"), Span::raw(" Toggle  ")]);
            spans.extend([key("t"), Span::raw(" Type  ")]);
            spans.extend([key("<CR>"), Span::raw(" Study  ")]);
            spans.extend([key("<Esc>"), Span::raw(" Back  ")]);
        }
        View::Study => {
            spans.extend([key("<Space>"), Span::raw(" Flip  ")]);
            spans.extend([key("c"), Span::raw(" Correct  ")]);
            spans.extend([key("x"), Span::raw(" Incorrect  ")]);
            spans.extend([key("<Esc>"), Span::raw(" Pause  ")]);
        }
    }

    if app.view != View::Study {
        spans.extend([key("q"), Span::raw(" Quit")]);
    }

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    f.render_widget(help, area);
}
