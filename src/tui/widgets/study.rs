use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::mastery_bar;
use crate::study::StudyRun;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let Some(run) = &app.run else {
        let block = Block::default().borders(Borders::ALL).title(" Study ");
        f.render_widget(Paragraph::new("No study session").block(block), area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Progress header
            Constraint::Min(6),    // Card
            Constraint::Length(4), // Last answer
        ])
        .split(area);

    draw_header(f, run, chunks[0]);
    if run.is_finished() {
        draw_summary(f, run, chunks[1]);
    } else {
        draw_card(f, app, run, chunks[1]);
    }
    draw_last_answer(f, app, chunks[2]);
}

fn draw_header(f: &mut Frame, run: &StudyRun, area: Rect) {
    let (pos, total) = run.position();
    let themes = if run.themes.is_empty() {
        "all themes".to_string()
    } else {
        run.themes.join(", ")
    };

    let line = Line::from(vec![
        Span::styled(
            format!("Card {}/{}", pos, total),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(themes, Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(
            run.session_type.as_str(),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", run.area));
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_card(f: &mut Frame, app: &App, run: &StudyRun, area: Rect) {
    let Some(card) = run.current() else {
        return;
    };

    let mut text = vec![
        Line::from(Span::styled(
            card.question.as_str(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if app.revealed {
        text.push(Line::from(Span::styled(
            card.answer.as_str(),
            Style::default().fg(Color::Green),
        )));
    } else {
        text.push(Line::from(Span::styled(
            "<Space> to show the answer",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let subtitle = format!(
        " {} · {} · {}/{} correct ",
        card.theme.as_deref().unwrap_or(&card.category),
        card.difficulty.label(),
        card.correct_answers,
        card.total_attempts
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .title(subtitle)
        .title_style(Style::default().fg(Color::Gray));

    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_summary(f: &mut Frame, run: &StudyRun, area: Rect) {
    let studied = run.cards.iter().filter(|c| c.studied).count();
    let text = vec![
        Line::from(Span::styled(
            "Session complete",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!(
            "{} cards reviewed, {} studied overall",
            run.reviewed, studied
        )),
        Line::from(""),
        Line::from(Span::styled(
            "<CR> back to dashboard",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let block = Block::default().borders(Borders::ALL);
    let paragraph = Paragraph::new(text)
        .block(block)
        .alignment(Alignment::Center);
    f.render_widget(paragraph, area);
}

fn draw_last_answer(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Last answer ");

    let Some(outcome) = &app.last_answer else {
        f.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let attempt = &outcome.attempt;
    let (verdict, color) = if attempt.streak > 0 {
        ("Correct", Color::Green)
    } else {
        ("Incorrect", Color::Red)
    };

    let mut spans = vec![
        Span::styled(verdict, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::raw("  "),
        Span::styled(
            mastery_bar(attempt.mastery_level),
            Style::default().fg(Color::Green),
        ),
        Span::raw(format!(
            " {}  {:.0}%  streak {}",
            attempt.mastery_level.label(),
            attempt.accuracy * 100.0,
            attempt.streak
        )),
    ];
    if attempt.needs_review {
        spans.push(Span::styled(
            "  needs review",
            Style::default().fg(Color::Yellow),
        ));
    }

    let lines = vec![
        Line::from(spans),
        Line::from(Span::styled(
            format!(
                "Mission {}/{}",
                outcome.mission.answered, outcome.mission.goal
            ),
            Style::default().fg(Color::Magenta),
        )),
    ];
    f.render_widget(Paragraph::new(lines).block(block), area);
}
