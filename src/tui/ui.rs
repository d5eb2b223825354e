//! Front-panel rendering for the Merlin console.

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
};

use super::app::ConsoleApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &ConsoleApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(10),
            Constraint::Length(4),
            Constraint::Length(3),
        ])
        .split(frame.area());

    draw_speaker(frame, chunks[0], app);
    draw_playfield(frame, chunks[1], app);
    draw_controls(frame, chunks[2]);
    draw_status(frame, chunks[3], app);
}

/// The speaker grille, lit while a sound pulse is decaying.
fn draw_speaker(frame: &mut Frame, area: Rect, app: &ConsoleApp) {
    let active = app.panel.borrow().sound_active();
    let (bar, style) = if active {
        ("=========", Style::default().fg(Color::Red))
    } else {
        ("---------", Style::default().fg(Color::DarkGray))
    };

    let lines: Vec<Line> = (0..3)
        .map(|_| Line::from(Span::styled(bar, style)))
        .collect();

    let speaker = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().title(" Speaker ").borders(Borders::ALL));
    frame.render_widget(speaker, area);
}

/// The eleven-button playfield in Merlin's cross layout.
fn draw_playfield(frame: &mut Frame, area: Rect, app: &ConsoleApp) {
    let panel = app.panel.borrow();
    let led = |index: usize, label: &str| -> Span<'static> {
        if panel.leds[index] {
            Span::styled(
                "■".to_string(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(label.to_string(), Style::default().fg(Color::White))
        }
    };

    let pad = Span::raw(" ");
    let rows = vec![
        Line::from(vec![Span::raw("     "), led(0, "~")]),
        Line::from(vec![
            Span::raw(" "),
            led(1, "1"),
            pad.clone(),
            Span::raw(" "),
            led(2, "2"),
            pad.clone(),
            Span::raw(" "),
            led(3, "3"),
        ]),
        Line::from(vec![
            Span::raw(" "),
            led(4, "4"),
            pad.clone(),
            Span::raw(" "),
            led(5, "5"),
            pad.clone(),
            Span::raw(" "),
            led(6, "6"),
        ]),
        Line::from(vec![
            Span::raw(" "),
            led(7, "7"),
            pad.clone(),
            Span::raw(" "),
            led(8, "8"),
            pad.clone(),
            Span::raw(" "),
            led(9, "9"),
        ]),
        Line::from(vec![Span::raw("     "), led(10, "0")]),
    ];

    let playfield = Paragraph::new(rows)
        .alignment(Alignment::Center)
        .block(Block::default().title(" Merlin ").borders(Borders::ALL));
    frame.render_widget(playfield, area);
}

/// The four control buttons below the playfield.
fn draw_controls(frame: &mut Frame, area: Rect) {
    let controls = Paragraph::new(vec![
        Line::from("n: New Game    s: Same Game"),
        Line::from("h: Hit Me      c: Computer Turn"),
    ])
    .alignment(Alignment::Center)
    .style(Style::default().fg(Color::Gray))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(controls, area);
}

/// Status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &ConsoleApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, area);
}
