//! Anonymous login screen.

use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render(frame: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Length(7),
            Constraint::Min(0),
        ])
        .split(frame.area());

    let lines = vec![
        Line::styled(
            "Vantage",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::raw("Sign in through your identity provider to continue."),
        Line::raw("The browser will redirect back here when you are done."),
        Line::raw(""),
        Line::styled("q to quit", Style::default().fg(Color::DarkGray)),
    ];
    let panel = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Sign in "));
    frame.render_widget(panel, chunks[1]);
}
