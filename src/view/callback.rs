//! In-flight OAuth callback screen.

use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(5),
            Constraint::Min(0),
        ])
        .split(frame.area());

    let remaining = app
        .coordinator()
        .callback_remaining()
        .map(|d| format!("{:.1}s", d.as_secs_f32()))
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::raw("Completing sign-in..."),
        Line::raw(""),
        Line::styled(
            format!("Falling back in {remaining}"),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    let panel = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" One moment "));
    frame.render_widget(panel, chunks[1]);
}
