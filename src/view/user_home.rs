//! Authenticated end-user area.

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::App;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let who = app
        .coordinator()
        .current_user()
        .map(|u| u.name.clone())
        .unwrap_or_else(|| "there".to_string());
    let body = Paragraph::new(vec![
        Line::raw(format!("Welcome back, {who}.")),
        Line::raw(""),
        Line::raw("Updates to your projects appear as notifications."),
    ])
    .block(Block::default().borders(Borders::ALL).title(" Vantage "));
    frame.render_widget(body, chunks[0]);

    let help = Paragraph::new(Line::styled(
        "x dismiss · l logout · q quit",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(help, chunks[1]);
}
