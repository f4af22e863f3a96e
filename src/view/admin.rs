//! Authenticated admin area: page tabs plus a placeholder content pane.
//! The CRUD pages themselves are served elsewhere; this client surfaces
//! navigation and the live notification feed.

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use ratatui::Frame;

use crate::app::App;
use crate::model::Page;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let selected = Page::ALL
        .iter()
        .position(|p| *p == app.page())
        .unwrap_or_default();
    let tabs = Tabs::new(Page::ALL.iter().map(|p| p.label()).collect::<Vec<_>>())
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::ALL).title(" Vantage admin "));
    frame.render_widget(tabs, chunks[0]);

    let who = app
        .coordinator()
        .current_user()
        .map(|u| format!("{} <{}>", u.name, u.email))
        .unwrap_or_else(|| "unknown account".to_string());
    let body = Paragraph::new(vec![
        Line::raw(format!("{} — signed in as {who}", app.page().label())),
        Line::raw(""),
        Line::raw("Records stream in live; changes show up as notifications."),
    ])
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(body, chunks[1]);

    let help = Paragraph::new(Line::styled(
        "1-6 pages · x dismiss · l logout · q quit",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(help, chunks[2]);
}
