//! Notification toast stack.
//!
//! Rendered as an overlay in the top-right corner, newest on top. The
//! queue itself enforces the cap; this module only draws what is there.

use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;

use crate::notify::{NotificationKind, NotificationQueue};

const TOAST_WIDTH: u16 = 40;
const TOAST_HEIGHT: u16 = 3;

fn kind_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Connectivity => Color::Yellow,
        NotificationKind::Insert => Color::Green,
        NotificationKind::Update => Color::Blue,
        NotificationKind::Alert => Color::Red,
    }
}

pub fn render(frame: &mut Frame, queue: &NotificationQueue) {
    let area = frame.area();
    if queue.is_empty() || area.width < TOAST_WIDTH + 2 {
        return;
    }

    let x = area.right().saturating_sub(TOAST_WIDTH + 1);
    for (i, entry) in queue.entries().enumerate() {
        let y = area.top() + 1 + (i as u16) * TOAST_HEIGHT;
        if y + TOAST_HEIGHT > area.bottom() {
            break;
        }
        let rect = Rect::new(x, y, TOAST_WIDTH, TOAST_HEIGHT);
        let color = kind_color(entry.kind);

        let title = Line::from(vec![
            Span::styled(
                format!("{} {}", entry.kind.symbol(), entry.title),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", entry.created_at.format("%H:%M:%S")),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        let toast = Paragraph::new(vec![title, Line::raw(entry.message.clone())])
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));

        frame.render_widget(Clear, rect);
        frame.render_widget(toast, rect);
    }
}
