//! Top-level render dispatch.

use ratatui::Frame;

use crate::app::App;
use crate::session::ViewMode;

use super::{admin, callback, login, toasts, user_home};

/// Render the screen selected by the current view mode, then the toast
/// stack on top.
pub fn render(frame: &mut Frame, app: &App) {
    match app.mode() {
        ViewMode::Login => login::render(frame),
        ViewMode::Callback => callback::render(frame, app),
        ViewMode::Admin => admin::render(frame, app),
        ViewMode::User => user_home::render(frame, app),
    }
    toasts::render(frame, app.notifications());
}
