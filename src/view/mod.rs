//! View layer: a dispatch table from the active view mode to a screen,
//! plus the notification toast overlay. Deliberately thin; all decisions
//! happen in the session core.

pub mod admin;
pub mod callback;
pub mod login;
pub mod shell;
pub mod toasts;
pub mod user_home;
