//! Application composition: the event loop that drives the session core.

pub mod runtime;

pub use runtime::{App, AppEvent};
