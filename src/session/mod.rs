//! Session/view coordination core.
//!
//! `resolver` holds the pure transition function, `watchdog` the callback
//! liveness timer, and `coordinator` the owning state machine that glues
//! them together and talks to the runtime in commands.

pub mod coordinator;
pub mod resolver;
pub mod watchdog;

pub use coordinator::{Command, SessionCoordinator, SessionSettings};
pub use resolver::{Effect, SessionEvent, Transition, ViewMode};
pub use watchdog::CallbackWatchdog;
