//! Plain data types shared across the session core.

pub mod facts;
pub mod location;
pub mod page;

pub use facts::{PersistedSession, Role, SessionFacts, UserInfo};
pub use location::Location;
pub use page::Page;
