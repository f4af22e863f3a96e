//! Service layer: collaborator gateways and shared infrastructure.

pub mod auth;
pub mod log_dirs;
pub mod realtime_client;
pub mod time_source;
pub mod tracing_setup;
