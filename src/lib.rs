// Vantage library - exposes the core modules for integration tests

pub mod app;
pub mod config;
pub mod model;
pub mod notify;
pub mod realtime;
pub mod services;
pub mod session;
pub mod view;
