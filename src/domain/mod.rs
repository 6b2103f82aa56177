// Domain module - Configuration, settings and error types
pub mod config;
pub mod error;
pub mod settings;
