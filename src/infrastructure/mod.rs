// Infrastructure module - External dependencies and adapters
pub mod config;
pub mod environment;
pub mod logging;
pub mod probe;
