// Core module - Process host
pub mod host;

pub use host::{ArgumentParser, CliHost};
