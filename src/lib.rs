//! rostovcli Library
//!
//! Command-line host for the RostovVPN core: forwards the process
//! arguments to an argument parser and prints the single line of text it
//! returns, plus the built-in parser with its environment, settings and
//! service control commands.

pub mod cli;
pub mod core;
pub mod domain;
pub mod infrastructure;

pub use domain::error::{RostovError, RostovResult};
pub use domain::config::CliConfig;
pub use domain::settings::{TunnelSettings, TunOverrides};
pub use crate::core::host::{ArgumentParser, CliHost};
pub use cli::parser::CommandParser;
