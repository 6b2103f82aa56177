use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// Command line arguments for rostovcli
#[derive(Parser, Debug)]
#[command(
    name = "rostovcli",
    version = env!("CARGO_PKG_VERSION"),
    about = "Command-line host for the RostovVPN core",
    long_about = "Prepares the core's working environment, builds its tunnel settings from the desktop preferences, and signals or probes a running core."
)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip logging setup
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "text")]
    pub output: OutputFormat,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve the core config path and create its directories
    Prepare(PrepareArgs),
    /// Build the tunnel settings passed to the core
    Settings(SettingsArgs),
    /// Ask a running core to stop
    Stop,
    /// Block until a stop is requested
    AwaitStop {
        /// Give up after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Check whether the command server accepts connections
    Probe {
        /// Command server address (defaults to the configured one)
        #[arg(long)]
        addr: Option<String>,
        /// How long to keep trying, in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Configuration management commands
    Config(ConfigArgs),
    /// Display version information
    Version,
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
    /// Table output
    Table,
}

/// Core config location
#[derive(ClapArgs, Debug)]
pub struct PrepareArgs {
    /// Path to the core's base config
    #[arg(long = "core-config", value_name = "PATH")]
    pub core_config: String,
}

/// Tunnel settings arguments
#[derive(ClapArgs, Debug)]
pub struct SettingsArgs {
    /// Path to the core's base config
    #[arg(long = "core-config", value_name = "PATH")]
    pub core_config: String,

    /// Enable TUN/VPN mode
    #[arg(long, conflicts_with = "disable_tun")]
    pub enable_tun: bool,

    /// Disable TUN/VPN mode (fall back to proxy)
    #[arg(long)]
    pub disable_tun: bool,

    /// TUN MTU (defaults to the configured one)
    #[arg(long)]
    pub mtu: Option<u32>,

    /// Set the system proxy (ignored when TUN is enabled)
    #[arg(long)]
    pub set_system_proxy: bool,
}

/// Configuration management arguments
#[derive(ClapArgs, Debug)]
pub struct ConfigArgs {
    /// Configuration subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Configuration management subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Show configuration file locations
    Path,
    /// Validate configuration
    Validate {
        /// Configuration file path
        file: Option<String>,
    },
    /// Create default configuration
    Init {
        /// Directory to create the project configuration in
        #[arg(long)]
        dir: Option<String>,
        /// Global configuration
        #[arg(short, long)]
        global: bool,
    },
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Table => write!(f, "table"),
        }
    }
}
