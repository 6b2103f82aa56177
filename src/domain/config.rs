use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Name of the file whose appearance asks a running core to stop
pub const STOP_FILE_NAME: &str = "rvpncli.stop";

/// Directory name shared with the desktop application
pub const APP_DIR_NAME: &str = "RostovVPN";

/// rostovcli configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Global configuration
    #[serde(default)]
    pub global: GlobalConfig,
    /// Core control configuration
    #[serde(default)]
    pub core: CoreConfig,
}

/// Global configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Settings used to reach and control a running core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Address of the command server
    #[serde(default = "default_command_server")]
    pub command_server: String,
    /// How long to keep probing the command server
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,
    /// Delay between probe attempts, also used when polling the stop file
    #[serde(default = "default_probe_interval")]
    pub probe_interval_ms: u64,
    /// MTU used when TUN mode is enabled without an explicit value
    #[serde(default = "default_mtu")]
    pub default_mtu: u32,
    /// Directory holding the stop file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

// Default value functions
fn default_log_level() -> String {
    "warn".to_string()
}

fn default_command_server() -> String {
    "127.0.0.1:8964".to_string()
}

fn default_probe_timeout() -> u64 {
    10_000
}

fn default_probe_interval() -> u64 {
    200
}

fn default_mtu() -> u32 {
    1450
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            command_server: default_command_server(),
            probe_timeout_ms: default_probe_timeout(),
            probe_interval_ms: default_probe_interval(),
            default_mtu: default_mtu(),
            state_dir: None,
        }
    }
}

impl CoreConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms.max(1))
    }

    /// Directory holding the stop file.
    ///
    /// Falls back to the user config directory, then the temp directory.
    pub fn resolve_state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        match dirs::config_dir() {
            Some(dir) => dir.join(APP_DIR_NAME),
            None => std::env::temp_dir().join(APP_DIR_NAME),
        }
    }

    pub fn stop_file_path(&self) -> PathBuf {
        self.resolve_state_dir().join(STOP_FILE_NAME)
    }
}
