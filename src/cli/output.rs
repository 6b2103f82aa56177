use crate::cli::args::OutputFormat;
use crate::domain::config::CliConfig;
use crate::domain::settings::TunnelSettings;
use crate::infrastructure::environment::Environment;
use crate::infrastructure::probe::ProbeReport;
use serde::Serialize;
use std::path::Path;
use tabled::{Table, Tabled};

/// Renders command results into the text handed back to the host.
///
/// Renderers never print: the host owns stdout.
pub trait OutputRenderer {
    fn render_message(&self, message: &str) -> Result<String, OutputError>;
    fn render_environment(&self, env: &Environment) -> Result<String, OutputError>;
    fn render_settings(&self, settings: &TunnelSettings) -> Result<String, OutputError>;
    fn render_probe(&self, report: &ProbeReport) -> Result<String, OutputError>;
    fn render_config(&self, config: &CliConfig) -> Result<String, OutputError>;
    fn render_config_paths(&self, global: &Path, project: Option<&Path>) -> Result<String, OutputError>;
}

/// Output formatting errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("TOML serialization error: {0}")]
    TomlError(#[from] toml::ser::Error),
}

impl From<OutputError> for crate::domain::error::RostovError {
    fn from(err: OutputError) -> Self {
        Self::Output(err.to_string())
    }
}

/// Renderer for the selected output format
pub struct ConsoleRenderer {
    format: OutputFormat,
}

impl ConsoleRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn json<T: Serialize + ?Sized>(value: &T) -> Result<String, OutputError> {
        Ok(serde_json::to_string_pretty(value)?)
    }
}

impl OutputRenderer for ConsoleRenderer {
    fn render_message(&self, message: &str) -> Result<String, OutputError> {
        match self.format {
            OutputFormat::Json => Self::json(&serde_json::json!({ "message": message })),
            _ => Ok(message.to_string()),
        }
    }

    fn render_environment(&self, env: &Environment) -> Result<String, OutputError> {
        match self.format {
            OutputFormat::Text => Ok(format!(
                "Config: {}\nBase dir: {}\nWorking dir: {}\nTemp dir: {}",
                env.config_path.display(),
                env.base_dir.display(),
                env.working_dir.display(),
                env.temp_dir.display()
            )),
            OutputFormat::Json => Self::json(env),
            OutputFormat::Table => Ok(field_table(vec![
                FieldRow::new("config", env.config_path.display()),
                FieldRow::new("base_dir", env.base_dir.display()),
                FieldRow::new("working_dir", env.working_dir.display()),
                FieldRow::new("temp_dir", env.temp_dir.display()),
            ])),
        }
    }

    fn render_settings(&self, settings: &TunnelSettings) -> Result<String, OutputError> {
        match self.format {
            // The core consumes the settings as a single JSON line
            OutputFormat::Text => Ok(serde_json::to_string(settings)?),
            OutputFormat::Json => Self::json(settings),
            OutputFormat::Table => Ok(field_table(vec![
                FieldRow::new("region", &settings.region),
                FieldRow::new("log_level", &settings.log_level),
                FieldRow::new("enable_tun", settings.inbound.enable_tun),
                FieldRow::new("set_system_proxy", settings.inbound.set_system_proxy),
                FieldRow::new("mixed_port", settings.inbound.mixed_port),
                FieldRow::new("mtu", settings.inbound.mtu),
                FieldRow::new("tun_stack", &settings.inbound.tun_stack),
                FieldRow::new("remote_dns", &settings.remote_dns_address),
                FieldRow::new("direct_dns", &settings.direct_dns_address),
                FieldRow::new("strict_route", settings.inbound.strict_route),
                FieldRow::new("clash_api_port", settings.clash_api_port),
                FieldRow::new("tls_fragment", settings.tls_tricks.enable_fragment),
            ])),
        }
    }

    fn render_probe(&self, report: &ProbeReport) -> Result<String, OutputError> {
        match self.format {
            OutputFormat::Text => Ok(match (report.listening, &report.last_error) {
                (true, _) => format!("Command server is listening at {}", report.address),
                (false, Some(err)) => format!(
                    "Command server not listening at {} after {} attempts: {}",
                    report.address, report.attempts, err
                ),
                (false, None) => format!("Command server not listening at {}", report.address),
            }),
            OutputFormat::Json => Self::json(report),
            OutputFormat::Table => Ok(field_table(vec![
                FieldRow::new("address", &report.address),
                FieldRow::new("listening", report.listening),
                FieldRow::new("attempts", report.attempts),
                FieldRow::new("last_error", report.last_error.as_deref().unwrap_or("-")),
            ])),
        }
    }

    fn render_config(&self, config: &CliConfig) -> Result<String, OutputError> {
        match self.format {
            OutputFormat::Text => Ok(toml::to_string_pretty(config)?.trim_end().to_string()),
            OutputFormat::Json => Self::json(config),
            OutputFormat::Table => {
                let mut rows = vec![
                    FieldRow::new("global.log_level", &config.global.log_level),
                    FieldRow::new("core.command_server", &config.core.command_server),
                    FieldRow::new("core.probe_timeout_ms", config.core.probe_timeout_ms),
                    FieldRow::new("core.probe_interval_ms", config.core.probe_interval_ms),
                    FieldRow::new("core.default_mtu", config.core.default_mtu),
                ];
                if let Some(dir) = &config.core.state_dir {
                    rows.push(FieldRow::new("core.state_dir", dir.display()));
                }
                Ok(field_table(rows))
            }
        }
    }

    fn render_config_paths(&self, global: &Path, project: Option<&Path>) -> Result<String, OutputError> {
        match self.format {
            OutputFormat::Text => {
                let project = project
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "none".to_string());
                Ok(format!("Global: {}\nProject: {}", global.display(), project))
            }
            OutputFormat::Json => Self::json(&serde_json::json!({
                "global": global,
                "project": project,
            })),
            OutputFormat::Table => Ok(field_table(vec![
                FieldRow::new("global", global.display()),
                FieldRow::new("project", project.map(|p| p.display().to_string()).unwrap_or_else(|| "-".to_string())),
            ])),
        }
    }
}

/// Table row for a single named value
#[derive(Tabled)]
struct FieldRow {
    field: String,
    value: String,
}

impl FieldRow {
    fn new(field: &str, value: impl std::fmt::Display) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

fn field_table(rows: Vec<FieldRow>) -> String {
    Table::new(rows).to_string()
}
