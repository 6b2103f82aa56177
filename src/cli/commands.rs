use crate::cli::args::{Args, Command, ConfigCommand, SettingsArgs};
use crate::cli::output::{ConsoleRenderer, OutputRenderer};
use crate::domain::config::CliConfig;
use crate::domain::error::{RostovError, RostovResult};
use crate::domain::settings::{TunOverrides, TunnelSettings, PREFERENCES_FILE_NAME};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::environment::{await_stop_request, prepare_environment, request_stop};
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::probe::wait_for_listener;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Execute CLI command.
///
/// Returns the text to print, or `None` when there is nothing to report.
pub async fn execute_command(args: Args) -> RostovResult<Option<String>> {
    let Some(command) = args.command else {
        return Ok(None);
    };
    let renderer = ConsoleRenderer::new(args.output);

    // Load configuration using ConfigManager
    let config_manager = ConfigManager::new()?;
    let config = if let Some(config_path) = &args.config {
        config_manager.load_config_from_path(config_path.as_ref())?
    } else {
        config_manager.load_config()?
    };

    if !args.quiet {
        init_logging(&config.global.log_level, args.verbose);
    }
    debug!("Executing {:?}", command);

    let output = match command {
        Command::Prepare(prepare) => {
            let env = prepare_environment(&prepare.core_config)?;
            renderer.render_environment(&env)?
        }
        Command::Settings(settings_args) => execute_settings_command(settings_args, &renderer, &config)?,
        Command::Stop => {
            let stop_file = config.core.stop_file_path();
            request_stop(&stop_file)?;
            renderer.render_message(&format!("Stop requested: {}", stop_file.display()))?
        }
        Command::AwaitStop { timeout_ms } => {
            let stop_file = config.core.stop_file_path();
            let timeout = timeout_ms.map(Duration::from_millis);
            if await_stop_request(&stop_file, config.core.probe_interval(), timeout).await? {
                renderer.render_message("Stop requested")?
            } else {
                renderer.render_message(&format!(
                    "No stop requested within {}ms",
                    timeout_ms.unwrap_or_default()
                ))?
            }
        }
        Command::Probe { addr, timeout_ms } => {
            let address = addr.unwrap_or_else(|| config.core.command_server.clone());
            if address.trim().is_empty() {
                return Err(RostovError::Probe("empty command server address".to_string()));
            }
            let deadline = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.core.probe_timeout());
            let report = wait_for_listener(&address, deadline, config.core.probe_interval()).await;
            renderer.render_probe(&report)?
        }
        Command::Config(config_args) => {
            execute_config_command(config_args.command, &renderer, &config, &config_manager)?
        }
        Command::Version => renderer.render_message(&format!("rostovcli {}", env!("CARGO_PKG_VERSION")))?,
    };

    Ok(Some(output))
}

fn execute_settings_command(
    args: SettingsArgs,
    renderer: &ConsoleRenderer,
    config: &CliConfig,
) -> RostovResult<String> {
    let env = prepare_environment(&args.core_config)?;
    let mut settings = TunnelSettings::read_at(&env.working_dir.join(PREFERENCES_FILE_NAME));

    let overrides = TunOverrides {
        enable_tun: args.enable_tun,
        disable_tun: args.disable_tun,
        mtu: args.mtu.unwrap_or(config.core.default_mtu),
        set_system_proxy: args.set_system_proxy,
    };
    settings.apply_overrides(&overrides);
    debug!("Built settings for {}", env.config_path.display());

    Ok(renderer.render_settings(&settings)?)
}

fn execute_config_command(
    command: ConfigCommand,
    renderer: &ConsoleRenderer,
    config: &CliConfig,
    config_manager: &ConfigManager,
) -> RostovResult<String> {
    match command {
        ConfigCommand::Show => Ok(renderer.render_config(config)?),
        ConfigCommand::Path => Ok(renderer.render_config_paths(
            config_manager.get_global_config_path_ref(),
            config_manager.get_project_config_path().map(|p| p.as_path()),
        )?),
        ConfigCommand::Validate { file } => {
            if let Some(config_path) = file {
                config_manager.load_config_from_path(config_path.as_ref())?;
                Ok(renderer.render_message(&format!("Configuration file '{}' is valid", config_path))?)
            } else {
                config_manager.load_config()?;
                Ok(renderer.render_message("Current configuration is valid")?)
            }
        }
        ConfigCommand::Init { dir, global } => {
            if global {
                let global_path = config_manager.get_global_config_path_ref();
                config_manager.save_config_to_path(global_path, &CliConfig::default())?;
                Ok(renderer.render_message(&format!(
                    "Global configuration initialized at '{}'",
                    global_path.display()
                ))?)
            } else {
                let target = match dir {
                    Some(dir) => PathBuf::from(dir),
                    None => std::env::current_dir().map_err(|e| RostovError::Config {
                        message: format!("Failed to get current directory: {}", e),
                    })?,
                };
                let config_file = config_manager.init_project_config(&target)?;
                Ok(renderer.render_message(&format!(
                    "Project configuration initialized at '{}'",
                    config_file.display()
                ))?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    /// Write a config file whose stop file lives inside `dir`
    fn config_in(dir: &TempDir) -> String {
        let path = dir.path().join("rostovcli.toml");
        let content = format!(
            "[core]\nprobe_interval_ms = 10\nstate_dir = {:?}\n",
            dir.path().join("state").display().to_string()
        );
        std::fs::write(&path, content).unwrap();
        path.display().to_string()
    }

    async fn run(argv: &[&str]) -> RostovResult<Option<String>> {
        execute_command(Args::try_parse_from(argv).unwrap()).await
    }

    #[tokio::test]
    async fn test_no_command_yields_nothing() {
        assert_eq!(run(&["rostovcli"]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_version() {
        let output = run(&["rostovcli", "-q", "version"]).await.unwrap().unwrap();
        assert_eq!(output, format!("rostovcli {}", env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn test_stop_during_await() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);

        let await_args = ["rostovcli", "-q", "-c", &config, "await-stop", "--timeout-ms", "5000"];
        let waiter = run(&await_args);
        let stopper = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            run(&["rostovcli", "-q", "-c", &config, "stop"]).await
        };
        let (awaited, stop) = tokio::join!(waiter, stopper);

        assert!(stop.unwrap().unwrap().starts_with("Stop requested: "));
        assert_eq!(awaited.unwrap().unwrap(), "Stop requested");
        assert!(!temp_dir.path().join("state").join("rvpncli.stop").exists());
    }

    #[tokio::test]
    async fn test_await_after_earlier_stop_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);

        run(&["rostovcli", "-q", "-c", &config, "stop"]).await.unwrap();
        assert!(temp_dir.path().join("state").join("rvpncli.stop").exists());

        let awaited = run(&["rostovcli", "-q", "-c", &config, "await-stop", "--timeout-ms", "100"])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(awaited, "No stop requested within 100ms");
    }

    #[tokio::test]
    async fn test_await_stop_timeout() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);

        let output = run(&["rostovcli", "-q", "-c", &config, "await-stop", "--timeout-ms", "30"])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(output, "No stop requested within 30ms");
    }

    #[tokio::test]
    async fn test_settings_from_flutter_prefs() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        let work = temp_dir.path().join("work");
        std::fs::create_dir_all(&work).unwrap();
        std::fs::write(
            work.join(PREFERENCES_FILE_NAME),
            r#"{"flutter.region": "RU", "flutter.service-mode": "system-proxy"}"#,
        )
        .unwrap();
        let core_config = work.join("config.json").display().to_string();

        let output = run(&[
            "rostovcli", "-q", "-c", &config, "settings", "--core-config", &core_config, "--enable-tun",
        ])
        .await
        .unwrap()
        .unwrap();

        let settings: TunnelSettings = serde_json::from_str(&output).unwrap();
        assert_eq!(settings.region, "ru");
        assert!(settings.inbound.enable_tun);
        assert!(!settings.inbound.set_system_proxy);
        assert_eq!(settings.inbound.mtu, 1450);
    }

    #[tokio::test]
    async fn test_prepare_json() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        let core_config = temp_dir.path().join("a").join("b").join("config.json");

        let output = run(&[
            "rostovcli", "-q", "-c", &config, "-o", "json", "prepare",
            "--core-config", &core_config.display().to_string(),
        ])
        .await
        .unwrap()
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["working_dir"], temp_dir.path().join("a").join("b").display().to_string());
        assert!(temp_dir.path().join("a").join("b").is_dir());
    }

    #[tokio::test]
    async fn test_validate_broken_config_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        let broken = temp_dir.path().join("broken.toml");
        std::fs::write(&broken, "[core").unwrap();

        let result = run(&[
            "rostovcli", "-q", "-c", &config, "config", "validate", &broken.display().to_string(),
        ])
        .await;
        assert!(matches!(result, Err(RostovError::Config { .. })));
    }

    #[tokio::test]
    async fn test_missing_explicit_config_fails() {
        let result = run(&["rostovcli", "-q", "-c", "/nonexistent/rostovcli.toml", "version"]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_config_init_project() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        let target = temp_dir.path().join("project");

        let output = run(&[
            "rostovcli", "-q", "-c", &config, "config", "init", "--dir", &target.display().to_string(),
        ])
        .await
        .unwrap()
        .unwrap();
        assert!(output.starts_with("Project configuration initialized at"));
        assert!(target.join(".rostovcli").join("config.toml").exists());
    }
}
