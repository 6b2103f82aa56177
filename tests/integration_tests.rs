use rostovcli::{CliConfig, CliHost, CommandParser, TunnelSettings};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::time::timeout;

fn args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|s| s.to_string()).collect()
}

/// Write a config whose stop file lives inside `dir`, probing every 10ms
fn write_config(dir: &TempDir) -> String {
    let mut config = CliConfig::default();
    config.core.probe_interval_ms = 10;
    config.core.state_dir = Some(dir.path().join("state"));
    let path = dir.path().join("rostovcli.toml");
    std::fs::write(&path, toml::to_string(&config).expect("Failed to serialize config"))
        .expect("Failed to write config");
    path.display().to_string()
}

async fn run_host(tokens: &[&str]) -> String {
    let host = CliHost::new(CommandParser::new());
    let mut out = Vec::new();
    host.run(args(tokens), &mut out).await.expect("Failed to write output");
    String::from_utf8(out).expect("Invalid UTF-8")
}

/// Integration tests for the host driving the built-in parser
#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_help_through_host() {
        let output = run_host(&["rostovcli", "--help"]).await;
        assert!(output.contains("Usage: rostovcli"));
        assert!(output.ends_with('\n'));
        assert_eq!(output.matches("\n\n\n").count(), 0);
    }

    #[tokio::test]
    async fn test_bare_invocation_prints_nothing() {
        assert_eq!(run_host(&["rostovcli"]).await, "");
    }

    #[tokio::test]
    async fn test_bad_flag_prints_nothing() {
        assert_eq!(run_host(&["rostovcli", "--bad-flag"]).await, "");
    }

    #[tokio::test]
    async fn test_probe_listening_server() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_config(&temp_dir);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let output = run_host(&[
            "rostovcli", "-q", "-c", &config, "-o", "json", "probe", "--addr", &address, "--timeout-ms", "1000",
        ])
        .await;

        let report: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(report["listening"], true);
        assert_eq!(report["address"], address.as_str());
    }

    #[tokio::test]
    async fn test_probe_nothing_listening() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_config(&temp_dir);
        let address = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().to_string()
        };

        let output = run_host(&[
            "rostovcli", "-q", "-c", &config, "probe", "--addr", &address, "--timeout-ms", "50",
        ])
        .await;

        assert!(output.starts_with(&format!("Command server not listening at {}", address)));
        assert_eq!(output.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_stop_wakes_waiting_host() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_config(&temp_dir);

        let waiter_config = config.clone();
        let waiter = tokio::spawn(async move {
            run_host(&["rostovcli", "-q", "-c", &waiter_config, "await-stop"]).await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let stop_output = run_host(&["rostovcli", "-q", "-c", &config, "stop"]).await;
        assert!(stop_output.starts_with("Stop requested: "));

        let waited = timeout(Duration::from_secs(5), waiter)
            .await
            .expect("await-stop did not return")
            .unwrap();
        assert_eq!(waited, "Stop requested\n");
    }

    #[tokio::test]
    async fn test_settings_from_structured_preferences() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_config(&temp_dir);
        let work = temp_dir.path().join("profile");
        std::fs::create_dir_all(&work).unwrap();

        let mut stored = TunnelSettings::default();
        stored.region = "cn".to_string();
        stored.inbound.enable_tun = true;
        std::fs::write(work.join("shared_preferences.json"), serde_json::to_string(&stored).unwrap()).unwrap();

        let core_config = work.join("config.json").display().to_string();
        let output = run_host(&[
            "rostovcli", "-q", "-c", &config, "settings", "--core-config", &core_config,
            "--disable-tun", "--set-system-proxy",
        ])
        .await;

        let settings: TunnelSettings = serde_json::from_str(output.trim_end()).unwrap();
        assert_eq!(settings.region, "cn");
        assert!(!settings.inbound.enable_tun);
        assert!(settings.inbound.set_system_proxy);
    }

    #[tokio::test]
    async fn test_config_show_table() {
        let temp_dir = TempDir::new().unwrap();
        let config = write_config(&temp_dir);

        let output = run_host(&["rostovcli", "-q", "-c", &config, "-o", "table", "config", "show"]).await;
        assert!(output.contains("core.probe_interval_ms"));
        assert!(output.contains("core.state_dir"));
    }
}
