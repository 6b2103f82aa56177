use crate::domain::config::APP_DIR_NAME;
use crate::domain::error::{RostovError, RostovResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Directories the core runs in, derived from its config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Environment {
    pub config_path: PathBuf,
    pub base_dir: PathBuf,
    pub working_dir: PathBuf,
    pub temp_dir: PathBuf,
}

/// Strip whitespace and surrounding quotes left by shells and launchers
pub fn clean_config_path(path: &str) -> String {
    path.trim()
        .trim_matches('"')
        .trim_matches('\'')
        .to_string()
}

/// Resolve the config path and create the directories around it.
///
/// The working directory is the config's parent; the base directory is the
/// working directory's parent, or the working directory itself at the root.
pub fn prepare_environment(config_path: &str) -> RostovResult<Environment> {
    let cleaned = clean_config_path(config_path);
    if cleaned.is_empty() {
        return Err(RostovError::InvalidInput("missing --core-config".to_string()));
    }

    let config_path = std::path::absolute(&cleaned).map_err(|e| RostovError::Environment {
        message: format!("Failed to resolve {}: {}", cleaned, e),
    })?;

    let working_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| RostovError::Environment {
            message: format!("{} has no parent directory", config_path.display()),
        })?;
    create_dir(&working_dir)?;

    let base_dir = match working_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => working_dir.clone(),
    };
    create_dir(&base_dir)?;

    let temp_dir = std::env::temp_dir().join(APP_DIR_NAME);
    create_dir(&temp_dir)?;

    debug!("Prepared environment for {}", config_path.display());
    Ok(Environment {
        config_path,
        base_dir,
        working_dir,
        temp_dir,
    })
}

fn create_dir(dir: &Path) -> RostovResult<()> {
    fs::create_dir_all(dir).map_err(|e| RostovError::Environment {
        message: format!("Failed to create {}: {}", dir.display(), e),
    })
}

/// Ask a running core to stop by creating the stop file
pub fn request_stop(stop_file: &Path) -> RostovResult<()> {
    if let Some(parent) = stop_file.parent() {
        create_dir(parent)?;
    }
    fs::File::create(stop_file)?;
    info!("Stop requested via {}", stop_file.display());
    Ok(())
}

/// Remove a stale stop file, returns whether one existed
pub fn clear_stop_request(stop_file: &Path) -> RostovResult<bool> {
    match fs::remove_file(stop_file) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Poll for the stop file and consume it once it appears.
///
/// A stop file left over from before the call is removed first, so only a
/// stop requested during the wait counts. Returns `false` when `timeout`
/// elapses first. Without a timeout the wait is unbounded.
pub async fn await_stop_request(
    stop_file: &Path,
    interval: Duration,
    timeout: Option<Duration>,
) -> RostovResult<bool> {
    if clear_stop_request(stop_file)? {
        debug!("Removed stale stop file {}", stop_file.display());
    }
    let started = Instant::now();

    loop {
        if stop_file.exists() {
            clear_stop_request(stop_file)?;
            info!("Stop file {} consumed", stop_file.display());
            return Ok(true);
        }
        if let Some(timeout) = timeout {
            if started.elapsed() >= timeout {
                debug!("No stop requested within {:?}", timeout);
                return Ok(false);
            }
        }
        tokio::time::sleep(interval).await;
    }
}
