// Logging module - Logging infrastructure
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use std::io;

/// Map a configured level name onto a filter directive
pub fn level_directive(log_level: &str, verbose: bool) -> String {
    let level = if verbose {
        "debug"
    } else {
        match log_level {
            "error" | "warn" | "info" | "debug" | "trace" => log_level,
            _ => "warn",
        }
    };
    format!("rostovcli={}", level)
}

/// Initialize logging system.
///
/// Output goes to stderr; stdout belongs to the host's single result line.
/// `RUST_LOG` takes precedence over the configured level. Calling this
/// again once a subscriber is installed is a no-op.
pub fn init_logging(log_level: &str, verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(log_level, verbose)));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .with_level(true)
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("rostovcli logging initialized");
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_init_twice() {
        init_logging("info", false);
        init_logging("debug", true);
    }

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("info", false), "rostovcli=info");
        assert_eq!(level_directive("info", true), "rostovcli=debug");
        assert_eq!(level_directive("loud", false), "rostovcli=warn");
    }
}
