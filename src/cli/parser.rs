use crate::cli::args::Args;
use crate::cli::commands::execute_command;
use crate::core::host::ArgumentParser;
use crate::infrastructure::logging::init_logging;
use async_trait::async_trait;
use clap::error::ErrorKind;
use clap::Parser;
use tracing::{debug, warn};

/// Default argument parser backed by the clap command tree.
///
/// Help and version requests come back as text. Malformed arguments and
/// failed commands come back as `None`, the same as a command with
/// nothing to report; the cause only shows up in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ArgumentParser for CommandParser {
    async fn parse(&self, args: &[String]) -> Option<String> {
        let parsed = match Args::try_parse_from(args) {
            Ok(parsed) => parsed,
            Err(err) => return render_clap_outcome(err),
        };
        let quiet = parsed.quiet;

        match execute_command(parsed).await {
            Ok(output) => output,
            Err(e) => {
                if !quiet {
                    init_logging("warn", false);
                }
                warn!("Command failed: {}", e);
                None
            }
        }
    }
}

/// Help and version output, everything else is dropped
fn render_clap_outcome(err: clap::Error) -> Option<String> {
    match err.kind() {
        ErrorKind::DisplayHelp
        | ErrorKind::DisplayVersion
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            Some(err.render().to_string().trim_end().to_string())
        }
        kind => {
            init_logging("warn", false);
            debug!("Rejected arguments ({:?}): {}", kind, err.render());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_help_is_rendered() {
        let output = CommandParser::new().parse(&args(&["rostovcli", "--help"])).await.unwrap();
        assert!(output.contains("Usage:"));
        assert!(output.contains("prepare"));
        assert!(output.contains("settings"));
        assert!(!output.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_version_flag() {
        let output = CommandParser::new().parse(&args(&["rostovcli", "--version"])).await.unwrap();
        assert_eq!(output, format!("rostovcli {}", env!("CARGO_PKG_VERSION")));
    }

    #[tokio::test]
    async fn test_missing_subcommand_shows_group_help() {
        let output = CommandParser::new().parse(&args(&["rostovcli", "config"])).await.unwrap();
        assert!(output.contains("validate"));
    }

    #[tokio::test]
    async fn test_unknown_flag_yields_nothing() {
        assert!(CommandParser::new().parse(&args(&["rostovcli", "--bad-flag"])).await.is_none());
    }

    #[tokio::test]
    async fn test_bare_invocation_yields_nothing() {
        assert!(CommandParser::new().parse(&args(&["rostovcli"])).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_command_yields_nothing() {
        let result = CommandParser::new()
            .parse(&args(&["rostovcli", "-q", "-c", "/nonexistent/rostovcli.toml", "stop"]))
            .await;
        assert!(result.is_none());
    }
}
