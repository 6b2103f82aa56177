// rostovcli - Command-line host for the RostovVPN core
use rostovcli::cli::CommandParser;
use rostovcli::core::CliHost;
use rostovcli::infrastructure::logging::init_logging;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let host = CliHost::new(CommandParser::new());
    let mut stdout = std::io::stdout();
    if let Err(e) = host.run(args, &mut stdout).await {
        init_logging("warn", false);
        tracing::error!("Failed to write result: {}", e);
    }

    // The parser's outcome never changes the exit status
    ExitCode::SUCCESS
}
