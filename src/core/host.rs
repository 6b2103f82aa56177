//! Process host.
//!
//! The host forwards the invocation arguments to an [`ArgumentParser`] and
//! prints whatever text comes back. It never inspects the result: a parser
//! that has nothing to say and a parser that failed both return `None`,
//! and both end the run successfully with empty output.

use crate::domain::error::RostovResult;
use async_trait::async_trait;
use std::io::Write;

/// Capability that interprets the process arguments.
///
/// `args` holds the program name followed by the user-supplied tokens, in
/// invocation order. The returned text is owned by the caller.
#[async_trait]
pub trait ArgumentParser: Send + Sync {
    async fn parse(&self, args: &[String]) -> Option<String>;
}

/// Entry point host that owns a single parser call per run
pub struct CliHost<P: ArgumentParser> {
    parser: P,
}

impl<P: ArgumentParser> CliHost<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Run the parser once and print its result, if any, as one line.
    ///
    /// Only a failure to write `out` is reported.
    pub async fn run<W: Write>(&self, args: Vec<String>, out: &mut W) -> RostovResult<()> {
        let Some(result) = self.parser.parse(&args).await else {
            return Ok(());
        };

        writeln!(out, "{}", result)?;
        out.flush()?;
        drop(result);
        Ok(())
    }
}
