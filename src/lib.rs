/// Public library interface for the Businessmap MCP probe
///
/// The probe launches the MCP server, drives a fixed JSON-RPC script against
/// it over stdin/stdout and prints the exchange for manual inspection.

use thiserror::Error;
use tracing::{info, warn};

pub mod card;
pub mod config;
pub mod mcp;
pub mod report;
pub mod script;

// Re-export the types most callers need
pub use card::{CardRef, CardRefError};
pub use config::{ConfigError, HarnessConfig};
pub use mcp::{McpClient, Observation, ServerProcess};
pub use report::{ConsoleReporter, Reporter};
pub use script::{RunReport, Script};

/// Errors that stop a probe run before or outside the scripted steps
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to start MCP server '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("MCP server {0} was not captured")]
    MissingPipe(&'static str),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid card reference: {0}")]
    CardRef(#[from] CardRefError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A probe run against one server executable
pub struct Probe {
    config: HarnessConfig,
}

impl Probe {
    /// Create a probe, rejecting unusable settings before anything is launched
    pub fn new(config: HarnessConfig) -> Result<Self, ProbeError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Launch the server, run `script` against it, and shut it down
    ///
    /// Only a launch failure is returned as an error. Problems with individual
    /// requests end up in the transcript and the returned report.
    pub async fn run(&self, script: &Script, reporter: &mut dyn Reporter) -> Result<RunReport, ProbeError> {
        if let CardRef::Unrecognized(raw) = &script.card {
            warn!("'{}' does not look like a card URL; sending it anyway", raw);
        }
        reporter.banner(&script.card);

        let launched = ServerProcess::spawn(&self.config.server_program, &self.config.server_args)?;
        let mut process = launched.process;
        reporter.server_started(process.program(), process.pid());

        let mut client = McpClient::connect(launched.stdin, launched.stdout, self.config.response_timeout);
        let mut report = script.run(&mut client, &self.config, reporter).await;

        if let Some(stderr) = process.take_stderr() {
            reporter.server_stderr(&stderr);
        }

        client.close().await;
        let status = process.terminate(self.config.shutdown_grace).await;
        report.terminated = process.is_terminated();

        match status {
            Ok(Some(status)) => report.exit_status = Some(status.to_string()),
            Ok(None) => {}
            Err(e) => warn!("Failed to stop MCP server: {}", e),
        }

        if let Some(stderr) = process.finish_stderr(self.config.shutdown_grace).await {
            reporter.server_stderr(&stderr);
        }
        // Anything printed to stdout between the drain and exit
        client.drain(reporter);
        report.unanswered = client.pending();

        info!(
            "Run finished: {} requests, {} responses",
            report.requests_sent, report.responses_received
        );
        reporter.summary(&report);
        Ok(report)
    }
}
