/// Harness settings
///
/// Built by the binary from command line flags; library users and tests
/// construct it directly, usually starting from `HarnessConfig::default()`.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::mcp::protocol::MCP_PROTOCOL_VERSION;

/// Server executable launched when none is given
pub const DEFAULT_SERVER_PROGRAM: &str = "./businessmap-mcp";

/// Errors in harness settings
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("server program path cannot be empty")]
    EmptyServerProgram,

    #[error("{name} must be greater than zero")]
    ZeroDuration { name: &'static str },
}

/// Everything that shapes one probe run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Server executable
    pub server_program: PathBuf,
    /// Arguments for the server; the Businessmap server takes none
    pub server_args: Vec<String>,
    /// How long to wait for the response to each request
    pub response_timeout: Duration,
    /// Pause after the last request so trailing output can arrive
    pub settle_delay: Duration,
    /// How long the server gets to exit after stdin closes before it is killed
    pub shutdown_grace: Duration,
    /// Protocol version announced in `initialize`
    pub protocol_version: String,
    pub client_name: String,
    pub client_version: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            server_program: PathBuf::from(DEFAULT_SERVER_PROGRAM),
            server_args: Vec::new(),
            response_timeout: Duration::from_secs(5),
            settle_delay: Duration::from_secs(1),
            shutdown_grace: Duration::from_secs(2),
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            client_name: env!("CARGO_PKG_NAME").to_string(),
            client_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl HarnessConfig {
    /// Check settings before anything is launched
    ///
    /// A zero settle delay is allowed; a zero response timeout would make
    /// every request look unanswered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_program.as_os_str().is_empty() {
            return Err(ConfigError::EmptyServerProgram);
        }
        if self.response_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration { name: "response timeout" });
        }
        if self.shutdown_grace.is_zero() {
            return Err(ConfigError::ZeroDuration { name: "shutdown grace period" });
        }
        Ok(())
    }
}
