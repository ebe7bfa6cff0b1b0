/// Operator-facing transcript of an exchange
///
/// Everything the probe sends and everything it gets back is echoed here so
/// the person running it can judge whether the server behaved. Diagnostics
/// go to `tracing` on stderr instead.

use std::io::Write;
use std::time::Duration;

use serde_json::Value;

use crate::card::CardRef;
use crate::mcp::protocol::{error_codes, JsonRpcResponse};
use crate::script::RunReport;

/// Sink for the exchange transcript
pub trait Reporter {
    /// Header printed before the server is launched
    fn banner(&mut self, card: &CardRef);

    /// The server process was spawned
    fn server_started(&mut self, program: &str, pid: Option<u32>);

    /// A line is about to be written to the server
    fn sending(&mut self, line: &str);

    /// The response matching the request just sent
    fn received(&mut self, response: &JsonRpcResponse);

    /// A line from the server could not be understood
    fn parse_error(&mut self, line: &str, reason: &str);

    /// No response for `id` arrived before the deadline
    fn timed_out(&mut self, id: u64, after: Duration);

    /// The server's output closed while waiting for `id`
    fn stream_closed(&mut self, id: u64);

    /// Writing a request to the server failed
    fn write_failed(&mut self, error: &std::io::Error);

    /// A response for an earlier request that had already timed out
    fn late_response(&mut self, response: &JsonRpcResponse);

    /// A response whose id matches nothing we sent
    fn unsolicited_response(&mut self, response: &JsonRpcResponse);

    /// A notification or request initiated by the server
    fn server_message(&mut self, method: &str, params: Option<&Value>);

    /// Text the server wrote to its error stream
    fn server_stderr(&mut self, text: &str);

    /// Closing summary
    fn summary(&mut self, report: &RunReport);
}

/// Reporter that prints to a writer, stdout by default
pub struct ConsoleReporter<W: Write = std::io::Stdout> {
    out: W,
}

impl ConsoleReporter {
    pub fn stdout() -> Self {
        Self { out: std::io::stdout() }
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the underlying writer (useful for testing)
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, text: std::fmt::Arguments<'_>) {
        // A closed console is not worth aborting the exchange for
        let _ = writeln!(self.out, "{}", text);
        let _ = self.out.flush();
    }

    fn pretty(response: &JsonRpcResponse) -> String {
        serde_json::to_string_pretty(response).unwrap_or_else(|_| format!("{:?}", response))
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn banner(&mut self, card: &CardRef) {
        match card.card_id() {
            Some(id) if id == card.as_argument() => {
                self.line(format_args!("Testing Businessmap MCP Server with card ID: {}", id))
            }
            Some(id) => self.line(format_args!(
                "Testing Businessmap MCP Server with card ID: {} ({})",
                id,
                card.as_argument()
            )),
            None => self.line(format_args!("Testing Businessmap MCP Server with card: {}", card)),
        }
        self.line(format_args!("{}", "=".repeat(50)));
    }

    fn server_started(&mut self, program: &str, pid: Option<u32>) {
        match pid {
            Some(pid) => self.line(format_args!("Started MCP server process {} (pid {})", program, pid)),
            None => self.line(format_args!("Started MCP server process {}", program)),
        }
    }

    fn sending(&mut self, line: &str) {
        self.line(format_args!("→ Sending: {}", line.trim_end()));
    }

    fn received(&mut self, response: &JsonRpcResponse) {
        self.line(format_args!("← Received: {}", Self::pretty(response)));
        if let Some(error) = &response.error {
            let kind = error_codes::name(error.code).unwrap_or("application error");
            self.line(format_args!("  ({} {}: {})", kind, error.code, error.message));
        }
    }

    fn parse_error(&mut self, line: &str, reason: &str) {
        self.line(format_args!("← Error parsing response: {}", reason));
        self.line(format_args!("  raw: {}", line));
    }

    fn timed_out(&mut self, id: u64, after: Duration) {
        self.line(format_args!("← No response to request {} within {} ms", id, after.as_millis()));
    }

    fn stream_closed(&mut self, id: u64) {
        self.line(format_args!("← Error reading response to request {}: server output closed", id));
    }

    fn write_failed(&mut self, error: &std::io::Error) {
        self.line(format_args!("→ Error sending request: {}", error));
    }

    fn late_response(&mut self, response: &JsonRpcResponse) {
        self.line(format_args!("← Late response to request {}: {}", response.id, Self::pretty(response)));
    }

    fn unsolicited_response(&mut self, response: &JsonRpcResponse) {
        self.line(format_args!("← Unsolicited response (id {}): {}", response.id, Self::pretty(response)));
    }

    fn server_message(&mut self, method: &str, params: Option<&Value>) {
        match params {
            Some(params) => self.line(format_args!("← Server message {}: {}", method, params)),
            None => self.line(format_args!("← Server message {}", method)),
        }
    }

    fn server_stderr(&mut self, text: &str) {
        self.line(format_args!("Server stderr: {}", text));
    }

    fn summary(&mut self, report: &RunReport) {
        self.line(format_args!("{}", "=".repeat(50)));
        self.line(format_args!(
            "Sent {} requests and {} notifications, received {} responses",
            report.requests_sent, report.notifications_sent, report.responses_received
        ));
        if report.error_responses > 0 {
            self.line(format_args!("Error responses: {}", report.error_responses));
        }
        if report.write_failures > 0 {
            self.line(format_args!("Failed to send: {}", report.write_failures));
        }
        if !report.unanswered.is_empty() {
            let ids: Vec<String> = report.unanswered.iter().map(u64::to_string).collect();
            self.line(format_args!("Unanswered requests: {}", ids.join(", ")));
        }
        if let Some(status) = &report.exit_status {
            self.line(format_args!("Server exited: {}", status));
        }
    }
}
