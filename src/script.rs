/// The fixed request sequence the probe drives
///
/// initialize → notifications/initialized → tools/list → read_card, and when
/// a comment is given, add_card_comment followed by a second read_card.

use serde_json::Map;
use tokio::io::AsyncWrite;
use tracing::debug;

use crate::card::CardRef;
use crate::config::HarnessConfig;
use crate::mcp::client::{McpClient, Observation};
use crate::mcp::protocol::{tools, ClientCapabilities, ClientInfo, InitializeParams, JsonRpcRequest, ToolCallParams};
use crate::report::Reporter;

/// What to exercise on the server
#[derive(Debug, Clone)]
pub struct Script {
    pub card: CardRef,
    /// Comment text; enables the write path
    pub comment: Option<String>,
}

/// Totals for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Id-bearing requests written
    pub requests_sent: usize,
    pub notifications_sent: usize,
    /// Responses matched to the request that was waiting for them
    pub responses_received: usize,
    /// Of those, responses carrying a JSON-RPC error
    pub error_responses: usize,
    /// Messages that could not be written to the server
    pub write_failures: usize,
    /// Lines that were not JSON-RPC
    pub malformed: usize,
    /// Ids that never got an answer
    pub unanswered: Vec<u64>,
    /// Whether the server was asked to stop
    pub terminated: bool,
    pub exit_status: Option<String>,
}

impl RunReport {
    /// Every id-bearing request was answered
    pub fn all_answered(&self) -> bool {
        self.unanswered.is_empty()
    }
}

impl Script {
    pub fn new(card: CardRef, comment: Option<String>) -> Self {
        Self { card, comment }
    }

    /// The requests to send, in order, with ids assigned from 1
    pub fn requests(&self, config: &HarnessConfig) -> Vec<JsonRpcRequest> {
        let mut next_id = 0u64;
        let mut id = || {
            next_id += 1;
            next_id
        };

        let card_id = self.card.as_argument();
        let read_card = |id: u64| JsonRpcRequest::tool_call(id, ToolCallParams::new(tools::READ_CARD, [("card_id", card_id)]));

        let initialize = InitializeParams {
            protocol_version: config.protocol_version.clone(),
            capabilities: ClientCapabilities { tools: Some(Map::new()) },
            client_info: ClientInfo {
                name: config.client_name.clone(),
                version: config.client_version.clone(),
            },
        };

        let mut requests = vec![
            JsonRpcRequest::initialize(id(), &initialize),
            JsonRpcRequest::initialized(),
            JsonRpcRequest::tools_list(id()),
            read_card(id()),
        ];

        if let Some(comment) = &self.comment {
            requests.push(JsonRpcRequest::tool_call(
                id(),
                ToolCallParams::new(
                    tools::ADD_CARD_COMMENT,
                    [("card_id", card_id), ("comment_text", comment.as_str())],
                ),
            ));
            requests.push(read_card(id()));
        }

        requests
    }

    /// Drive every request through `client`, whatever happens to earlier ones
    ///
    /// Waits `settle_delay` afterwards and reports anything still queued.
    /// Does not close the client or touch the server process.
    pub async fn run<W>(&self, client: &mut McpClient<W>, config: &HarnessConfig, reporter: &mut dyn Reporter) -> RunReport
    where
        W: AsyncWrite + Unpin,
    {
        let mut report = RunReport::default();

        for request in self.requests(config) {
            debug!("Step: {} (id {:?})", request.method, request.id);

            let observed = client.send_and_observe(&request, reporter).await;
            match observed {
                Observation::Response(response) => {
                    report.requests_sent += 1;
                    report.responses_received += 1;
                    if response.is_error() {
                        report.error_responses += 1;
                    }
                }
                Observation::NotExpected => report.notifications_sent += 1,
                Observation::Malformed(_) => {
                    report.requests_sent += 1;
                    report.malformed += 1;
                }
                Observation::TimedOut | Observation::Closed => report.requests_sent += 1,
                Observation::WriteFailed => report.write_failures += 1,
            }
        }

        if !config.settle_delay.is_zero() {
            tokio::time::sleep(config.settle_delay).await;
        }
        client.drain(reporter);

        report.unanswered = client.pending();
        report
    }
}
