/// MCP client implementation
/// 
/// This module handles the Model Context Protocol communication with the
/// server under test: envelopes, line framing, the exchange driver and the
/// child process that hosts the server.

pub mod client;
pub mod framing;
pub mod process;
pub mod protocol;

// Re-export main types
pub use client::{McpClient, Observation};
pub use process::ServerProcess;
