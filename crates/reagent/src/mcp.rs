//! Tool server protocol: newline-delimited JSON-RPC 2.0 using the MCP method names.
//!
//! Only the subset the agent needs is implemented: the initialize handshake, tool
//! listing and tool calls.
pub mod client;
pub mod protocol;
pub mod server;

pub use client::McpClient;
pub use server::McpServer;
