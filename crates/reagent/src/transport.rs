//! Tool execution strategies.
//!
//! The agent only sees the `ToolTransport` contract; whether a tool runs in-process or
//! behind a tool server session is decided when the agent is constructed.
use async_trait::async_trait;

use crate::errors::AgentResult;
use crate::models::tool::{Tool, ToolCall};

pub mod local;
pub mod remote;

pub use local::LocalTransport;
pub use remote::RemoteTransport;

#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// Tools this transport can execute, in a stable order
    fn tools(&self) -> &[Tool];

    /// Resolve a tool by name
    fn get_tool(&self, name: &str) -> Option<&Tool> {
        self.tools().iter().find(|tool| tool.name == name)
    }

    /// Execute a decoded tool call and return its serialized result
    async fn execute(&self, tool_call: ToolCall) -> AgentResult<String>;

    /// Release whatever the transport holds open
    async fn shutdown(&self) -> AgentResult<()> {
        Ok(())
    }
}
