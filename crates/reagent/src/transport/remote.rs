use async_trait::async_trait;

use super::ToolTransport;
use crate::bridge::tools_to_function_specs;
use crate::errors::{AgentError, AgentResult};
use crate::mcp::protocol::Implementation;
use crate::mcp::McpClient;
use crate::models::content::contents_to_text;
use crate::models::tool::{Tool, ToolCall};

/// Runs tools through a tool server session.
///
/// The tool list is fetched once at connect time and cached for the lifetime of the
/// session.
pub struct RemoteTransport {
    client: McpClient,
    tools: Vec<Tool>,
    server_info: Implementation,
}

impl RemoteTransport {
    /// Initialize the session and discover the server's tools.
    ///
    /// A listing that cannot be declared to the model, such as one with duplicate
    /// names, fails the connection.
    pub async fn connect(client: McpClient) -> AgentResult<Self> {
        let initialized = client.initialize().await?;
        let tools = client.list_tools().await?;
        tools_to_function_specs(&tools)
            .map_err(|e| AgentError::Transport(format!("invalid tool listing: {}", e)))?;
        tracing::info!(
            server = %initialized.server_info.name,
            tools = tools.len(),
            "connected to tool server"
        );

        Ok(Self {
            client,
            tools,
            server_info: initialized.server_info,
        })
    }

    /// Spawn a tool server process and connect to it
    pub async fn spawn(command: &str, args: &[String]) -> AgentResult<Self> {
        let client = McpClient::spawn(command, args).await?;
        Self::connect(client).await
    }

    pub fn server_info(&self) -> &Implementation {
        &self.server_info
    }
}

#[async_trait]
impl ToolTransport for RemoteTransport {
    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn execute(&self, tool_call: ToolCall) -> AgentResult<String> {
        let result = self
            .client
            .call_tool(&tool_call.name, tool_call.arguments)
            .await?;
        let text = contents_to_text(&result.content);
        if result.is_error {
            return Err(AgentError::ToolReported(text));
        }
        Ok(text)
    }

    /// End the session and release the server process
    async fn shutdown(&self) -> AgentResult<()> {
        self.client.shutdown().await
    }
}
