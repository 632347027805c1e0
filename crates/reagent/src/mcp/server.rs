use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use super::protocol::*;
use crate::errors::{AgentError, AgentResult};
use crate::models::content::Content;
use crate::registry::ToolRegistry;

/// Serves the tools of a registry over a newline-delimited JSON-RPC stream
pub struct McpServer {
    info: Implementation,
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new<N, V>(name: N, version: V, registry: Arc<ToolRegistry>) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        Self {
            info: Implementation {
                name: name.into(),
                version: version.into(),
            },
            registry,
        }
    }

    /// Answer requests until the input stream ends
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> AgentResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(reader).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))?
        {
            if line.trim().is_empty() {
                continue;
            }
            let Some(response) = self.handle_line(&line) else {
                continue;
            };

            let mut payload = serde_json::to_string(&response)
                .map_err(|e| AgentError::Internal(e.to_string()))?;
            payload.push('\n');
            writer
                .write_all(payload.as_bytes())
                .await
                .map_err(|e| AgentError::Transport(e.to_string()))?;
            writer
                .flush()
                .await
                .map_err(|e| AgentError::Transport(e.to_string()))?;
        }

        tracing::info!("client closed the session");
        Ok(())
    }

    /// Handle one inbound line, returning the response to send if one is due
    pub fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("unparseable request: {}", e);
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(error_codes::PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };
        let request_id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: JsonRpcRequest = match serde_json::from_value::<JsonRpcRequest>(value) {
            Ok(request) if request.jsonrpc == JSONRPC_VERSION => request,
            Ok(request) => {
                return Some(JsonRpcResponse::failure(
                    request_id,
                    JsonRpcError::new(
                        error_codes::INVALID_REQUEST,
                        format!("Unsupported jsonrpc version: {}", request.jsonrpc),
                    ),
                ));
            }
            Err(e) => {
                tracing::warn!("invalid request: {}", e);
                return Some(JsonRpcResponse::failure(
                    request_id,
                    JsonRpcError::new(error_codes::INVALID_REQUEST, format!("Invalid request: {}", e)),
                ));
            }
        };

        let Some(id) = request.id.clone() else {
            tracing::debug!(method = %request.method, "notification");
            return None;
        };

        let outcome = match request.method.as_str() {
            METHOD_INITIALIZE => self.initialize(),
            METHOD_PING => Ok(json!({})),
            METHOD_LIST_TOOLS => self.list_tools(),
            METHOD_CALL_TOOL => self.call_tool(request.params),
            method => Err(JsonRpcError::new(
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            )),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn initialize(&self) -> Result<Value, JsonRpcError> {
        to_result(&InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({"tools": {}}),
            server_info: self.info.clone(),
        })
    }

    fn list_tools(&self) -> Result<Value, JsonRpcError> {
        to_result(&ListToolsResult {
            tools: self.registry.tools().to_vec(),
            next_cursor: None,
        })
    }

    fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let mut params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::new(error_codes::INVALID_PARAMS, "Missing params"))
            .and_then(|params| {
                serde_json::from_value(params)
                    .map_err(|e| JsonRpcError::new(error_codes::INVALID_PARAMS, e.to_string()))
            })?;
        if params.arguments.is_null() {
            params.arguments = json!({});
        }

        tracing::info!(tool = %params.name, "calling tool");
        let result = match self.registry.call(&params.name, &params.arguments) {
            Ok(value) => CallToolResult {
                content: vec![Content::text(value.to_string())],
                is_error: false,
            },
            Err(e) => {
                tracing::warn!(tool = %params.name, "tool failed: {}", e);
                CallToolResult {
                    content: vec![Content::text(e.to_string())],
                    is_error: true,
                }
            }
        };
        to_result(&result)
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(error_codes::INTERNAL_ERROR, e.to_string()))
}
