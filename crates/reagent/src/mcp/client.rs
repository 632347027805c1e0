use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};

use super::protocol::*;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::Tool;

type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

fn transport_error(context: &str, error: impl std::fmt::Display) -> AgentError {
    AgentError::Transport(format!("{}: {}", context, error))
}

struct Connection {
    reader: Lines<BufReader<BoxedReader>>,
    writer: BoxedWriter,
}

impl Connection {
    async fn send(&mut self, request: &JsonRpcRequest) -> AgentResult<()> {
        let payload = serde_json::to_string(request)
            .map_err(|e| transport_error("failed to serialize request", e))?;
        self.writer
            .write_all(payload.as_bytes())
            .await
            .map_err(|e| transport_error("failed to write request", e))?;
        self.writer
            .write_all(b"\n")
            .await
            .map_err(|e| transport_error("failed to write request", e))?;
        self.writer
            .flush()
            .await
            .map_err(|e| transport_error("failed to flush request", e))
    }

    /// Read until the response for `id` arrives, skipping anything else the server sends
    async fn receive(&mut self, id: u64) -> AgentResult<JsonRpcResponse> {
        let expected = Value::from(id);
        loop {
            let line = self
                .reader
                .next_line()
                .await
                .map_err(|e| transport_error("failed to read response", e))?
                .ok_or_else(|| {
                    AgentError::Transport("tool server closed the connection".to_string())
                })?;
            if line.trim().is_empty() {
                continue;
            }

            let value: Value = match serde_json::from_str(&line) {
                Ok(value) => value,
                Err(error) => {
                    tracing::warn!("tool server stdout parse error: {} line={}", error, line);
                    continue;
                }
            };
            if value.get("method").is_some() {
                tracing::debug!("ignoring tool server message: {}", line);
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_value(value)
                .map_err(|e| transport_error("malformed response", e))?;
            if response.id != expected {
                tracing::warn!("ignoring response for unknown request id {}", response.id);
                continue;
            }
            return Ok(response);
        }
    }
}

/// Client side of a tool server session.
///
/// Requests are strictly sequential: each call waits for its own response before the
/// connection is released to the next caller.
pub struct McpClient {
    connection: Mutex<Connection>,
    next_id: AtomicU64,
    child: Mutex<Option<Child>>,
}

impl McpClient {
    /// Start a tool server process and connect to its stdin/stdout.
    ///
    /// The child is killed if the client is dropped without `shutdown`.
    pub async fn spawn(command: &str, args: &[String]) -> AgentResult<Self> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| transport_error(&format!("failed to spawn tool server {}", command), e))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AgentError::Transport("tool server stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Transport("tool server stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| AgentError::Transport("tool server stderr unavailable".to_string()))?;

        tokio::spawn(async move {
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                tracing::debug!("tool-server stderr: {}", line);
            }
        });

        tracing::info!(command, "started tool server");
        let client = Self::from_streams(stdout, stdin);
        *client.child.lock().await = Some(child);
        Ok(client)
    }

    /// Connect over an existing pair of streams
    pub fn from_streams<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let reader: BoxedReader = Box::new(reader);
        let writer: BoxedWriter = Box::new(writer);
        Self {
            connection: Mutex::new(Connection {
                reader: BufReader::new(reader).lines(),
                writer,
            }),
            next_id: AtomicU64::new(1),
            child: Mutex::new(None),
        }
    }

    async fn request<P, R>(&self, method: &str, params: &P) -> AgentResult<Result<R, JsonRpcError>>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params)
            .map_err(|e| transport_error("failed to serialize params", e))?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method, Some(params));

        let mut connection = self.connection.lock().await;
        connection.send(&request).await?;
        let response = connection.receive(id).await?;

        if let Some(error) = response.error {
            return Ok(Err(error));
        }
        let result = response.result.unwrap_or(Value::Null);
        serde_json::from_value(result)
            .map(Ok)
            .map_err(|e| transport_error(&format!("invalid {} result", method), e))
    }

    async fn notify(&self, method: &str) -> AgentResult<()> {
        let request = JsonRpcRequest::notification(method, None);
        self.connection.lock().await.send(&request).await
    }

    /// Perform the initialize handshake
    pub async fn initialize(&self) -> AgentResult<InitializeResult> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
            client_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };
        let result: InitializeResult = self
            .request(METHOD_INITIALIZE, &params)
            .await?
            .map_err(|e| transport_error("initialize rejected", e.message))?;
        self.notify(METHOD_INITIALIZED).await?;

        tracing::info!(
            server = %result.server_info.name,
            version = %result.server_info.version,
            protocol = %result.protocol_version,
            "tool server initialized"
        );
        Ok(result)
    }

    /// List every tool the server offers, following pagination cursors
    pub async fn list_tools(&self) -> AgentResult<Vec<Tool>> {
        let mut tools = Vec::new();
        let mut params = ListToolsParams::default();
        loop {
            let page: ListToolsResult = self
                .request(METHOD_LIST_TOOLS, &params)
                .await?
                .map_err(|e| transport_error("tools/list rejected", e.message))?;
            tools.extend(page.tools);
            match page.next_cursor {
                Some(cursor) => params.cursor = Some(cursor),
                None => return Ok(tools),
            }
        }
    }

    /// Call a tool. Protocol-level rejections of the call are reported as tool failures.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> AgentResult<CallToolResult> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        self.request(METHOD_CALL_TOOL, &params)
            .await?
            .map_err(|e| AgentError::ToolReported(e.message))
    }

    /// Close the session: end the server's input and wait for it to exit.
    ///
    /// Requests made after shutdown fail with a transport error.
    pub async fn shutdown(&self) -> AgentResult<()> {
        if let Err(error) = self.connection.lock().await.writer.shutdown().await {
            tracing::debug!("closing tool server input failed: {}", error);
        }

        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };
        let waited = timeout(SHUTDOWN_GRACE, child.wait()).await;
        match waited {
            Ok(status) => {
                let status =
                    status.map_err(|e| transport_error("failed to wait for tool server", e))?;
                tracing::info!(%status, "tool server exited");
            }
            Err(_) => {
                tracing::warn!("tool server did not exit, killing it");
                child
                    .kill()
                    .await
                    .map_err(|e| transport_error("failed to kill tool server", e))?;
            }
        }
        Ok(())
    }
}
