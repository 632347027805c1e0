use async_trait::async_trait;
use std::sync::Arc;

use super::ToolTransport;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{Tool, ToolCall};
use crate::registry::ToolRegistry;

/// Runs tools in-process from a registry
#[derive(Clone)]
pub struct LocalTransport {
    registry: Arc<ToolRegistry>,
}

impl LocalTransport {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ToolTransport for LocalTransport {
    fn tools(&self) -> &[Tool] {
        self.registry.tools()
    }

    fn get_tool(&self, name: &str) -> Option<&Tool> {
        self.registry.get(name)
    }

    async fn execute(&self, tool_call: ToolCall) -> AgentResult<String> {
        let result = self.registry.call(&tool_call.name, &tool_call.arguments)?;
        serde_json::to_string(&result).map_err(|e| AgentError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn transport() -> LocalTransport {
        let registry = ToolRegistry::new()
            .with_tool(
                Tool::new("add", "Adds two numbers", json!({"type": "object"})),
                |args: &Value| {
                    let a = args["a"].as_i64().unwrap_or_default();
                    let b = args["b"].as_i64().unwrap_or_default();
                    Ok(json!({ "sum": a + b }))
                },
            )
            .unwrap();
        LocalTransport::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_execute_serializes_result() {
        let transport = transport();
        let payload = transport
            .execute(ToolCall::new("add", json!({"a": 2, "b": 3})))
            .await
            .unwrap();
        assert_eq!(payload, r#"{"sum":5}"#);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let transport = transport();
        assert!(transport.get_tool("missing").is_none());
        let error = transport
            .execute(ToolCall::new("missing", json!({})))
            .await
            .unwrap_err();
        assert_eq!(error, AgentError::ToolNotFound("missing".into()));
    }

    #[test]
    fn test_shutdown_keeps_registry() {
        let transport = transport();
        tokio_test::block_on(transport.shutdown()).unwrap();
        assert_eq!(transport.tools().len(), 1);
    }
}
