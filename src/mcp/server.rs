//! MCP request dispatch over the live tool registry.

use crate::mcp::protocol::*;
use crate::registry::ToolRegistry;
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Answers MCP requests from the current registry contents.
pub struct McpServer {
    registry: ToolRegistry,
    name: String,
    version: String,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self {
            registry,
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Handle one raw JSON line. Returns the serialized response, if any.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let response = match serde_json::from_str::<JsonRpcMessage>(line) {
            Ok(message) => self.handle(message).await?,
            Err(e) => {
                warn!("Unreadable MCP message: {}", e);
                JsonRpcResponse::error(None, JsonRpcError::parse_error(e.to_string()))
            }
        };
        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!("Failed to serialize MCP response: {}", e);
                None
            }
        }
    }

    /// Handle one message. Notifications get no response.
    pub async fn handle(&self, message: JsonRpcMessage) -> Option<JsonRpcResponse> {
        let Some(id) = message.id else {
            debug!("MCP notification: {}", message.method);
            return None;
        };

        let result = match message.method.as_str() {
            "initialize" => Ok(self.initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools().await),
            "tools/call" => self.call_tool(message.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => JsonRpcResponse::error(Some(id), error),
        })
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": true }
            },
            "serverInfo": {
                "name": self.name,
                "version": self.version,
            }
        })
    }

    async fn list_tools(&self) -> Value {
        json!({ "tools": self.registry.list().await })
    }

    async fn call_tool(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = params
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tools/call params"))?;

        let callback = self
            .registry
            .callback(&params.name)
            .await
            .ok_or_else(|| JsonRpcError::invalid_params(format!("Unknown tool: {}", params.name)))?;

        let input = params.arguments.unwrap_or_else(|| json!({}));
        let result = callback.call(input).await.map_err(|e| {
            warn!("Tool {} failed: {:#}", params.name, e);
            JsonRpcError::internal_error(format!("{e:#}"))
        })?;

        serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
    }
}
