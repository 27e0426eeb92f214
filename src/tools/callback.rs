//! Execution callback binding a registered tool to its decision operation.

use crate::registry::{CallToolResult, ToolCallback};
use crate::runtime::DecisionRuntime;
use crate::tools::definition::ToolOrigin;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Forwards tool calls to the decision runtime's execute endpoint.
pub struct DecisionToolCallback {
    runtime: Arc<dyn DecisionRuntime>,
    origin: ToolOrigin,
}

impl DecisionToolCallback {
    pub fn new(runtime: Arc<dyn DecisionRuntime>, origin: ToolOrigin) -> Self {
        Self { runtime, origin }
    }
}

#[async_trait]
impl ToolCallback for DecisionToolCallback {
    async fn call(&self, input: serde_json::Value) -> Result<CallToolResult> {
        let ToolOrigin {
            deployment_space,
            service_id,
            operation_id,
        } = &self.origin;
        debug!("Calling {}/{} in {}", service_id, operation_id, deployment_space);

        let output = self
            .runtime
            .execute(deployment_space, service_id, operation_id, &input)
            .await
            .with_context(|| format!("Execution of {service_id}/{operation_id} failed"))?;

        Ok(CallToolResult::text(output))
    }
}
