pub mod engine;
pub mod live;

pub use engine::{ReconcileSummary, RegisteredTool, ToolSetEngine};
pub use live::{
    CallToolResult, RegistryEvent, RegistryTransaction, ToolCallback, ToolContent, ToolHandle,
    ToolRegistry, ToolSpec,
};

use crate::error::SyncError;
use crate::tools::{SnapshotBuilder, ToolDefinition};
use tokio::sync::Mutex;

/// Discovery plus reconciliation: one full synchronization pass.
pub struct ToolSynchronizer {
    builder: SnapshotBuilder,
    engine: Mutex<ToolSetEngine>,
}

impl ToolSynchronizer {
    pub fn new(builder: SnapshotBuilder, engine: ToolSetEngine) -> Self {
        Self {
            builder,
            engine: Mutex::new(engine),
        }
    }

    /// Discover the current tool set and apply it to the registry.
    ///
    /// Emits a tool-list-changed signal when the registry changed. A failed
    /// snapshot (naming conflict) leaves the registry untouched.
    pub async fn run_pass(&self) -> Result<bool, SyncError> {
        let candidates = self.builder.build().await?;
        self.apply(candidates).await
    }

    /// Reconcile an already built candidate set.
    pub async fn apply(&self, candidates: Vec<ToolDefinition>) -> Result<bool, SyncError> {
        let mut engine = self.engine.lock().await;
        let changed = engine.reconcile(candidates).await?;
        if changed {
            engine.registry().notify_tool_list_changed();
        }
        Ok(changed)
    }

    /// Names currently registered, sorted.
    pub async fn tool_names(&self) -> Vec<String> {
        self.engine.lock().await.tracked_names()
    }
}
