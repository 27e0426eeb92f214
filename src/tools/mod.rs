pub mod callback;
pub mod definition;
pub mod naming;
pub mod snapshot;

pub use callback::DecisionToolCallback;
pub use definition::{InputSchema, ToolDefinition, ToolOrigin};
pub use naming::{sanitize_tool_name, ToolNameAllocator};
pub use snapshot::SnapshotBuilder;
