//! Tool name allocation for (decision service, operation) pairs.

use crate::error::SyncError;
use std::collections::HashSet;

/// Replace characters MCP hosts reject in tool names (whitespace, path separators).
pub fn sanitize_tool_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_whitespace() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Hands out unique tool names within one discovery pass.
///
/// Allocation is order-sensitive: the first operation to ask for a default
/// name gets it, later ones fall back to the service id form.
#[derive(Debug, Default)]
pub struct ToolNameAllocator {
    taken: HashSet<String>,
}

impl ToolNameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pick the name for one operation and remember it.
    ///
    /// An override is used verbatim and is not checked for collisions.
    /// Otherwise `"<display name> <operation>"` is tried, then
    /// `"<service id> <operation>"`, both sanitized.
    pub fn allocate(
        &mut self,
        name_override: Option<&str>,
        display_name: &str,
        service_id: &str,
        operation_id: &str,
    ) -> Result<String, SyncError> {
        if let Some(name) = name_override {
            self.taken.insert(name.to_string());
            return Ok(name.to_string());
        }

        let preferred = sanitize_tool_name(&format!("{display_name} {operation_id}"));
        if self.taken.insert(preferred.clone()) {
            return Ok(preferred);
        }

        let fallback = sanitize_tool_name(&format!("{service_id} {operation_id}"));
        if self.taken.insert(fallback.clone()) {
            return Ok(fallback);
        }

        Err(SyncError::NamingConflict { name: fallback })
    }
}
