//! The live tool registry served to MCP clients.
//!
//! Entries are created through a [`RegistryTransaction`] and only changed or
//! removed through the [`ToolHandle`] it returns. A transaction holds the
//! write lock until dropped, so readers never see half of a batch.

use crate::error::RegistryError;
use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock, RwLockWriteGuard};
use tracing::debug;

/// Client-facing description of a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: serde_json::Value,
}

/// One content item of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallToolResult {
    pub content: Vec<ToolContent>,
}

impl CallToolResult {
    /// A result holding a single text item.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }
}

/// Code run when a client calls a tool.
#[async_trait]
pub trait ToolCallback: Send + Sync {
    async fn call(&self, input: serde_json::Value) -> Result<CallToolResult>;
}

/// Signals broadcast to the protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryEvent {
    ToolListChanged,
}

struct Entry {
    id: u64,
    spec: ToolSpec,
    callback: Arc<dyn ToolCallback>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    next_id: u64,
    revision: u64,
}

/// Shared, name-keyed tool table.
#[derive(Clone)]
pub struct ToolRegistry {
    inner: Arc<RwLock<Inner>>,
    events: broadcast::Sender<RegistryEvent>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            events,
        }
    }

    /// Take the write lock for a batch of mutations.
    ///
    /// Readers wait until the transaction is dropped, so they see the
    /// registry either before or after the whole batch.
    pub async fn transaction(&self) -> RegistryTransaction<'_> {
        RegistryTransaction {
            inner: self.inner.write().await,
        }
    }

    /// Add a single tool. Names are unique across the registry.
    pub async fn register(
        &self,
        spec: ToolSpec,
        callback: Arc<dyn ToolCallback>,
    ) -> Result<ToolHandle, RegistryError> {
        self.transaction().await.register(spec, callback)
    }

    /// Every registered tool, sorted by name.
    pub async fn list(&self) -> Vec<ToolSpec> {
        let inner = self.inner.read().await;
        let mut specs: Vec<ToolSpec> = inner.entries.values().map(|e| e.spec.clone()).collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    /// Spec of one tool.
    pub async fn get(&self, name: &str) -> Option<ToolSpec> {
        self.inner.read().await.entries.get(name).map(|e| e.spec.clone())
    }

    /// Callback of one tool. The lock is released before the caller runs it.
    pub async fn callback(&self, name: &str) -> Option<Arc<dyn ToolCallback>> {
        self.inner
            .read()
            .await
            .entries
            .get(name)
            .map(|e| e.callback.clone())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of mutations applied so far.
    pub async fn revision(&self) -> u64 {
        self.inner.read().await.revision
    }

    /// Tell connected clients to re-list tools.
    pub fn notify_tool_list_changed(&self) {
        // No subscriber just means no client is connected yet.
        let _ = self.events.send(RegistryEvent::ToolListChanged);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }
}

/// Mutations applied under one held write lock.
pub struct RegistryTransaction<'a> {
    inner: RwLockWriteGuard<'a, Inner>,
}

impl RegistryTransaction<'_> {
    /// Add a tool and hand out the only handle to it.
    pub fn register(
        &mut self,
        spec: ToolSpec,
        callback: Arc<dyn ToolCallback>,
    ) -> Result<ToolHandle, RegistryError> {
        if self.inner.entries.contains_key(&spec.name) {
            return Err(RegistryError::DuplicateName(spec.name));
        }

        self.inner.next_id += 1;
        self.inner.revision += 1;
        let id = self.inner.next_id;
        let name = spec.name.clone();
        self.inner
            .entries
            .insert(name.clone(), Entry { id, spec, callback });
        debug!("Registered tool {}", name);

        Ok(ToolHandle { name, id })
    }

    /// Replace an entry's spec and callback. The name cannot change.
    pub fn update(
        &mut self,
        handle: &ToolHandle,
        spec: ToolSpec,
        callback: Arc<dyn ToolCallback>,
    ) -> Result<(), RegistryError> {
        debug_assert_eq!(spec.name, handle.name);
        let entry = self
            .inner
            .entries
            .get_mut(&handle.name)
            .filter(|e| e.id == handle.id)
            .ok_or_else(|| RegistryError::UnknownHandle(handle.name.clone()))?;

        entry.spec = ToolSpec {
            name: handle.name.clone(),
            ..spec
        };
        entry.callback = callback;
        self.inner.revision += 1;
        debug!("Updated tool {}", handle.name);
        Ok(())
    }

    /// Delete an entry. Consumes the handle.
    pub fn remove(&mut self, handle: ToolHandle) -> Result<(), RegistryError> {
        let owned = self
            .inner
            .entries
            .get(&handle.name)
            .is_some_and(|entry| entry.id == handle.id);
        if !owned {
            return Err(RegistryError::UnknownHandle(handle.name));
        }

        self.inner.entries.remove(&handle.name);
        self.inner.revision += 1;
        debug!("Removed tool {}", handle.name);
        Ok(())
    }
}

/// Exclusive reference to one registry entry.
#[derive(Debug)]
pub struct ToolHandle {
    name: String,
    id: u64,
}
