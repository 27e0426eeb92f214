//! Reconciliation of discovered tools against the live registry.
//!
//! Each pass applies three phases in a fixed order:
//! 1. removals (names no longer discovered),
//! 2. additions (names not registered yet),
//! 3. updates (same name, different schema fingerprint).
//!
//! Removals go first so a name freed in this pass can be taken by another
//! operation in the same pass. A name that moved to another operation is
//! removed and added again rather than updated.

use crate::diagnostics::{SyncEvent, SyncReporter};
use crate::error::{RegistryError, SyncError};
use crate::registry::live::{ToolHandle, ToolRegistry, ToolSpec};
use crate::runtime::DecisionRuntime;
use crate::tools::{DecisionToolCallback, ToolDefinition, ToolOrigin};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// A definition that currently owns a registry entry.
#[derive(Debug)]
pub struct RegisteredTool {
    pub definition: ToolDefinition,
    handle: ToolHandle,
}

/// What one reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub updated: Vec<String>,
}

impl ReconcileSummary {
    pub fn changed(&self) -> bool {
        !(self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty())
    }
}

/// Sole mutator of the live registry.
pub struct ToolSetEngine {
    registry: ToolRegistry,
    runtime: Arc<dyn DecisionRuntime>,
    reporter: Arc<dyn SyncReporter>,
    tracked: HashMap<String, RegisteredTool>,
}

impl ToolSetEngine {
    pub fn new(
        registry: ToolRegistry,
        runtime: Arc<dyn DecisionRuntime>,
        reporter: Arc<dyn SyncReporter>,
    ) -> Self {
        Self {
            registry,
            runtime,
            reporter,
            tracked: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Definition currently registered under `name`.
    pub fn tracked(&self, name: &str) -> Option<&ToolDefinition> {
        self.tracked.get(name).map(|t| &t.definition)
    }

    /// Names currently registered, sorted.
    pub fn tracked_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tracked.keys().cloned().collect();
        names.sort();
        names
    }

    /// Bring the registry in line with `candidates`. Returns whether anything changed.
    pub async fn reconcile(&mut self, candidates: Vec<ToolDefinition>) -> Result<bool, SyncError> {
        Ok(self.apply(candidates).await?.changed())
    }

    /// Like [`reconcile`](Self::reconcile), returning the per-name outcome.
    pub async fn apply(
        &mut self,
        candidates: Vec<ToolDefinition>,
    ) -> Result<ReconcileSummary, SyncError> {
        let candidates = self.dedup(candidates);
        let incoming: HashMap<&str, &ToolOrigin> = candidates
            .iter()
            .map(|c| (c.name.as_str(), &c.origin))
            .collect();
        let mut summary = ReconcileSummary::default();
        // Held for all three phases so readers never see a partial pass.
        let mut txn = self.registry.transaction().await;

        // A name now produced by a different operation is a different tool.
        let stale: Vec<String> = self
            .tracked
            .iter()
            .filter(|(name, tool)| incoming.get(name.as_str()) != Some(&&tool.definition.origin))
            .map(|(name, _)| name.clone())
            .collect();
        for name in stale {
            let tool = self
                .tracked
                .remove(&name)
                .ok_or_else(|| RegistryError::UnknownHandle(name.clone()))?;
            txn.remove(tool.handle)?;
            summary.removed.push(name);
        }

        let mut added = HashSet::new();
        for candidate in &candidates {
            if self.tracked.contains_key(&candidate.name) {
                continue;
            }
            let handle = txn.register(spec_of(candidate), bind_callback(&self.runtime, candidate))?;
            self.tracked.insert(
                candidate.name.clone(),
                RegisteredTool {
                    definition: candidate.clone(),
                    handle,
                },
            );
            added.insert(candidate.name.clone());
            summary.added.push(candidate.name.clone());
        }

        for candidate in candidates {
            if added.contains(&candidate.name) {
                continue;
            }
            let tool = self
                .tracked
                .get_mut(&candidate.name)
                .ok_or_else(|| RegistryError::UnknownHandle(candidate.name.clone()))?;
            // Only the input schema counts; title or description drift alone is ignored.
            if tool.definition.fingerprint == candidate.fingerprint {
                continue;
            }
            txn.update(
                &tool.handle,
                spec_of(&candidate),
                bind_callback(&self.runtime, &candidate),
            )?;
            summary.updated.push(candidate.name.clone());
            tool.definition = candidate;
        }

        drop(txn);

        if summary.changed() {
            info!(
                "Tool set changed: {} added, {} removed, {} updated",
                summary.added.len(),
                summary.removed.len(),
                summary.updated.len()
            );
        } else {
            debug!("Tool set unchanged ({} tools)", self.tracked.len());
        }
        Ok(summary)
    }

    /// Keep the first candidate of each name.
    fn dedup(&self, candidates: Vec<ToolDefinition>) -> Vec<ToolDefinition> {
        let mut seen = HashSet::with_capacity(candidates.len());
        let mut unique = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if seen.insert(candidate.name.clone()) {
                unique.push(candidate);
            } else {
                self.reporter.report(SyncEvent::DuplicateCandidate {
                    name: candidate.name,
                    service_id: candidate.origin.service_id,
                });
            }
        }
        unique
    }
}

fn bind_callback(
    runtime: &Arc<dyn DecisionRuntime>,
    definition: &ToolDefinition,
) -> Arc<DecisionToolCallback> {
    Arc::new(DecisionToolCallback::new(
        runtime.clone(),
        definition.origin.clone(),
    ))
}

fn spec_of(definition: &ToolDefinition) -> ToolSpec {
    ToolSpec {
        name: definition.name.clone(),
        title: definition.title.clone(),
        description: definition.description.clone(),
        input_schema: definition.input_schema.to_json(),
    }
}
