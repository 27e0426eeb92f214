//! One discovery pass: every deployment space, every service, every operation.

use crate::config::ServerConfig;
use crate::diagnostics::{SyncEvent, SyncReporter};
use crate::error::{RuntimeError, SyncError};
use crate::openapi::{translate_descriptor, ServiceDescriptor};
use crate::runtime::{tool_name_override_key, DecisionRuntime};
use crate::tools::definition::{ToolDefinition, ToolOrigin};
use crate::tools::naming::ToolNameAllocator;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Builds the full candidate tool set from the decision runtime.
#[derive(Clone)]
pub struct SnapshotBuilder {
    runtime: Arc<dyn DecisionRuntime>,
    deployment_spaces: Vec<String>,
    service_ids: Option<Vec<String>>,
    reporter: Arc<dyn SyncReporter>,
}

impl SnapshotBuilder {
    pub fn new(
        runtime: Arc<dyn DecisionRuntime>,
        deployment_spaces: Vec<String>,
        service_ids: Option<Vec<String>>,
        reporter: Arc<dyn SyncReporter>,
    ) -> Self {
        Self {
            runtime,
            deployment_spaces,
            service_ids,
            reporter,
        }
    }

    pub fn from_config(
        config: &ServerConfig,
        runtime: Arc<dyn DecisionRuntime>,
        reporter: Arc<dyn SyncReporter>,
    ) -> Self {
        Self::new(
            runtime,
            config.deployment_spaces.clone(),
            config.decision_service_ids.clone(),
            reporter,
        )
    }

    /// Discover every tool currently available.
    ///
    /// Failures of one space or service are reported and skipped. A naming
    /// conflict fails the whole snapshot.
    pub async fn build(&self) -> Result<Vec<ToolDefinition>, SyncError> {
        let mut names = ToolNameAllocator::new();
        let mut tools = Vec::new();

        for space in &self.deployment_spaces {
            let service_ids = match self.service_ids_in(space).await {
                Ok(ids) => ids,
                Err(e) => {
                    self.reporter.report(SyncEvent::ScopeEnumerationFailed {
                        space: space.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };
            debug!("{} decision services in {}", service_ids.len(), space);

            for service_id in &service_ids {
                let descriptor = match self
                    .runtime
                    .fetch_service_descriptor(space, service_id)
                    .await
                {
                    Ok(descriptor) => descriptor,
                    Err(e) => {
                        self.reporter.report(SyncEvent::DescriptorFetchFailed {
                            space: space.clone(),
                            service_id: service_id.clone(),
                            error: e.to_string(),
                        });
                        continue;
                    }
                };

                self.add_service(space, service_id, &descriptor, &mut names, &mut tools)
                    .await?;
            }
        }

        info!("Discovered {} tools", tools.len());
        Ok(tools)
    }

    /// Configured ids verbatim, or the deployed ids with repeats dropped.
    async fn service_ids_in(&self, space: &str) -> Result<Vec<String>, RuntimeError> {
        if let Some(ids) = &self.service_ids {
            return Ok(ids.clone());
        }
        let mut seen = HashSet::new();
        let mut ids = self.runtime.list_deployed_service_ids(space).await?;
        ids.retain(|id| seen.insert(id.clone()));
        Ok(ids)
    }

    async fn add_service(
        &self,
        space: &str,
        service_id: &str,
        descriptor: &ServiceDescriptor,
        names: &mut ToolNameAllocator,
        tools: &mut Vec<ToolDefinition>,
    ) -> Result<(), SyncError> {
        let translation = translate_descriptor(descriptor);

        for skipped in translation.skipped {
            self.reporter.report(SyncEvent::OperationSkipped {
                service_id: service_id.to_string(),
                location: skipped.location,
                reason: skipped.reason.to_string(),
            });
        }
        for cycle in translation.cycles {
            self.reporter.report(SyncEvent::SchemaCycle {
                service_id: service_id.to_string(),
                operation_id: cycle.operation_id,
                reference: cycle.reference,
            });
        }

        let display_name = descriptor.display_name(service_id);
        let decision_id = descriptor.decision_id(service_id);

        if translation.operations.is_empty() {
            return Ok(());
        }
        let metadata = match self.runtime.decision_metadata(space, decision_id).await {
            Ok(metadata) => metadata,
            Err(e) => {
                self.reporter.report(SyncEvent::OverrideLookupFailed {
                    service_id: service_id.to_string(),
                    error: e.to_string(),
                });
                HashMap::new()
            }
        };

        for operation in translation.operations {
            let name_override = metadata.get(&tool_name_override_key(&operation.operation_id));
            let name = names.allocate(
                name_override.map(String::as_str),
                display_name,
                service_id,
                &operation.operation_id,
            )?;
            let origin = ToolOrigin {
                deployment_space: space.to_string(),
                service_id: service_id.to_string(),
                operation_id: operation.operation_id.clone(),
            };
            tools.push(ToolDefinition::new(name, operation, origin));
        }

        Ok(())
    }
}
