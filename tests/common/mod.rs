//! In-memory decision runtime for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use decision_mcp_server::diagnostics::CollectingReporter;
use decision_mcp_server::error::RuntimeError;
use decision_mcp_server::openapi::ServiceDescriptor;
use decision_mcp_server::registry::{ToolRegistry, ToolSetEngine, ToolSynchronizer};
use decision_mcp_server::runtime::{tool_name_override_key, DecisionRuntime};
use decision_mcp_server::tools::SnapshotBuilder;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Default)]
struct State {
    /// Deployed service ids per space, in listing order.
    deployed: HashMap<String, Vec<String>>,
    descriptors: HashMap<String, ServiceDescriptor>,
    failing: HashSet<String>,
    failing_spaces: HashSet<String>,
    panicking_spaces: HashSet<String>,
    /// String metadata per decision id.
    metadata: HashMap<String, HashMap<String, String>>,
    outputs: HashMap<(String, String), String>,
}

/// Scriptable [`DecisionRuntime`].
#[derive(Default)]
pub struct FakeRuntime {
    state: Mutex<State>,
    gate: Mutex<Option<Arc<Notify>>>,
    list_calls: AtomicUsize,
    metadata_calls: AtomicUsize,
    executions: Mutex<Vec<(String, String, String, Value)>>,
}

impl FakeRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deploy (or redeploy) a service into `space`.
    pub fn deploy(&self, space: &str, service_id: &str, descriptor: Value) {
        let descriptor: ServiceDescriptor = serde_json::from_value(descriptor).unwrap();
        let mut state = self.state.lock().unwrap();
        let ids = state.deployed.entry(space.to_string()).or_default();
        if !ids.iter().any(|id| id == service_id) {
            ids.push(service_id.to_string());
        }
        state.descriptors.insert(service_id.to_string(), descriptor);
    }

    pub fn undeploy(&self, space: &str, service_id: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(ids) = state.deployed.get_mut(space) {
            ids.retain(|id| id != service_id);
        }
        state.descriptors.remove(service_id);
    }

    /// Make descriptor fetches of `service_id` fail.
    pub fn fail_descriptor(&self, service_id: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(service_id.to_string());
    }

    /// Make service listing of `space` fail.
    pub fn fail_listing(&self, space: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_spaces
            .insert(space.to_string());
    }

    /// List `service_id` in `space` once more, as a runtime with two
    /// deployments of one service does.
    pub fn list_again(&self, space: &str, service_id: &str) {
        self.state
            .lock()
            .unwrap()
            .deployed
            .entry(space.to_string())
            .or_default()
            .push(service_id.to_string());
    }

    /// Make service listing of `space` panic.
    pub fn panic_on_listing(&self, space: &str) {
        self.state
            .lock()
            .unwrap()
            .panicking_spaces
            .insert(space.to_string());
    }

    pub fn set_override(&self, decision_id: &str, operation_id: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .metadata
            .entry(decision_id.to_string())
            .or_default()
            .insert(tool_name_override_key(operation_id), name.to_string());
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }

    pub fn set_output(&self, service_id: &str, operation_id: &str, output: &str) {
        self.state.lock().unwrap().outputs.insert(
            (service_id.to_string(), operation_id.to_string()),
            output.to_string(),
        );
    }

    /// Hold every service listing until the returned notify is signalled.
    pub fn hold_listing(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn release_listing(&self) {
        if let Some(gate) = self.gate.lock().unwrap().take() {
            gate.notify_one();
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn executions(&self) -> Vec<(String, String, String, Value)> {
        self.executions.lock().unwrap().clone()
    }
}

#[async_trait]
impl DecisionRuntime for FakeRuntime {
    async fn list_deployed_service_ids(&self, space: &str) -> Result<Vec<String>, RuntimeError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let state = self.state.lock().unwrap();
        if state.panicking_spaces.contains(space) {
            drop(state);
            panic!("listing {space} blew up");
        }
        if state.failing_spaces.contains(space) {
            return Err(RuntimeError::Status {
                status: 500,
                body: format!("cannot list {space}"),
            });
        }
        Ok(state.deployed.get(space).cloned().unwrap_or_default())
    }

    async fn fetch_service_descriptor(
        &self,
        _space: &str,
        service_id: &str,
    ) -> Result<ServiceDescriptor, RuntimeError> {
        let state = self.state.lock().unwrap();
        if state.failing.contains(service_id) {
            return Err(RuntimeError::Status {
                status: 503,
                body: "unavailable".into(),
            });
        }
        state
            .descriptors
            .get(service_id)
            .cloned()
            .ok_or_else(|| RuntimeError::Status {
                status: 404,
                body: format!("no service {service_id}"),
            })
    }

    async fn decision_metadata(
        &self,
        _space: &str,
        decision_id: &str,
    ) -> Result<HashMap<String, String>, RuntimeError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .lock()
            .unwrap()
            .metadata
            .get(decision_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn execute(
        &self,
        space: &str,
        service_id: &str,
        operation_id: &str,
        input: &Value,
    ) -> Result<String, RuntimeError> {
        self.executions.lock().unwrap().push((
            space.to_string(),
            service_id.to_string(),
            operation_id.to_string(),
            input.clone(),
        ));
        self.state
            .lock()
            .unwrap()
            .outputs
            .get(&(service_id.to_string(), operation_id.to_string()))
            .cloned()
            .ok_or_else(|| RuntimeError::Other(format!("no output for {service_id}/{operation_id}")))
    }
}

/// Descriptor with one POST operation per `(operation id, properties)` pair.
pub fn descriptor(title: &str, operations: &[(&str, Value)]) -> Value {
    let mut paths = serde_json::Map::new();
    for (operation_id, properties) in operations {
        paths.insert(
            format!("/{operation_id}/execute"),
            json!({
                "post": {
                    "operationId": operation_id,
                    "summary": format!("{operation_id} operation"),
                    "description": format!("Execute {operation_id}"),
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": {"type": "object", "properties": properties}
                            }
                        }
                    }
                }
            }),
        );
    }
    json!({
        "info": {"title": title, "version": "1.0"},
        "paths": paths,
    })
}

/// Loan approval input used across tests.
pub fn loan_properties() -> Value {
    json!({
        "loan": {"type": "object", "properties": {"amount": {"type": "number"}}},
        "borrower": {"type": "object", "properties": {"name": {"type": "string"}}}
    })
}

/// Everything one synchronizer needs, wired to a [`FakeRuntime`].
pub struct Harness {
    pub runtime: Arc<FakeRuntime>,
    pub registry: ToolRegistry,
    pub reporter: CollectingReporter,
    pub sync: Arc<ToolSynchronizer>,
    pub builder: SnapshotBuilder,
}

impl Harness {
    pub fn new(runtime: Arc<FakeRuntime>, spaces: &[&str]) -> Self {
        Self::with_service_ids(runtime, spaces, None)
    }

    pub fn with_service_ids(
        runtime: Arc<FakeRuntime>,
        spaces: &[&str],
        service_ids: Option<&[&str]>,
    ) -> Self {
        let registry = ToolRegistry::new();
        let reporter = CollectingReporter::new();
        let builder = SnapshotBuilder::new(
            runtime.clone(),
            spaces.iter().map(|s| s.to_string()).collect(),
            service_ids.map(|ids| ids.iter().map(|s| s.to_string()).collect()),
            Arc::new(reporter.clone()),
        );
        let engine = ToolSetEngine::new(
            registry.clone(),
            runtime.clone(),
            Arc::new(reporter.clone()),
        );
        let sync = Arc::new(ToolSynchronizer::new(builder.clone(), engine));
        Self {
            runtime,
            registry,
            reporter,
            sync,
            builder,
        }
    }

    /// Registered tool names, sorted.
    pub async fn names(&self) -> Vec<String> {
        self.registry
            .list()
            .await
            .into_iter()
            .map(|spec| spec.name)
            .collect()
    }
}
