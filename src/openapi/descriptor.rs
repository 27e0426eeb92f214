//! The subset of an OpenAPI document a decision service publishes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// HTTP methods that may carry an operation in a path item.
pub const OPERATION_METHODS: &[&str] = &["post", "put", "patch", "get", "delete"];

/// API descriptor of one deployed decision service.
///
/// Paths are kept as raw JSON so one malformed operation can be skipped
/// without failing the whole document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    #[serde(default)]
    pub info: DescriptorInfo,
    #[serde(default)]
    pub paths: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub components: Components,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptorInfo {
    #[serde(default)]
    pub title: Option<String>,
    /// Id of the decision behind the service; keys the tool name metadata.
    #[serde(rename = "x-ibm-ads-decision-id", default)]
    pub decision_id: Option<String>,
}

/// Reusable schema components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default)]
    pub schemas: BTreeMap<String, serde_json::Value>,
}

/// One declared operation, parsed from a path item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationObject {
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub request_body: Option<RequestBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaType {
    #[serde(default)]
    pub schema: Option<serde_json::Value>,
}

impl ServiceDescriptor {
    /// Name shown for the service, falling back to its id.
    pub fn display_name<'a>(&'a self, service_id: &'a str) -> &'a str {
        self.info
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(service_id)
    }

    /// Decision id used for metadata lookups, falling back to the service id.
    pub fn decision_id<'a>(&'a self, service_id: &'a str) -> &'a str {
        self.info
            .decision_id
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(service_id)
    }
}

impl OperationObject {
    /// The JSON request body schema, if declared.
    pub fn input_schema(&self) -> Option<&serde_json::Value> {
        let content = &self.request_body.as_ref()?.content;
        content
            .get("application/json")
            .or_else(|| content.values().next())?
            .schema
            .as_ref()
    }
}
