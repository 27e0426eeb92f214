//! Wire types returned by the decision runtime.

use crate::error::RuntimeError;
use serde::Deserialize;
use std::collections::HashMap;

/// Metadata key under which a deployment lists its decision service id.
pub const DECISION_SERVICE_ID_METADATA: &str = "decisionServiceId";

/// Prefix of the per-operation metadata entry that overrides a tool name.
pub const TOOL_NAME_OVERRIDE_PREFIX: &str = "mcpToolName.";

/// Metadata key holding the tool name override for `operation_id`.
///
/// The value stored under this key is used verbatim as the tool name.
pub fn tool_name_override_key(operation_id: &str) -> String {
    format!("{TOOL_NAME_OVERRIDE_PREFIX}{operation_id}")
}

/// One metadata value. Its name and kind are not needed.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataEntry {
    #[serde(default)]
    pub value: serde_json::Value,
}

impl MetadataEntry {
    /// Value as a non-empty string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str().filter(|v| !v.is_empty())
    }
}

/// Metadata of one deployment, keyed by metadata name.
pub type MetadataMap = HashMap<String, MetadataEntry>;

/// Incident body the runtime sends with a 200 status instead of a result.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Incident {
    #[serde(default)]
    incident_id: Option<String>,
    #[serde(default)]
    incident_category: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    stack_trace: Option<String>,
}

/// Turn an embedded `incident` object into an error.
pub fn check_incident(body: &serde_json::Value) -> Result<(), RuntimeError> {
    let Some(raw) = body.get("incident").filter(|v| v.is_object()) else {
        return Ok(());
    };
    let incident: Incident = serde_json::from_value(raw.clone())?;
    let message = incident
        .message
        .or_else(|| {
            incident
                .stack_trace
                .as_deref()
                .and_then(|s| s.lines().next())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "no details".into());
    Err(RuntimeError::Incident {
        id: incident.incident_id.unwrap_or_else(|| "unknown".into()),
        category: incident.incident_category.unwrap_or_else(|| "unknown".into()),
        message,
    })
}

/// Extract decision service ids from deployment metadata, first occurrence wins.
pub fn decision_service_ids(deployments: &[MetadataMap]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for meta in deployments {
        if let Some(id) = meta
            .get(DECISION_SERVICE_ID_METADATA)
            .and_then(MetadataEntry::as_str)
        {
            if !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
    }
    ids
}

/// Non-empty string values of a metadata map, keyed by metadata name.
pub fn string_values(metadata: &MetadataMap) -> HashMap<String, String> {
    metadata
        .iter()
        .filter_map(|(key, entry)| Some((key.clone(), entry.as_str()?.to_string())))
        .collect()
}
