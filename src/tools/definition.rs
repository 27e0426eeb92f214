//! Candidate tool definitions and their schema fingerprints.

use crate::openapi::TranslatedOperation;
use serde::Serialize;
use serde_json::{json, Map, Value};
use sha3::{Digest, Sha3_256};

/// Object input schema of a tool: property name to property schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InputSchema {
    pub properties: Map<String, Value>,
    pub required: Vec<String>,
}

impl InputSchema {
    /// Read an already expanded object schema. Returns `None` for non-object schemas.
    pub fn from_schema(schema: &Value) -> Option<Self> {
        let obj = schema.as_object()?;
        let typed_object = obj.get("type").and_then(Value::as_str) == Some("object");
        let properties = match obj.get("properties") {
            Some(Value::Object(props)) => props.clone(),
            Some(_) => return None,
            None if typed_object => Map::new(),
            None => return None,
        };
        if obj.get("type").is_some() && !typed_object {
            return None;
        }

        let required = obj
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            properties,
            required,
        })
    }

    /// JSON Schema form sent to clients.
    pub fn to_json(&self) -> Value {
        let mut schema = json!({
            "type": "object",
            "properties": self.properties,
        });
        if !self.required.is_empty() {
            schema["required"] = json!(self.required);
        }
        schema
    }

    /// Hex SHA3-256 of the canonical JSON form.
    ///
    /// Object keys serialize in sorted order, so equal schemas hash equal
    /// regardless of declaration order.
    pub fn fingerprint(&self) -> String {
        let canonical = self.to_json().to_string();
        hex::encode(Sha3_256::digest(canonical.as_bytes()))
    }
}

/// Where a tool's calls are sent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToolOrigin {
    pub deployment_space: String,
    pub service_id: String,
    pub operation_id: String,
}

/// One tool as produced by a discovery pass.
///
/// Two definitions are the same tool when their names match, and
/// schema-equivalent when their fingerprints match.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub input_schema: InputSchema,
    pub fingerprint: String,
    pub origin: ToolOrigin,
}

impl ToolDefinition {
    pub fn new(name: String, operation: TranslatedOperation, origin: ToolOrigin) -> Self {
        let fingerprint = operation.input_schema.fingerprint();
        Self {
            name,
            title: operation.title,
            description: operation.description,
            input_schema: operation.input_schema,
            fingerprint,
            origin,
        }
    }
}
