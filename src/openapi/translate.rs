//! Turn one service descriptor into per-operation tool material.

use crate::error::TranslateError;
use crate::openapi::descriptor::{OperationObject, ServiceDescriptor, OPERATION_METHODS};
use crate::openapi::expand::expand_schema;
use crate::tools::InputSchema;
use serde_json::Value;

/// A declared operation ready to be named and registered.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedOperation {
    pub operation_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub input_schema: InputSchema,
}

/// An operation left out of the translation.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedOperation {
    /// `"<method> <path>"` of the declaration.
    pub location: String,
    pub reason: TranslateError,
}

/// A reference cycle cut while expanding an operation's input schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaCycle {
    pub operation_id: String,
    pub reference: String,
}

/// Result of translating one descriptor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Translation {
    pub operations: Vec<TranslatedOperation>,
    pub skipped: Vec<SkippedOperation>,
    pub cycles: Vec<SchemaCycle>,
}

/// Translate every declared operation; malformed ones are skipped, not fatal.
pub fn translate_descriptor(descriptor: &ServiceDescriptor) -> Translation {
    let mut translation = Translation::default();

    for (path, item) in &descriptor.paths {
        let Some(item) = item.as_object() else {
            translation.skipped.push(SkippedOperation {
                location: path.clone(),
                reason: TranslateError::Malformed("path item is not an object".into()),
            });
            continue;
        };

        for method in OPERATION_METHODS {
            let Some(raw) = item.get(*method) else {
                continue;
            };
            match translate_operation(descriptor, raw) {
                Ok((operation, cycles)) => {
                    translation
                        .cycles
                        .extend(cycles.into_iter().map(|reference| SchemaCycle {
                            operation_id: operation.operation_id.clone(),
                            reference,
                        }));
                    translation.operations.push(operation);
                }
                Err(reason) => translation.skipped.push(SkippedOperation {
                    location: format!("{} {}", method.to_uppercase(), path),
                    reason,
                }),
            }
        }
    }

    translation
}

fn translate_operation(
    descriptor: &ServiceDescriptor,
    raw: &Value,
) -> Result<(TranslatedOperation, Vec<String>), TranslateError> {
    let operation: OperationObject = serde_json::from_value(raw.clone())
        .map_err(|e| TranslateError::Malformed(e.to_string()))?;

    let operation_id = operation
        .operation_id
        .clone()
        .filter(|id| !id.trim().is_empty())
        .ok_or(TranslateError::MissingOperationId)?;

    let schema = operation
        .input_schema()
        .ok_or_else(|| TranslateError::MissingRequestBody(operation_id.clone()))?;

    let expansion = expand_schema(schema, &descriptor.components.schemas)?;
    let input_schema = InputSchema::from_schema(&expansion.schema)
        .ok_or_else(|| TranslateError::NotAnObject(operation_id.clone()))?;

    Ok((
        TranslatedOperation {
            operation_id,
            title: operation.summary,
            description: operation.description,
            input_schema,
        },
        expansion.cycles,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(value: Value) -> ServiceDescriptor {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn translates_operation_with_referenced_body() {
        let desc = descriptor(json!({
            "info": {"title": "Loan Approval"},
            "paths": {
                "/approval/execute": {
                    "post": {
                        "operationId": "approval",
                        "summary": "Approve a loan",
                        "description": "Execute approval",
                        "requestBody": {
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/approvalInput"}
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "approvalInput": {
                        "type": "object",
                        "properties": {
                            "loan": {"$ref": "#/components/schemas/Loan"}
                        },
                        "required": ["loan"]
                    },
                    "Loan": {"type": "object", "properties": {"amount": {"type": "integer"}}}
                }
            }
        }));

        let out = translate_descriptor(&desc);
        assert!(out.skipped.is_empty());
        assert_eq!(out.operations.len(), 1);
        let op = &out.operations[0];
        assert_eq!(op.operation_id, "approval");
        assert_eq!(op.title.as_deref(), Some("Approve a loan"));
        assert_eq!(op.description.as_deref(), Some("Execute approval"));
        assert_eq!(op.input_schema.required, vec!["loan".to_string()]);
        assert_eq!(
            op.input_schema.properties["loan"]["properties"]["amount"]["type"],
            "integer"
        );
    }

    #[test]
    fn malformed_operations_are_skipped_and_siblings_kept() {
        let body = json!({
            "content": {"application/json": {"schema": {
                "type": "object",
                "properties": {"x": {"type": "string"}}
            }}}
        });
        let desc = descriptor(json!({
            "paths": {
                "/a": {"post": {"operationId": "good", "requestBody": body}},
                "/b": {"post": {"summary": "no id", "requestBody": body}},
                "/c": {"post": {"operationId": "noBody"}},
                "/d": {"post": {"operationId": "badRef", "requestBody": {
                    "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Nope"}}}
                }}},
                "/e": {"post": {"operationId": "scalar", "requestBody": {
                    "content": {"application/json": {"schema": {"type": "string"}}}
                }}},
                "/f": "not an object",
                "/g": {"post": {"operationId": 42}}
            }
        }));

        let out = translate_descriptor(&desc);
        let ids: Vec<_> = out.operations.iter().map(|o| o.operation_id.as_str()).collect();
        assert_eq!(ids, vec!["good"]);
        assert_eq!(out.skipped.len(), 6);
        assert!(out
            .skipped
            .iter()
            .any(|s| s.location == "POST /b" && s.reason == TranslateError::MissingOperationId));
        assert!(out.skipped.iter().any(|s| s.location == "POST /c"
            && s.reason == TranslateError::MissingRequestBody("noBody".into())));
        assert!(out.skipped.iter().any(|s| s.location == "POST /e"
            && s.reason == TranslateError::NotAnObject("scalar".into())));
        assert!(out
            .skipped
            .iter()
            .any(|s| s.location == "POST /g" && matches!(s.reason, TranslateError::Malformed(_))));
    }

    #[test]
    fn translation_with_skipped_operations_can_be_cloned() {
        let desc = descriptor(json!({
            "paths": {"/c": {"post": {"operationId": "noBody"}}}
        }));
        let out = translate_descriptor(&desc);
        let copy = out.clone();
        assert_eq!(copy, out);
        assert_eq!(
            copy.skipped[0].reason,
            TranslateError::MissingRequestBody("noBody".into())
        );
    }

    #[test]
    fn reports_cycles_without_failing() {
        let desc = descriptor(json!({
            "paths": {
                "/tree": {"post": {
                    "operationId": "tree",
                    "requestBody": {"content": {"application/json": {
                        "schema": {"$ref": "#/components/schemas/Tree"}
                    }}}
                }}
            },
            "components": {"schemas": {
                "Tree": {"type": "object", "properties": {
                    "children": {"type": "array", "items": {"$ref": "#/components/schemas/Tree"}}
                }}
            }}
        }));

        let out = translate_descriptor(&desc);
        assert_eq!(out.operations.len(), 1);
        assert_eq!(
            out.cycles,
            vec![SchemaCycle {
                operation_id: "tree".into(),
                reference: "#/components/schemas/Tree".into()
            }]
        );
        assert_eq!(
            out.operations[0].input_schema.properties["children"]["items"],
            json!({})
        );
    }
}
