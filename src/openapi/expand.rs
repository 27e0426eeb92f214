//! Inline `$ref` schema references against a component table.

use crate::error::TranslateError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const COMPONENT_PREFIX: &str = "#/components/schemas/";

/// A self-contained schema plus the references that had to be cut.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion {
    pub schema: Value,
    /// References that pointed back into their own expansion.
    pub cycles: Vec<String>,
}

/// Resolve every `$ref` in `schema` transitively.
///
/// A reference reached again while it is still being expanded is replaced by
/// an empty (permissive) schema and recorded in [`Expansion::cycles`].
pub fn expand_schema(
    schema: &Value,
    components: &BTreeMap<String, Value>,
) -> Result<Expansion, TranslateError> {
    let mut expander = Expander {
        components,
        stack: Vec::new(),
        cycles: Vec::new(),
    };
    let schema = expander.expand(schema)?;
    Ok(Expansion {
        schema,
        cycles: expander.cycles,
    })
}

struct Expander<'a> {
    components: &'a BTreeMap<String, Value>,
    stack: Vec<&'a str>,
    cycles: Vec<String>,
}

impl<'a> Expander<'a> {
    fn expand(&mut self, value: &Value) -> Result<Value, TranslateError> {
        match value {
            Value::Object(map) => match map.get("$ref") {
                Some(Value::String(reference)) => self.resolve(reference, map),
                _ => {
                    let mut out = Map::with_capacity(map.len());
                    for (key, child) in map {
                        out.insert(key.clone(), self.expand(child)?);
                    }
                    Ok(Value::Object(out))
                }
            },
            Value::Array(items) => items
                .iter()
                .map(|item| self.expand(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    fn resolve(
        &mut self,
        reference: &str,
        siblings: &Map<String, Value>,
    ) -> Result<Value, TranslateError> {
        let components = self.components;
        let (name, target) = reference
            .strip_prefix(COMPONENT_PREFIX)
            .and_then(|name| components.get_key_value(name))
            .ok_or_else(|| TranslateError::UnresolvedReference(reference.to_string()))?;

        if self.stack.contains(&name.as_str()) {
            self.cycles.push(reference.to_string());
            return Ok(Value::Object(Map::new()));
        }

        self.stack.push(name.as_str());
        let resolved = self.expand(target);
        self.stack.pop();
        let mut resolved = resolved?;

        // Keys next to the reference (description, nullable...) override the target.
        if let Value::Object(out) = &mut resolved {
            for (key, child) in siblings.iter().filter(|(k, _)| k.as_str() != "$ref") {
                let child = self.expand(child)?;
                out.insert(key.clone(), child);
            }
        }
        Ok(resolved)
    }
}
