//! Prompt generation
//!
//! Renders the element registry as the markdown instruction block handed
//! to the upstream text generator, so it knows which markers exist, what
//! fields they take, and what a well-formed payload looks like.

use serde_json::Value;

use crate::element::ElementRegistry;

const HEADER: &str = "## Display Elements\n\n\
Output these markers to render rich UI components. Format: `@name{...json...}`\n\
Place each marker on its own line within your response.\n\n";

/// Generate the instruction block for every registered element.
#[must_use]
pub fn generate_element_prompt<D>(registry: &ElementRegistry<D>) -> String {
    let sections: Vec<String> = registry
        .iter()
        .map(|def| {
            let fields = describe_schema_fields(def.input_schema());
            let fields_section = if fields.is_empty() {
                String::new()
            } else {
                format!("\n**Fields:**\n{}\n", fields.join("\n"))
            };

            let example = def.example().map_or_else(
                || schema_example(def.input_schema()),
                |e| Value::Object(e.clone()),
            );
            let example_json = example.to_string();

            format!(
                "### {name}\n\n{description}\n\n**Format:** `@{name}{{...}}`\n{fields_section}\n**Example:** `@{name}{example_json}`",
                name = def.name(),
                description = def.description(),
            )
        })
        .collect();

    format!("{HEADER}{}", sections.join("\n\n"))
}

/// One bullet per schema property, with description and `(optional)`
/// suffix for properties outside the `required` list.
fn describe_schema_fields(schema: &Value) -> Vec<String> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };

    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|r| r.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(key, field)| {
            let desc = field
                .get("description")
                .and_then(Value::as_str)
                .map(|d| format!(": {d}"))
                .unwrap_or_default();
            let suffix = if required.contains(&key.as_str()) {
                ""
            } else {
                " (optional)"
            };
            format!("  - `{key}`{desc}{suffix}")
        })
        .collect()
}

/// Synthesize an example value from a schema document.
fn schema_example(schema: &Value) -> Value {
    if let Some(variants) = schema.get("enum").and_then(Value::as_array) {
        return variants.first().cloned().unwrap_or(Value::String("...".to_string()));
    }

    match schema.get("type").and_then(Value::as_str) {
        Some("string") => Value::String("example".to_string()),
        Some("number" | "integer") => Value::from(0),
        Some("boolean") => Value::Bool(true),
        Some("array") => {
            let inner = schema.get("items").map_or(Value::String("...".to_string()), schema_example);
            Value::Array(vec![inner])
        }
        Some("object") => {
            let properties = schema.get("properties").and_then(Value::as_object);
            let obj = properties
                .map(|props| {
                    props
                        .iter()
                        .map(|(k, v)| (k.clone(), schema_example(v)))
                        .collect()
                })
                .unwrap_or_default();
            Value::Object(obj)
        }
        _ => Value::String("...".to_string()),
    }
}
