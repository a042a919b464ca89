//! Embedded JSON Schema for toolchain module files.
//!
//! Module files are validated before deserialization so authoring mistakes
//! surface with schema paths instead of serde's first-error message.

use jsonschema::JSONSchema;
use serde_json::Value;
use std::sync::OnceLock;

const MODULE_SCHEMA: &str = include_str!("../../schema/toolchain_module.schema.json");

fn compiled_module_schema() -> Result<&'static JSONSchema, String> {
    static COMPILED: OnceLock<Result<JSONSchema, String>> = OnceLock::new();
    COMPILED
        .get_or_init(|| {
            let raw: Value = serde_json::from_str(MODULE_SCHEMA)
                .map_err(|err| format!("parsing module schema: {err}"))?;
            JSONSchema::compile(&raw).map_err(|err| format!("compiling module schema: {err}"))
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Validate a parsed module document, returning all violations joined by
/// newlines on failure.
pub(crate) fn validate_module_value(value: &Value) -> Result<(), String> {
    let schema = compiled_module_schema()?;
    if let Err(errors) = schema.validate(value) {
        let details = errors
            .map(|err| {
                let location = err.instance_path.to_string();
                if location.is_empty() {
                    err.to_string()
                } else {
                    format!("{location}: {err}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        return Err(format!("failed schema validation:\n{details}"));
    }
    Ok(())
}
