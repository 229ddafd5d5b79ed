//! JSON Schema generation for tool inputs.
//!
//! Tool argument structs derive `schemars::JsonSchema`; this turns them into
//! the flat draft-07 object schema MCP clients expect.

use crate::types::tool::ToolSchema;

/// Generate a tool input schema for `T`, inlining subschemas.
pub fn schema_for<T: schemars::JsonSchema>() -> ToolSchema {
    let settings = schemars::generate::SchemaSettings::draft07().with(|s| {
        s.inline_subschemas = true;
    });
    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    let value = serde_json::to_value(&schema).unwrap_or_default();
    ToolSchema::from_value(value)
}

/// Schema for round counters: non-negative JSON numbers.
///
/// Rounds travel as f64 on the wire; schemars would otherwise emit
/// `"format": "double"`, which some clients reject.
pub fn round_count_schema(_gen: &mut schemars::SchemaGenerator) -> schemars::Schema {
    schemars::json_schema!({
        "type": "number",
        "minimum": 0
    })
}
