use serde_json::{Map, Value as JsonValue};

/// Shallow merge: keys of `overlay` replace keys of `base`, like a JS object
/// spread `{...base, ...overlay}`.
pub fn merge_objects(mut base: Map<String, JsonValue>, overlay: Map<String, JsonValue>) -> Map<String, JsonValue> {
    for (key, value) in overlay {
        base.insert(key, value);
    }
    base
}

/// Short description of a value's JSON type, for error messages.
pub fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
