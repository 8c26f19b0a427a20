use serde_json::Value;

/// Name a value's type the way YAML documents talk about it.
///
/// Used in error messages so they read in the vocabulary of the input
/// format rather than serde's.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}
