//! Validate tool call arguments against JSON Schema before execution.

use serde_json::Value;
use thiserror::Error;

/// First schema violation found in a tool call's arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaViolation {
    #[error("expected object arguments, got {0}")]
    NotAnObject(&'static str),

    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("field '{field}' expected type '{expected}', got {actual}")]
    WrongType {
        field: String,
        expected: String,
        actual: &'static str,
    },
}

/// Validate tool arguments against a JSON Schema.
///
/// Top-level only: schema type, required field presence, and declared
/// property types. Fields the schema does not declare are accepted.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<(), SchemaViolation> {
    if schema.get("type").and_then(Value::as_str) == Some("object") && !args.is_object() {
        return Err(SchemaViolation::NotAnObject(json_type_name(args)));
    }
    let Some(obj) = args.as_object() else {
        return Ok(());
    };

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    for name in required {
        if !obj.contains_key(name) {
            return Err(SchemaViolation::MissingField(name.to_string()));
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (key, value) in obj {
            let expected = properties
                .get(key)
                .and_then(|prop| prop.get("type"))
                .and_then(Value::as_str);
            if let Some(expected) = expected {
                if !value_matches_type(value, expected) {
                    return Err(SchemaViolation::WrongType {
                        field: key.clone(),
                        expected: expected.to_string(),
                        actual: json_type_name(value),
                    });
                }
            }
        }
    }

    Ok(())
}

fn value_matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn code_schema() -> Value {
        json!({
            "type": "object",
            "properties": { "python_code": { "type": "string" } },
            "required": ["python_code"],
        })
    }

    #[test]
    fn accepts_required_string_field() {
        let args = json!({ "python_code": "df.head()" });
        assert_eq!(validate_arguments(&args, &code_schema()), Ok(()));
    }

    #[test]
    fn rejects_array_payload() {
        let args = json!(["df.head()"]);
        assert_eq!(
            validate_arguments(&args, &code_schema()),
            Err(SchemaViolation::NotAnObject("array"))
        );
    }

    #[test]
    fn rejects_missing_required_field() {
        let args = json!({ "code": "df.head()" });
        assert_eq!(
            validate_arguments(&args, &code_schema()),
            Err(SchemaViolation::MissingField("python_code".into()))
        );
    }

    #[test]
    fn rejects_number_where_string_expected() {
        let err = validate_arguments(&json!({ "python_code": 42 }), &code_schema()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 'python_code' expected type 'string', got number"
        );
    }

    #[test]
    fn accepts_extra_fields_not_in_schema_properties() {
        let args = json!({ "python_code": "1", "timeout": 5 });
        assert!(validate_arguments(&args, &code_schema()).is_ok());
    }

    #[test]
    fn accepts_anything_against_empty_schema() {
        assert!(validate_arguments(&Value::Null, &json!({})).is_ok());
    }
}
