use crate::error::{AppError, AppResult};
use serde_json::{Map, Value};

/// Check a submitted result document against a benchmark's JSON template.
///
/// The template expresses a minimum required shape: every key of the
/// template must exist in the document, and wherever the template value
/// is an object the document value must be an object containing the
/// nested required keys (checked recursively). Extra keys in the
/// document are always permitted.
pub fn validate_template(document: &Value, template: &Value) -> AppResult<()> {
    let template_map = template
        .as_object()
        .ok_or_else(|| AppError::Schema("benchmark template is not a JSON object".to_string()))?;
    let document_map = document
        .as_object()
        .ok_or_else(|| AppError::Schema("submitted document is not a JSON object".to_string()))?;

    check_object(document_map, template_map, "")
}

fn check_object(
    document: &Map<String, Value>,
    template: &Map<String, Value>,
    path: &str,
) -> AppResult<()> {
    for (key, template_value) in template {
        let qualified = if path.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", path, key)
        };

        let document_value = document.get(key).ok_or_else(|| {
            AppError::Validation(format!("missing required key '{}'", qualified))
        })?;

        if let Some(nested_template) = template_value.as_object() {
            let nested_document = document_value.as_object().ok_or_else(|| {
                AppError::Validation(format!("key '{}' must be an object", qualified))
            })?;
            check_object(nested_document, nested_template, &qualified)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_template() -> Value {
        json!({
            "start_datetime": "",
            "machine": {
                "cpu": "",
                "memory_gb": 0
            },
            "score": 0
        })
    }

    #[test]
    fn document_matching_template_passes() {
        let template = sample_template();
        assert!(validate_template(&template, &template).is_ok());
    }

    #[test]
    fn extra_keys_are_permitted() {
        let document = json!({
            "start_datetime": "2024-05-21T10:31:00",
            "machine": {
                "cpu": "EPYC 7763",
                "memory_gb": 512,
                "new_sub_key": 42
            },
            "score": 1234,
            "new_key": "new value",
            "another_new_key": { "nested": 2 }
        });
        assert!(validate_template(&document, &sample_template()).is_ok());
    }

    #[test]
    fn missing_top_level_key_fails() {
        let document = json!({
            "machine": { "cpu": "x", "memory_gb": 1 },
            "score": 1
        });
        let err = validate_template(&document, &sample_template()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn missing_nested_key_fails() {
        let document = json!({
            "start_datetime": "x",
            "machine": { "cpu": "x" },
            "score": 1
        });
        let err = validate_template(&document, &sample_template()).unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("machine.memory_gb")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn non_object_where_template_nests_fails() {
        let document = json!({
            "start_datetime": "x",
            "machine": [1, 2],
            "score": 1
        });
        let err = validate_template(&document, &sample_template()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn empty_document_against_nonempty_template_fails() {
        let err = validate_template(&json!({}), &sample_template()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn empty_template_accepts_any_object() {
        assert!(validate_template(&json!({ "anything": 1 }), &json!({})).is_ok());
        assert!(validate_template(&json!({}), &json!({})).is_ok());
    }

    #[test]
    fn non_object_document_is_a_schema_error() {
        for document in [json!(null), json!(42), json!([1, 2]), json!("text")] {
            let err = validate_template(&document, &sample_template()).unwrap_err();
            assert!(matches!(err, AppError::Schema(_)));
        }
    }

    #[test]
    fn non_object_template_is_a_schema_error() {
        let err = validate_template(&json!({}), &json!([])).unwrap_err();
        assert!(matches!(err, AppError::Schema(_)));
    }

    #[test]
    fn deeply_nested_required_keys_are_checked() {
        let template = json!({ "a": { "b": { "c": 0 } } });
        let ok = json!({ "a": { "b": { "c": 1, "d": 2 } } });
        let missing = json!({ "a": { "b": { "d": 2 } } });
        assert!(validate_template(&ok, &template).is_ok());
        assert!(validate_template(&missing, &template).is_err());
    }
}
