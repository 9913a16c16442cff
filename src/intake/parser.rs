use serde_json::{Map, Value};

use super::IntakeError;
use crate::models::SubmissionFields;

/// Remove a surrounding Markdown code fence and optional `json` tag.
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let inner = trimmed.trim_matches('`');
    let inner = match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &inner[4..],
        _ => inner,
    };
    inner.trim()
}

/// Parse the model reply into exactly the submission field keys.
///
/// Missing keys and nulls become `""`; numbers and booleans are rendered
/// as text; extra keys are dropped.
pub fn parse_extraction_response(response: &str) -> Result<Map<String, Value>, IntakeError> {
    let json = strip_code_fences(response);
    let parsed: Value = serde_json::from_str(json)
        .map_err(|e| IntakeError::MalformedResponse(e.to_string()))?;
    let Value::Object(object) = parsed else {
        return Err(IntakeError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    };

    let mut fields = Map::new();
    for name in SubmissionFields::NAMES {
        let value = match object.get(*name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        fields.insert(name.to_string(), Value::String(value));
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tagged_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```JSON {}```"), "{}");
        assert_eq!(strip_code_fences("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fences("  {}  "), "{}");
    }

    #[test]
    fn normalizes_values_and_fills_missing_keys() {
        let fields = parse_extraction_response(
            r#"```json
            {"insured_name": "Blue Fin LLC", "square_feet": 12000, "mortgagee": null,
             "sprinkler_percent": true, "premium": "extra"}
            ```"#,
        )
        .unwrap();
        assert_eq!(fields.len(), 32);
        assert_eq!(fields["insured_name"], "Blue Fin LLC");
        assert_eq!(fields["square_feet"], "12000");
        assert_eq!(fields["mortgagee"], "");
        assert_eq!(fields["sprinkler_percent"], "true");
        assert_eq!(fields["notes"], "");
        assert!(!fields.contains_key("premium"));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(parse_extraction_response("[1,2]").is_err());
        assert!(parse_extraction_response("not json").is_err());
    }
}
