//! Recovery of a JSON object embedded in free-form model output.

use serde_json::{Map, Value};

#[derive(Debug)]
pub enum ParseError {
    /// The text contains no `{ ... }` region.
    NoJson,
    /// A region was found but it is not a valid JSON object.
    Malformed(String),
}

/// The substring from the first `{` to the last `}`, inclusive.
#[must_use]
pub fn locate_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse the outermost `{ ... }` region of `text` as a JSON object.
///
/// Prose, markdown fences and trailing commentary around the object are
/// ignored.
///
/// # Errors
///
/// Returns [`ParseError::NoJson`] when no braces are present, or
/// [`ParseError::Malformed`] when the region does not decode to an object.
pub fn parse_lenient(text: &str) -> Result<Map<String, Value>, ParseError> {
    let region = locate_json_object(text).ok_or(ParseError::NoJson)?;
    match serde_json::from_str::<Value>(region) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ParseError::Malformed(format!(
            "expected a JSON object, found {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(ParseError::Malformed(e.to_string())),
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

    #[test]
    fn finds_object_after_leading_prose() {
        let text = "Sure! Here is the data you asked for:\n{\"profile_views\": 1200}";
        let map = parse_lenient(text).unwrap();
        assert_eq!(map.get("profile_views"), Some(&Value::from(1200)));
    }

    #[test]
    fn strips_markdown_fences() {
        let text = "```json\n{\"age_ranges\": []}\n```";
        let map = parse_lenient(text).unwrap();
        assert_eq!(map.get("age_ranges"), Some(&Value::Array(vec![])));
    }

    #[test]
    fn spans_nested_objects() {
        let text = r#"{"gender": {"male": "40%"}, "x": 1} trailing"#;
        let map = parse_lenient(text).unwrap();
        assert!(map.get("gender").is_some_and(Value::is_object));
    }

    #[test]
    fn no_braces_is_no_json() {
        assert!(matches!(
            parse_lenient("I could not read this image."),
            Err(ParseError::NoJson)
        ));
    }

    #[test]
    fn closing_brace_before_opening_is_no_json() {
        assert!(matches!(parse_lenient("} oops {"), Err(ParseError::NoJson)));
    }

    #[test]
    fn two_separate_objects_is_malformed() {
        let text = r#"{"a": 1} and also {"b": 2}"#;
        assert!(matches!(parse_lenient(text), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn truncated_object_is_malformed() {
        let text = r#"{"search_queries": [{"term": "x"}"#;
        // The last '}' closes the inner object, leaving the outer unterminated.
        assert!(matches!(parse_lenient(text), Err(ParseError::Malformed(_))));
    }
}
