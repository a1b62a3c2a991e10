use serde_json::{Map, Value};

/// Truthiness of a stored field value.
///
/// `null`, `false`, numeric zero and the empty string are falsy. Arrays and
/// objects are always truthy, even when empty.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => match n.as_f64() {
            Some(f) => f != 0.0 && !f.is_nan(),
            None => true,
        },
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Shallow merge: every field of `patch` overwrites the same-named field of
/// `target`, everything else in `target` is kept.
pub fn merge_shallow(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}

pub fn type_name(value: &Value) -> &'static str {
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

    #[test]
    fn test_falsy_values() {
        assert!(!is_truthy(&json!(null)));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!(0.0)));
        assert!(!is_truthy(&json!("")));
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(-1)));
        assert!(is_truthy(&json!("0")));
        assert!(is_truthy(&json!([])));
        assert!(is_truthy(&json!({})));
    }

    #[test]
    fn test_merge_overwrites_and_preserves() {
        let mut target = json!({"a": 1, "b": 2}).as_object().cloned().unwrap();
        let patch = json!({"b": 3, "c": 4}).as_object().cloned().unwrap();

        merge_shallow(&mut target, patch);

        assert_eq!(Value::Object(target), json!({"a": 1, "b": 3, "c": 4}));
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut target = json!({"prefs": {"theme": "dark", "font": 12}})
            .as_object()
            .cloned()
            .unwrap();
        let patch = json!({"prefs": {"theme": "light"}}).as_object().cloned().unwrap();

        merge_shallow(&mut target, patch);

        assert_eq!(target["prefs"], json!({"theme": "light"}));
    }
}
