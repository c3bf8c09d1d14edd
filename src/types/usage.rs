use serde_json::{Map, Value};

/// Token accounting reported by a completions endpoint.
///
/// Kept as the raw JSON object since providers disagree on the field set.
pub type Usage = Map<String, Value>;

/// Read an integer token counter such as `total_tokens` from a usage object.
pub fn token_count(usage: &Usage, field: &str) -> Option<u64> {
    usage.get(field).and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_counters() {
        let usage = json!({"prompt_tokens": 3, "total_tokens": 5, "cost": 0.1});
        let usage = usage.as_object().unwrap();
        assert_eq!(token_count(usage, "total_tokens"), Some(5));
        assert_eq!(token_count(usage, "cost"), None);
        assert_eq!(token_count(usage, "missing"), None);
    }
}
