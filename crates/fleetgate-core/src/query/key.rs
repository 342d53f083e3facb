// ── Cache keys ──

use std::fmt;

use serde::Serialize;

use crate::error::CoreError;

/// Identity of one cached query: endpoint name plus canonical arguments.
///
/// Arguments are serialized to JSON with object keys sorted, so two
/// structurally equal argument values always map to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    endpoint: String,
    args: String,
}

impl CacheKey {
    pub fn new(endpoint: impl Into<String>, args: &impl Serialize) -> Result<Self, CoreError> {
        let endpoint = endpoint.into();
        let value = serde_json::to_value(args).map_err(|e| CoreError::InvalidArgument {
            endpoint: endpoint.clone(),
            message: e.to_string(),
        })?;
        Ok(Self {
            args: canonical(&value),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn args(&self) -> &str {
        &self.args
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.endpoint, self.args)
    }
}

/// Compact JSON with object keys in sorted order at every depth.
fn canonical(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let body: Vec<String> = entries
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), canonical(v)))
                .collect();
            format!("{{{}}}", body.join(","))
        }
        Value::Array(items) => {
            let body: Vec<String> = items.iter().map(canonical).collect();
            format!("[{}]", body.join(","))
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn structurally_equal_args_share_a_key() {
        let a = CacheKey::new("cars.list", &json!({ "page": 1, "status": "free" })).unwrap();
        let mut map = HashMap::new();
        map.insert("status", json!("free"));
        map.insert("page", json!(1));
        let b = CacheKey::new("cars.list", &map).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.args(), r#"{"page":1,"status":"free"}"#);
    }

    #[test]
    fn endpoint_is_part_of_the_key() {
        let a = CacheKey::new("cars.list", &()).unwrap();
        let b = CacheKey::new("drivers.list", &()).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "cars.list(null)");
    }

    #[test]
    fn unserializable_args_are_rejected() {
        let mut bad = HashMap::new();
        bad.insert((1, 2), "tuple keys are not JSON");
        let err = CacheKey::new("cars.list", &bad).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
    }
}
