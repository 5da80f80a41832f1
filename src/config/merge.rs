//! Layer merge
//!
//! - Tables: merged key by key, recursively
//! - Arrays: replaced whole (so a file can shorten `token.command`)
//! - Scalars: later layer wins

use serde_json::Value;

/// Overlay `overlay` onto `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut merged), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let next = match merged.remove(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value,
                };
                merged.insert(key, next);
            }
            Value::Object(merged)
        }
        (_, overlay) => overlay,
    }
}

/// Fold layers lowest-precedence first.
pub fn merge_layers<I>(layers: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_table_merge() {
        let base = json!({"controller": {"url": "http://a:6820", "api_version": "v0.0.40"}});
        let overlay = json!({"controller": {"url": "http://b:6820"}});
        let result = deep_merge(base, overlay);
        assert_eq!(result["controller"]["url"], "http://b:6820");
        assert_eq!(result["controller"]["api_version"], "v0.0.40");
    }

    #[test]
    fn test_array_replaced() {
        let base = json!({"token": {"command": ["scontrol", "token"]}});
        let overlay = json!({"token": {"command": ["/opt/bin/get-jwt"]}});
        let result = deep_merge(base, overlay);
        assert_eq!(result["token"]["command"], json!(["/opt/bin/get-jwt"]));
    }

    #[test]
    fn test_new_keys_added() {
        let result = deep_merge(json!({"checks": {"common": true}}), json!({"checks": {"mail_domain": "example.edu"}}));
        assert_eq!(result["checks"]["common"], true);
        assert_eq!(result["checks"]["mail_domain"], "example.edu");
    }

    #[test]
    fn test_merge_layers_precedence() {
        let merged = merge_layers(vec![
            json!({"submit": {"tool": "sbatch"}}),
            json!({"submit": {"tool": "/usr/local/bin/sbatch"}}),
            json!({"submit": {"extra_flags": ""}}),
        ]);
        assert_eq!(merged["submit"]["tool"], "/usr/local/bin/sbatch");
        assert_eq!(merged["submit"]["extra_flags"], "");
    }

    #[test]
    fn test_merge_layers_empty() {
        assert_eq!(merge_layers(Vec::new()), Value::Null);
    }
}
