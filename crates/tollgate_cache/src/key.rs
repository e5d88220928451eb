//! Deterministic cache key derivation.

use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};

/// Derive a cache key from a namespace and request parameters.
///
/// Parameters are ordered by name before hashing, so insertion order never
/// changes the key. The result is `"{namespace}:{sha256 hex}"`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use std::collections::HashMap;
/// use tollgate_cache::cache_key;
///
/// let mut params = HashMap::new();
/// params.insert("country".to_string(), json!("DE"));
/// params.insert("number".to_string(), json!("123456789"));
///
/// let key = cache_key("vat.verify", &params);
/// assert!(key.starts_with("vat.verify:"));
/// assert_eq!(key, cache_key("vat.verify", &params.clone()));
/// ```
pub fn cache_key(namespace: &str, params: &HashMap<String, JsonValue>) -> String {
    let sorted: BTreeMap<&String, &JsonValue> = params.iter().collect();

    let mut hasher = Sha256::new();
    hasher.update(namespace.as_bytes());
    for (name, value) in sorted {
        hasher.update([0u8]);
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(value.to_string().as_bytes());
    }
    format!("{}:{:x}", namespace, hasher.finalize())
}
