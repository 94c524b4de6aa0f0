//! Deterministic fingerprint of an option mapping.
//!
//! Two body schemas that differ only in key order must collapse to the same
//! generated DTO, so the hash canonicalizes the mapping first: keys are
//! sorted recursively, the tree is rendered as compact JSON (no whitespace),
//! and the result is base64-encoded.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Map, Value};

use crate::option::{OptionMap, OptionValue};

/// Compute the canonical fingerprint of an option mapping.
///
/// Stable under key reordering: `hash({a:1,b:2}) == hash({b:2,a:1})`.
pub fn option_hash(options: &OptionMap) -> String {
    let canonical = canonical_map(options);
    let json = Value::Object(canonical).to_string();
    STANDARD.encode(json.as_bytes())
}

fn canonical_map(options: &OptionMap) -> Map<String, Value> {
    // serde_json's default Map is backed by a BTreeMap, so inserting in any
    // order yields sorted keys.
    let mut map = Map::new();
    for (key, value) in options {
        map.insert(key.clone(), canonical_value(value));
    }
    map
}

fn canonical_value(value: &OptionValue) -> Value {
    match value {
        OptionValue::String(s) => Value::String(s.clone()),
        OptionValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        OptionValue::Bool(b) => Value::Bool(*b),
        OptionValue::Map(m) => Value::Object(canonical_map(m)),
        OptionValue::List(items) => Value::Array(items.iter().map(canonical_value).collect()),
        OptionValue::Global(global) => Value::String(global.to_string()),
    }
}
