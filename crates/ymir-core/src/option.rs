//! The middleware option model.
//!
//! Options attached to `use`, `auth`, `render`, `header`, `body` and
//! `response` directives form a small dynamically-typed tree:
//! strings, numbers, booleans, ordered mappings, ordered sequences, and
//! deferred global lookups such as `@env.PORT`.
//!
//! Mapping options use [`IndexMap`] so that key order observed in the
//! script is preserved through emission; deterministic input therefore
//! yields deterministic output.

use std::fmt;

use indexmap::IndexMap;

/// An ordered `name -> value` option mapping.
pub type OptionMap = IndexMap<String, OptionValue>;

/// A deferred global lookup, e.g. `@env.PORT`.
///
/// The emitters lower globals to target-specific expressions
/// (`process.env.PORT` for Express, `System.getenv("PORT")` for Spring).
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalVariable {
    /// Root name after `@` (today always `env`).
    pub name: String,
    /// Dotted member path after the root name.
    pub path: Vec<String>,
}

impl GlobalVariable {
    pub fn new(name: impl Into<String>, path: Vec<String>) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}

impl fmt::Display for GlobalVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        for part in &self.path {
            write!(f, ".{part}")?;
        }
        Ok(())
    }
}

/// A single option value.
///
/// **Variants:**
/// - `String` - quoted literals and bare type keywords used as values
/// - `Number` - numeric literals (stored as `f64`)
/// - `Bool` - boolean literals
/// - `Map` - nested `{ key: value, ... }` mappings, insertion-ordered
/// - `List` - `[ value, ... ]` sequences
/// - `Global` - deferred lookups such as `@env.SECRET`
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Number(f64),
    Bool(bool),
    Map(OptionMap),
    List(Vec<OptionValue>),
    Global(GlobalVariable),
}

impl OptionValue {
    /// Borrow the string payload, if this is a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract the numeric payload, if this is a number value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            OptionValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract the boolean payload, if this is a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the nested mapping, if this is a map value.
    pub fn as_map(&self) -> Option<&OptionMap> {
        match self {
            OptionValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow the sequence, if this is a list value.
    pub fn as_list(&self) -> Option<&[OptionValue]> {
        match self {
            OptionValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// Borrow the global lookup, if this is a global value.
    pub fn as_global(&self) -> Option<&GlobalVariable> {
        match self {
            OptionValue::Global(g) => Some(g),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::String(s) => write!(f, "\"{s}\""),
            OptionValue::Number(n) => write!(f, "{n}"),
            OptionValue::Bool(b) => write!(f, "{b}"),
            OptionValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            OptionValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            OptionValue::Global(global) => write!(f, "{global}"),
        }
    }
}

/// Shallow-merge `descendant` over `ancestor`, descendant keys winning.
///
/// Used for header/body schema inheritance: ancestor keys stay visible
/// unless shadowed by a descendant key. Ancestor keys keep their original
/// position; new descendant keys append in their own order.
pub fn merge_options(ancestor: &OptionMap, descendant: &OptionMap) -> OptionMap {
    let mut merged = ancestor.clone();
    for (key, value) in descendant {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, OptionValue)]) -> OptionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_accessors() {
        assert_eq!(OptionValue::String("x".into()).as_str(), Some("x"));
        assert_eq!(OptionValue::Number(4.0).as_number(), Some(4.0));
        assert_eq!(OptionValue::Bool(true).as_bool(), Some(true));
        assert_eq!(OptionValue::Bool(true).as_str(), None);
    }

    #[test]
    fn test_merge_descendant_wins() {
        let ancestor = map(&[
            ("token", OptionValue::String("string".into())),
            ("version", OptionValue::Number(1.0)),
        ]);
        let descendant = map(&[("version", OptionValue::Number(2.0))]);

        let merged = merge_options(&ancestor, &descendant);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged["version"], OptionValue::Number(2.0));
        assert_eq!(merged["token"], OptionValue::String("string".into()));
    }

    #[test]
    fn test_merge_preserves_order() {
        let ancestor = map(&[
            ("a", OptionValue::Number(1.0)),
            ("b", OptionValue::Number(2.0)),
        ]);
        let descendant = map(&[
            ("c", OptionValue::Number(3.0)),
            ("a", OptionValue::Number(9.0)),
        ]);

        let merged = merge_options(&ancestor, &descendant);
        let keys: Vec<_> = merged.keys().map(String::as_str).collect();
        // Shadowed keys keep the ancestor position; new keys append.
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(merged["a"], OptionValue::Number(9.0));
    }

    #[test]
    fn test_global_display() {
        let global = GlobalVariable::new("env", vec!["PORT".to_string()]);
        assert_eq!(global.to_string(), "@env.PORT");
    }
}
