//! Route and router paths.
//!
//! A [`Path`] keeps the raw slash-separated form from the script plus the
//! optional alias and query parameter list. Path variables use the `:name`
//! form; segments may also contain `#` and `-` literals.

use std::fmt;

use crate::ident;
use crate::span::SourcePosition;

/// The type of a query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamType {
    Any,
    String,
    Int,
    Float,
    Bool,
    Date,
    DateTime,
    Time,
}

impl ParamType {
    /// Parse a type keyword as written in the script.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "any" => Some(ParamType::Any),
            "string" => Some(ParamType::String),
            "int" => Some(ParamType::Int),
            "float" => Some(ParamType::Float),
            "boolean" | "bool" => Some(ParamType::Bool),
            "date" => Some(ParamType::Date),
            "datetime" => Some(ParamType::DateTime),
            "time" => Some(ParamType::Time),
            _ => None,
        }
    }

    /// The keyword form used in scripts and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Any => "any",
            ParamType::String => "string",
            ParamType::Int => "int",
            ParamType::Float => "float",
            ParamType::Bool => "boolean",
            ParamType::Date => "date",
            ParamType::DateTime => "datetime",
            ParamType::Time => "time",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single `name=type` query parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParameter {
    pub name: String,
    pub ty: ParamType,
}

/// A route or router path.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Raw path text, beginning with `/`. Escapes are already resolved.
    pub raw: String,
    /// Alias given with `as`, sanitized to a valid identifier.
    pub alias: Option<String>,
    /// Query parameters declared after `?`.
    pub query: Vec<QueryParameter>,
    pub pos: SourcePosition,
}

impl Path {
    pub fn new(raw: impl Into<String>, pos: SourcePosition) -> Self {
        Self {
            raw: raw.into(),
            alias: None,
            query: Vec::new(),
            pos,
        }
    }

    /// The path's name: the alias if present, otherwise the
    /// alphanumerics-only form of the raw path.
    pub fn name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self
                .raw
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect(),
        }
    }

    /// The capitalized name used in generated method names.
    pub fn display_name(&self) -> String {
        ident::display_name(&self.name())
    }

    /// Non-empty path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.raw.split('/').filter(|s| !s.is_empty())
    }

    /// Names of path variables, in order. Both the `:name` form and the
    /// `{name<type>}` template form count.
    pub fn variables(&self) -> Vec<&str> {
        self.segments().filter_map(segment_variable).collect()
    }

    /// The raw path with variables rewritten as `{name}` (the Spring
    /// request-mapping form).
    pub fn with_braced_variables(&self) -> String {
        let segments: Vec<String> = self
            .raw
            .split('/')
            .map(|segment| match segment_variable(segment) {
                Some(name) => format!("{{{name}}}"),
                None => segment.to_string(),
            })
            .collect();
        segments.join("/")
    }

    /// The raw path with variables rewritten as `:name` (the Express
    /// routing form).
    pub fn with_colon_variables(&self) -> String {
        let segments: Vec<String> = self
            .raw
            .split('/')
            .map(|segment| match segment_variable(segment) {
                Some(name) => format!(":{name}"),
                None => segment.to_string(),
            })
            .collect();
        segments.join("/")
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// The variable name of a segment, if it declares one.
fn segment_variable(segment: &str) -> Option<&str> {
    if let Some(name) = segment.strip_prefix(':') {
        return Some(name);
    }
    let inner = segment.strip_prefix('{')?.strip_suffix('}')?;
    match inner.split_once('<') {
        Some((name, _type)) => Some(name),
        None => Some(inner),
    }
}

/// Join two path fragments with a single `/`, collapsing `//`.
pub fn join_paths(parent: &str, child: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let child = child.trim_start_matches('/');
    if child.is_empty() {
        if parent.is_empty() {
            "/".to_string()
        } else {
            parent.to_string()
        }
    } else {
        format!("{parent}/{child}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> Path {
        Path::new(raw, SourcePosition::unknown())
    }

    #[test]
    fn test_name_from_raw() {
        assert_eq!(path("/api").name(), "api");
        assert_eq!(path("/users/:id").name(), "usersid");
        assert_eq!(path("/").name(), "");
    }

    #[test]
    fn test_name_prefers_alias() {
        let mut p = path("/users/:id");
        p.alias = Some("UserById".to_string());
        assert_eq!(p.name(), "UserById");
        assert_eq!(p.display_name(), "UserById");
    }

    #[test]
    fn test_variables() {
        assert_eq!(path("/users/:id/posts/:post").variables(), vec!["id", "post"]);
        assert!(path("/users").variables().is_empty());
    }

    #[test]
    fn test_braced_variables() {
        assert_eq!(path("/users/:id").with_braced_variables(), "/users/{id}");
        assert_eq!(path("/plain").with_braced_variables(), "/plain");
    }

    #[test]
    fn test_template_variables() {
        let p = path("/items/{id<int>}");
        assert_eq!(p.variables(), vec!["id"]);
        assert_eq!(p.with_braced_variables(), "/items/{id}");
        assert_eq!(p.with_colon_variables(), "/items/:id");
    }

    #[test]
    fn test_join_paths_collapses_slashes() {
        assert_eq!(join_paths("/api/", "/users"), "/api/users");
        assert_eq!(join_paths("/api", "users"), "/api/users");
        assert_eq!(join_paths("", "/users"), "/users");
        assert_eq!(join_paths("/api", "/"), "/api");
        assert_eq!(join_paths("/", "/"), "/");
    }

    #[test]
    fn test_param_type_parse() {
        assert_eq!(ParamType::parse("datetime"), Some(ParamType::DateTime));
        assert_eq!(ParamType::parse("boolean"), Some(ParamType::Bool));
        assert_eq!(ParamType::parse("widget"), None);
    }
}
