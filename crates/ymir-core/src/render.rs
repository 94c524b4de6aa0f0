//! Frontend rendering directives.

use std::fmt;

use crate::option::OptionMap;
use crate::span::SourcePosition;

/// Which frontend template a route renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    List,
    Table,
    Detail,
    Form,
}

impl RenderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderKind::List => "list",
            RenderKind::Table => "table",
            RenderKind::Detail => "detail",
            RenderKind::Form => "form",
        }
    }
}

impl fmt::Display for RenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A `render` directive attached to a route.
#[derive(Debug, Clone)]
pub struct RenderBlock {
    pub kind: RenderKind,
    pub options: OptionMap,
    pub pos: SourcePosition,
}

impl RenderBlock {
    pub fn new(kind: RenderKind, pos: SourcePosition) -> Self {
        Self {
            kind,
            options: OptionMap::new(),
            pos,
        }
    }

    /// Aliases of sibling routes this page integrates (per-row buttons on
    /// tables, action links on detail pages).
    pub fn integrated_aliases(&self) -> Vec<String> {
        self.options
            .get("integrate")
            .and_then(|v| v.as_list())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
