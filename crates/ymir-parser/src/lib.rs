//! # Ymir Parser
//!
//! Frontend for the Ymir REST DSL. This crate provides the pipeline from
//! script text to the semantic model defined in [`ymir_core`]:
//!
//! 1. **Tokenize** - convert source text to tokens (error-recovering;
//!    comments collected out-of-band)
//! 2. **Parse** - recursive descent over the token stream, resolving
//!    `include` directives through a [`FileProvider`]
//! 3. **Validate** - resolve authenticate clauses against the project's
//!    auth blocks
//! 4. **Policy** - return the AST or the accumulated diagnostics
//!
//! ## Usage
//!
//! ```
//! use ymir_parser::{ParsePolicy, parse_source};
//!
//! let source = r#"
//!     target JavaScript_ExpressJS;
//!     router /api {
//!         GET /hello?name=string as Hello;
//!     }
//! "#;
//!
//! let project = parse_source(source, ParsePolicy::CancelOnFirstError).unwrap();
//! assert_eq!(project.root.routers[0].routes.len(), 1);
//! ```

pub mod error;

mod lexer;
mod parser;
mod source;
mod span;
mod tokens;
mod validate;

pub use lexer::{LexOutput, tokenize};
pub use parser::{Compilation, ParsePolicy, parse_project};
pub use source::{FileProvider, MemoryFileProvider, SourceSet};
pub use span::LineIndex;
pub use tokens::{PositionedToken, Token};

use std::path::Path;

use ymir_core::router::Project;

use error::ParseError;

/// Display path used for in-memory sources.
pub const MEMORY_FILE: &str = "<memory>";

/// Parse a single in-memory script.
///
/// Includes resolve against an empty provider and therefore fail; use
/// [`parse_project`] with a real [`FileProvider`] for multi-file scripts.
pub fn parse_source(source: &str, policy: ParsePolicy) -> Result<Project, ParseError> {
    let mut provider = MemoryFileProvider::new();
    provider.insert(MEMORY_FILE, source);
    parse_project(Path::new(MEMORY_FILE), &provider, policy).into_result()
}
