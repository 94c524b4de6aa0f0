//! Error and diagnostic system for the Ymir parser.
//!
//! This module provides an error handling system with:
//! - Error codes for documentation and searchability
//! - Multiple labeled spans for rich error context
//! - Severity levels
//! - Diagnostic collector for accumulating multiple errors
//!
//! # Overview
//!
//! The error system is built around the [`Diagnostic`] type, which
//! represents a single error or warning with optional error code, labeled
//! source locations, help text, and the owning file. Multiple diagnostics
//! are wrapped in [`ParseError`] for returning from the parsing lifecycle.
//!
//! # Example
//!
//! ```
//! # use ymir_parser::error::{Diagnostic, ErrorCode};
//! # use ymir_core::Span;
//!
//! let span = Span::new(100..120);
//! let original_span = Span::new(50..70);
//!
//! let diag = Diagnostic::error("auth block `apiKey` is defined multiple times")
//!     .with_code(ErrorCode::E200)
//!     .with_label(span, "duplicate definition")
//!     .with_secondary_label(original_span, "first defined here")
//!     .with_help("rename one of the blocks");
//! ```

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod parse_error;
mod severity;

pub use collector::DiagnosticCollector;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use parse_error::ParseError;
pub use severity::Severity;
