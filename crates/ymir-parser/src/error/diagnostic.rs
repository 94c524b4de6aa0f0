//! The core diagnostic type for the Ymir error system.
//!
//! A [`Diagnostic`] represents a single error or warning with optional
//! error code, multiple labeled source spans, and help text. Because the
//! parser resolves `include` directives across files, every diagnostic
//! also names the file its spans refer to.

use std::fmt;

use ymir_core::Span;

use crate::error::{ErrorCode, Label, Severity};

/// A rich diagnostic message with source location information.
///
/// # Example
///
/// ```
/// # use ymir_parser::error::{Diagnostic, ErrorCode};
/// # use ymir_core::Span;
///
/// let span = Span::new(0..10);
/// let diag = Diagnostic::error("unknown auth block `apiKey`")
///     .with_code(ErrorCode::E206)
///     .with_label(span, "not defined")
///     .with_help("declare it with `auth Bearer as apiKey (...)`")
///     .in_file("main.ymr");
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
    file: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Get the severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Get the error code, if any.
    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    /// Get the primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get all labels attached to this diagnostic.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Get the help text, if any.
    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Display path of the file the labels refer to, if known.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// The primary span, if a primary label was attached.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|l| l.is_primary())
            .map(|l| l.span())
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Name the file the labels refer to.
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
            file: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E100]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::error("test error");

        assert!(diag.severity().is_error());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
        assert!(diag.file().is_none());
    }

    #[test]
    fn test_diagnostic_builder_chain() {
        let diag = Diagnostic::error("auth block `key` is defined multiple times")
            .with_code(ErrorCode::E200)
            .with_label(Span::new(100..120), "duplicate definition")
            .with_secondary_label(Span::new(50..70), "first defined here")
            .with_help("rename one of the blocks")
            .in_file("main.ymr");

        assert_eq!(diag.code(), Some(ErrorCode::E200));
        assert_eq!(diag.labels().len(), 2);
        assert!(diag.labels()[0].is_primary());
        assert!(diag.labels()[1].is_secondary());
        assert_eq!(diag.help(), Some("rename one of the blocks"));
        assert_eq!(diag.file(), Some("main.ymr"));
        assert_eq!(diag.primary_span(), Some(Span::new(100..120)));
    }

    #[test]
    fn test_diagnostic_display_with_code() {
        let diag = Diagnostic::error("unexpected token").with_code(ErrorCode::E100);
        assert_eq!(diag.to_string(), "error[E100]: unexpected token");
    }

    #[test]
    fn test_diagnostic_display_without_code() {
        let diag = Diagnostic::warning("unused alias");
        assert_eq!(diag.to_string(), "warning: unused alias");
    }
}
