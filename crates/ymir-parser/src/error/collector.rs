//! Collector for accumulating diagnostics during a compile.
//!
//! The [`DiagnosticCollector`] is shared across lexing, parsing, include
//! resolution, and validation so that every phase reports into one sink
//! instead of failing on the first error encountered.

use crate::error::{Diagnostic, Severity};

/// A sink for accumulating diagnostics during a compile.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
        self.diagnostics.push(diagnostic);
    }

    /// Number of errors recorded so far.
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Number of warnings recorded so far.
    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    /// `true` if any error was recorded.
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// The diagnostics recorded so far, in insertion order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Finish collection and return the recorded diagnostics.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_counts() {
        let mut collector = DiagnosticCollector::new();
        assert!(!collector.has_errors());

        collector.emit(Diagnostic::error("error 1"));
        collector.emit(Diagnostic::warning("warning 1"));
        collector.emit(Diagnostic::error("error 2"));

        assert!(collector.has_errors());
        assert_eq!(collector.error_count(), 2);
        assert_eq!(collector.warning_count(), 1);
        assert_eq!(collector.diagnostics().len(), 3);
    }

    #[test]
    fn test_collector_preserves_order() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::error("first"));
        collector.emit(Diagnostic::error("second"));

        let diags = collector.finish();
        assert_eq!(diags[0].message(), "first");
        assert_eq!(diags[1].message(), "second");
    }

    #[test]
    fn test_collector_warnings_only() {
        let mut collector = DiagnosticCollector::new();
        collector.emit(Diagnostic::warning("warning"));

        assert!(!collector.has_errors());
        assert_eq!(collector.warning_count(), 1);
    }
}
