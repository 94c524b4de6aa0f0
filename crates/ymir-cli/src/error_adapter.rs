//! Error adapter for converting parser diagnostics to miette reports.
//!
//! This module bridges the library's [`Diagnostic`] type and miette's
//! rich diagnostic formatting used in the CLI. Each diagnostic is
//! rendered independently against the source of the file it names, so
//! diagnostics from included files underline the right text.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, NamedSource, SourceSpan};

use ymir_core::Span;
use ymir_parser::SourceSet;
use ymir_parser::error::Diagnostic;

/// Adapter for a single Ymir diagnostic.
pub struct DiagnosticAdapter<'a> {
    diag: &'a Diagnostic,
    /// Source of the diagnostic's file, named for the report header.
    src: NamedSource<String>,
}

impl<'a> DiagnosticAdapter<'a> {
    /// Create an adapter, resolving the diagnostic's file against the
    /// sources read during the compile.
    pub fn new(diag: &'a Diagnostic, sources: &SourceSet) -> Self {
        let file = diag.file().unwrap_or("<unknown>");
        let text = sources.get(file).unwrap_or_default().to_string();
        Self {
            diag,
            src: NamedSource::new(file, text),
        }
    }
}

impl fmt::Debug for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticAdapter")
            .field("diag", &self.diag)
            .finish()
    }
}

impl fmt::Display for DiagnosticAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.diag.message())
    }
}

impl std::error::Error for DiagnosticAdapter<'_> {}

impl MietteDiagnostic for DiagnosticAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .code()
            .map(|c| Box::new(c) as Box<dyn fmt::Display>)
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(if self.diag.severity().is_error() {
            miette::Severity::Error
        } else {
            miette::Severity::Warning
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.diag
            .help()
            .map(|h| Box::new(h) as Box<dyn fmt::Display>)
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let labels = self.diag.labels();
        if labels.is_empty() {
            return None;
        }

        Some(Box::new(labels.iter().map(|label| {
            let span = span_to_miette(label.span());
            let message = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(message, span)
            } else {
                LabeledSpan::new_with_span(message, span)
            }
        })))
    }
}

fn span_to_miette(span: Span) -> SourceSpan {
    SourceSpan::new(span.start().into(), span.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ymir_parser::error::ErrorCode;

    fn sources() -> SourceSet {
        let mut sources = SourceSet::new();
        sources.insert("main.ymr", "target T;\nrouter /api {}\n");
        sources
    }

    #[test]
    fn test_adapter_carries_code_and_help() {
        let diag = Diagnostic::error("test error")
            .with_code(ErrorCode::E100)
            .with_label(Span::new(0..6), "here")
            .with_help("try this")
            .in_file("main.ymr");
        let sources = sources();
        let adapter = DiagnosticAdapter::new(&diag, &sources);

        assert_eq!(adapter.to_string(), "test error");
        assert_eq!(adapter.code().unwrap().to_string(), "E100");
        assert_eq!(adapter.help().unwrap().to_string(), "try this");
        assert!(adapter.source_code().is_some());
    }

    #[test]
    fn test_all_labels_returned() {
        let diag = Diagnostic::error("error with labels")
            .with_label(Span::new(0..5), "primary label")
            .with_secondary_label(Span::new(10..15), "secondary label")
            .in_file("main.ymr");
        let sources = sources();
        let adapter = DiagnosticAdapter::new(&diag, &sources);

        let labels: Vec<_> = adapter.labels().unwrap().collect();
        assert_eq!(labels.len(), 2);
        assert!(labels[0].primary());
        assert!(!labels[1].primary());
    }
}
