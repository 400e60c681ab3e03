//! Diagnostics for malformed or unresolvable annotation constructs.
//!
//! Converters never abort on a single bad construct; they record a
//! [`Diagnostic`] and keep going.

use std::sync::Arc;

use crate::base::{LineIndex, Range};
use crate::syntax::SyntaxError;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub range: Range,
    pub severity: Severity,
    /// Error/warning code (e.g., "W0201").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(range: Range, message: impl Into<Arc<str>>) -> Self {
        Self {
            range,
            severity: Severity::Error,
            code: None,
            message: message.into(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(range: Range, message: impl Into<Arc<str>>) -> Self {
        Self {
            range,
            severity: Severity::Warning,
            code: None,
            message: message.into(),
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
pub mod codes {
    /// Concrete syntax error.
    pub const PARSE_ERROR: &str = "E0101";
    /// Element or attribute prefix without an `xmlns` declaration.
    pub const UNKNOWN_NAMESPACE_PREFIX: &str = "E0102";
    /// Attribute given twice on one element.
    pub const DUPLICATE_ATTRIBUTE: &str = "E0103";

    /// Annotation target not found in the metadata.
    pub const UNKNOWN_TARGET: &str = "W0101";
    /// Term not defined by any known vocabulary.
    pub const UNKNOWN_TERM: &str = "W0201";
    /// Record property not defined by the record's type.
    pub const UNKNOWN_PROPERTY: &str = "W0202";
    /// Value outside the allowed values of its term or property.
    pub const VALUE_NOT_ALLOWED: &str = "W0203";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during a conversion pass.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add the concrete-syntax errors of a parse.
    pub fn syntax_errors(&mut self, errors: &[SyntaxError], line_index: &LineIndex) {
        for error in errors {
            self.add(
                Diagnostic::error(line_index.range(error.range), error.message.as_str())
                    .with_code(codes::PARSE_ERROR),
            );
        }
    }

    pub fn unknown_namespace_prefix(&mut self, range: Range, prefix: &str) {
        self.add(
            Diagnostic::error(range, format!("unknown namespace prefix: '{}'", prefix))
                .with_code(codes::UNKNOWN_NAMESPACE_PREFIX),
        );
    }

    pub fn duplicate_attribute(&mut self, range: Range, name: &str) {
        self.add(
            Diagnostic::error(range, format!("duplicate attribute: '{}'", name))
                .with_code(codes::DUPLICATE_ATTRIBUTE),
        );
    }

    pub fn unknown_target(&mut self, range: Range, target: &str) {
        self.add(
            Diagnostic::warning(range, format!("unknown annotation target: '{}'", target))
                .with_code(codes::UNKNOWN_TARGET),
        );
    }

    pub fn unknown_term(&mut self, range: Range, term: &str) {
        self.add(
            Diagnostic::warning(range, format!("unknown term: '{}'", term))
                .with_code(codes::UNKNOWN_TERM),
        );
    }

    pub fn unknown_property(&mut self, range: Range, property: &str, type_name: &str) {
        self.add(
            Diagnostic::warning(
                range,
                format!("unknown property '{}' for type '{}'", property, type_name),
            )
            .with_code(codes::UNKNOWN_PROPERTY),
        );
    }

    pub fn value_not_allowed(&mut self, range: Range, value: &str, allowed: &[String]) {
        self.add(
            Diagnostic::warning(
                range,
                format!("value '{}' is not allowed, expected one of: {}", value, allowed.join(", ")),
            )
            .with_code(codes::VALUE_NOT_ALLOWED),
        );
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Error).count()
    }

    /// Get the number of warnings.
    pub fn warning_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == Severity::Warning).count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::TextRange;

    #[test]
    fn test_diagnostic_error() {
        let diag = Diagnostic::error(Range::from_coords(10, 5, 10, 9), "test error");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.range.start.line, 10);
        assert_eq!(diag.range.start.character, 5);
    }

    #[test]
    fn test_diagnostic_with_code() {
        let diag = Diagnostic::warning(Range::default(), "test").with_code(codes::UNKNOWN_TERM);
        assert_eq!(diag.code.as_deref(), Some("W0201"));
    }

    #[test]
    fn test_collector_counts() {
        let mut collector = DiagnosticCollector::new();
        collector.duplicate_attribute(Range::default(), "Term");
        collector.unknown_namespace_prefix(Range::default(), "edm");
        collector.unknown_term(Range::default(), "UI.Foo");

        assert_eq!(collector.error_count(), 2);
        assert_eq!(collector.warning_count(), 1);
        assert!(collector.has_errors());
        assert_eq!(collector.take().len(), 3);
        assert!(collector.is_empty());
    }

    #[test]
    fn test_syntax_errors_are_mapped() {
        let index = LineIndex::new("ab\ncd");
        let mut collector = DiagnosticCollector::new();
        collector.syntax_errors(
            &[SyntaxError::new("boom", TextRange::new(3.into(), 5.into()))],
            &index,
        );
        let diag = &collector.diagnostics()[0];
        assert_eq!(diag.range, Range::from_coords(1, 0, 1, 2));
        assert_eq!(diag.code.as_deref(), Some(codes::PARSE_ERROR));
    }

    #[test]
    fn test_severity_to_lsp() {
        assert_eq!(Severity::Error.to_lsp(), 1);
        assert_eq!(Severity::Warning.to_lsp(), 2);
        assert_eq!(Severity::Info.to_lsp(), 3);
        assert_eq!(Severity::Hint.to_lsp(), 4);
    }
}
