//! Diagnostic types reported while building schemas from DDL

use miette::SourceSpan;
use serde::{Deserialize, Serialize};

/// Source location span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset from start of source
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
}

impl Span {
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Span of `fragment` within `source`, if it is a subslice or occurs in it
    pub fn locate(source: &str, fragment: &str) -> Option<Self> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return None;
        }
        source
            .find(fragment)
            .map(|offset| Self::new(offset, fragment.len()))
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.offset.into(), span.length)
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// Diagnostic message produced while reading a schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub span: Option<Span>,
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            message: message.into(),
            span: None,
            help: None,
        }
    }

    pub fn warning(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: Severity::Warning,
            message: message.into(),
            span: None,
            help: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Get the diagnostic code string (e.g., "W0001")
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }
}

/// Types of diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// W0001: ALTER TABLE / CREATE INDEX on an unknown table
    TableNotFound,
    /// W0002: Index or constraint references an unknown column
    ColumnNotFound,
    /// W0003: Column type could not be mapped
    UnknownType,
    /// Parse error
    ParseError,
}

impl DiagnosticKind {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::TableNotFound => "W0001",
            DiagnosticKind::ColumnNotFound => "W0002",
            DiagnosticKind::UnknownType => "W0003",
            DiagnosticKind::ParseError => "E1000",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DiagnosticKind::TableNotFound => "table-not-found",
            DiagnosticKind::ColumnNotFound => "column-not-found",
            DiagnosticKind::UnknownType => "unknown-type",
            DiagnosticKind::ParseError => "parse-error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_span() {
        let source = "CREATE TABLE t (id INT);\nALTER TABLE x ADD COLUMN y INT;";
        let span = Span::locate(source, "ALTER TABLE x ADD COLUMN y INT").unwrap();
        assert_eq!(span.offset, 25);
        assert_eq!(span.length, 30);
        assert!(Span::locate(source, "   ").is_none());
    }

    #[test]
    fn test_diagnostic_code() {
        let diag = Diagnostic::warning(DiagnosticKind::TableNotFound, "missing");
        assert_eq!(diag.code(), "W0001");
        assert_eq!(diag.kind.name(), "table-not-found");
        assert_eq!(diag.severity, Severity::Warning);
    }
}
