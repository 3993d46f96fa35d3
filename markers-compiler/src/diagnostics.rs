//! Diagnostic collection for schema compilation
//!
//! The compiler never prints; every recoverable anomaly it encounters is
//! recorded here and handed back to the caller, which decides how to report
//! it (the CLI prints warnings to stderr). Fatal conflicts do not go through
//! this channel, they abort compilation via [`crate::error::CompileError`].

use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Warning,
    Information,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Warning => write!(f, "warning"),
            DiagnosticSeverity::Information => write!(f, "info"),
        }
    }
}

/// One recoverable anomaly observed during compilation
///
/// `context` names the schema location the message is about, usually a
/// definition name or a `definition/element` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: DiagnosticSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.context, self.message)
    }
}

/// Sink for diagnostics, owned by one compilation call
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning about `context`
    pub fn warn(&mut self, context: impl Into<String>, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: DiagnosticSeverity::Warning,
            context: context.into(),
            message: message.into(),
        });
    }

    /// Record an informational note about `context`
    pub fn info(&mut self, context: impl Into<String>, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            severity: DiagnosticSeverity::Information,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any recorded entry mentions `needle` in its message
    pub fn mentions(&self, needle: &str) -> bool {
        self.entries.iter().any(|d| d.message.contains(needle))
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}
