//! Diagnostics collected during a filter run.

use std::fmt;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// A link could not be resolved or written.
    Error,
    /// Suspicious but harmless condition.
    Warning,
    /// Progress report (imports, copies, exports).
    Info,
}

/// A message produced while filtering a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity.
    pub severity: Severity,
    /// Message text without the severity prefix.
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.severity {
            Severity::Error => write!(f, "ERROR {}", self.message),
            Severity::Warning => write!(f, "WARNING {}", self.message),
            Severity::Info => f.write_str(&self.message),
        }
    }
}

/// Ordered diagnostic sink.
///
/// Entries are returned to the caller for presentation and also traced at
/// debug level, so they interleave with the filter's own debug events.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn error(&mut self, message: String) {
        self.push(Severity::Error, message);
    }

    pub(crate) fn warning(&mut self, message: String) {
        self.push(Severity::Warning, message);
    }

    pub(crate) fn info(&mut self, message: String) {
        self.push(Severity::Info, message);
    }

    fn push(&mut self, severity: Severity, message: String) {
        tracing::debug!(?severity, "{message}");
        self.entries.push(Diagnostic { severity, message });
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
