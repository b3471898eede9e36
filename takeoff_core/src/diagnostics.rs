//! # Diagnostics
//!
//! Non-fatal problems found during extraction: a field whose text did not
//! parse, a table row that was skipped, or the table stage producing nothing
//! usable. They never abort an extraction; they are handed to whatever
//! [`DiagnosticSink`] the caller injects.
//!
//! ```rust
//! use takeoff_core::diagnostics::{Diagnostic, DiagnosticSink, Diagnostics};
//!
//! let mut sink = Diagnostics::default();
//! sink.report(Diagnostic::field_parse("ridges", "12x", "not a number"));
//! assert_eq!(sink.warnings().count(), 1);
//! ```

use serde::{Deserialize, Serialize};

/// A single non-fatal extraction event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Diagnostic {
    /// A matched field value could not be parsed; the field is treated as absent.
    FieldParseWarning {
        field: String,
        value: String,
        reason: String,
    },
    /// A table row looked like a pitch row but was rejected.
    RowSkipped {
        /// 1-based page the table was detected on
        page: usize,
        row: usize,
        cells: Vec<String>,
        reason: String,
    },
    /// The table stage gave no pitch breakdown; text extraction takes over.
    ExtractorDegradation { reason: String },
}

impl Diagnostic {
    pub fn field_parse(field: impl Into<String>, value: impl Into<String>, reason: impl Into<String>) -> Self {
        Diagnostic::FieldParseWarning {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn degradation(reason: impl Into<String>) -> Self {
        Diagnostic::ExtractorDegradation {
            reason: reason.into(),
        }
    }

    /// Warnings lost data; degradations only changed strategy.
    pub fn is_warning(&self) -> bool {
        !matches!(self, Diagnostic::ExtractorDegradation { .. })
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::FieldParseWarning { field, value, reason } => {
                write!(f, "field '{}' value '{}' ignored: {}", field, value, reason)
            }
            Diagnostic::RowSkipped { page, row, cells, reason } => {
                write!(
                    f,
                    "page {} table row {} [{}] skipped: {}",
                    page,
                    row,
                    cells.join(" | "),
                    reason
                )
            }
            Diagnostic::ExtractorDegradation { reason } => {
                write!(f, "table extraction degraded to text: {}", reason)
            }
        }
    }
}

/// Receiver for non-fatal diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Collects diagnostics in memory, in the order they were reported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    pub entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.is_warning())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DiagnosticSink for Diagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_warning() {
            log::warn!("{diagnostic}");
        } else {
            log::info!("{diagnostic}");
        }
    }
}
