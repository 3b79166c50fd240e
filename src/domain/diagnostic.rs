//! Non-fatal diagnostics returned alongside computation results.
//!
//! Every engine call hands back its own list; nothing is written to a shared
//! sink.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// Fewer bars/rows than the subject needs; the subject was omitted.
    InsufficientData { required: usize, available: usize },
    /// A required input column is absent; dependent outputs were skipped.
    MissingColumn { column: &'static str },
    /// A value is mathematically undefined (zero variance and similar).
    DegenerateMath { reason: String },
    /// Every unit of a batch was excluded.
    AllExcluded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub subject: String,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn insufficient(subject: impl Into<String>, required: usize, available: usize) -> Self {
        Self {
            subject: subject.into(),
            kind: DiagnosticKind::InsufficientData {
                required,
                available,
            },
        }
    }

    pub fn missing_column(subject: impl Into<String>, column: &'static str) -> Self {
        Self {
            subject: subject.into(),
            kind: DiagnosticKind::MissingColumn { column },
        }
    }

    pub fn degenerate(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            kind: DiagnosticKind::DegenerateMath {
                reason: reason.into(),
            },
        }
    }

    pub fn all_excluded(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            kind: DiagnosticKind::AllExcluded,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::InsufficientData {
                required,
                available,
            } => write!(
                f,
                "{}: insufficient data (need {}, have {})",
                self.subject, required, available
            ),
            DiagnosticKind::MissingColumn { column } => {
                write!(f, "{}: missing input column '{}'", self.subject, column)
            }
            DiagnosticKind::DegenerateMath { reason } => {
                write!(f, "{}: undefined ({})", self.subject, reason)
            }
            DiagnosticKind::AllExcluded => write!(f, "{}: every input was excluded", self.subject),
        }
    }
}

/// A computed value plus the diagnostics raised while computing it.
#[derive(Debug, Clone)]
pub struct Outcome<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Outcome<T> {
    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    pub fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_insufficient() {
        let d = Diagnostic::insufficient("ichimoku", 52, 30);
        assert_eq!(d.to_string(), "ichimoku: insufficient data (need 52, have 30)");
    }

    #[test]
    fn display_missing_column() {
        let d = Diagnostic::missing_column("adx", "high");
        assert_eq!(d.to_string(), "adx: missing input column 'high'");
    }

    #[test]
    fn outcome_clean_has_no_diagnostics() {
        let o = Outcome::clean(5);
        assert!(o.is_clean());
        assert_eq!(o.value, 5);
    }
}
