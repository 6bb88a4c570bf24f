//! core::diagnostics
//!
//! Path-attributed diagnostics collected during validation and planning.
//!
//! Validation never stops at the first problem: every rule runs, and every
//! violation ends up in one [`Diagnostics`] list attributed to the exact
//! attribute that caused it.

use std::fmt;

use super::path::AttrPath;

/// What kind of problem a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The configuration is invalid as written.
    Invalid,
    /// The configuration asks for a change the remote system cannot make in
    /// place (field type change, immutable attribute change).
    IrrecoverableChange,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Invalid => write!(f, "invalid"),
            DiagnosticKind::IrrecoverableChange => write!(f, "irrecoverable change"),
        }
    }
}

/// A single problem attributed to one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub path: AttrPath,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn invalid(path: AttrPath, summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Invalid,
            path,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn irrecoverable(
        path: AttrPath,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind: DiagnosticKind::IrrecoverableChange,
            path,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_root() {
            "<root>".to_string()
        } else {
            self.path.to_string()
        };
        write!(f, "error: {}: {}: {}", path, self.summary, self.detail)
    }
}

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    /// Diagnostics attributed to exactly `path`.
    pub fn at(&self, path: &AttrPath) -> Vec<&Diagnostic> {
        self.0.iter().filter(|d| &d.path == path).collect()
    }

    /// True if any diagnostic reports an irrecoverable change.
    pub fn has_irrecoverable(&self) -> bool {
        self.0
            .iter()
            .any(|d| d.kind == DiagnosticKind::IrrecoverableChange)
    }

    /// `Ok(())` when empty, the collection itself otherwise.
    pub fn into_result(self) -> Result<(), Diagnostics> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", d)?;
        }
        Ok(())
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<T: IntoIterator<Item = Diagnostic>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
