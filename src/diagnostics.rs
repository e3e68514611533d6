//! Non-fatal diagnostics collected while reading or writing.
//!
//! Anomalies that the codec tolerates (unrecognized record kinds, dangling
//! owner indices, header counts that disagree with the data) are recorded as
//! [`Diagnostic`]s instead of failing the whole call. Each pushed diagnostic is
//! also emitted as a `tracing` event at the matching level.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// A single tolerated anomaly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    severity: Severity,
    message: String,
    stream: Option<String>,
    record_index: Option<usize>,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        message: impl Into<String>,
        stream: Option<&str>,
        record_index: Option<usize>,
    ) -> Self {
        Self {
            severity,
            message: message.into(),
            stream: stream.map(str::to_owned),
            record_index,
        }
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[inline]
    pub fn stream(&self) -> Option<&str> {
        self.stream.as_deref()
    }

    #[inline]
    pub fn record_index(&self) -> Option<usize> {
        self.record_index
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(stream) = &self.stream {
            write!(f, " [{}", stream)?;
            if let Some(index) = self.record_index {
                write!(f, " #{}", index)?;
            }
            f.write_str("]")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Append-only list of diagnostics for one read or write call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic and mirror it to `tracing`.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => tracing::info!(
                stream = diagnostic.stream(),
                record = diagnostic.record_index,
                "{}",
                diagnostic.message
            ),
            Severity::Warning => tracing::warn!(
                stream = diagnostic.stream(),
                record = diagnostic.record_index,
                "{}",
                diagnostic.message
            ),
            Severity::Error => tracing::error!(
                stream = diagnostic.stream(),
                record = diagnostic.record_index,
                "{}",
                diagnostic.message
            ),
        }
        self.entries.push(diagnostic);
    }

    pub fn info(&mut self, stream: &str, record_index: Option<usize>, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Info, message, Some(stream), record_index));
    }

    pub fn warning(&mut self, stream: &str, record_index: Option<usize>, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Warning, message, Some(stream), record_index));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Number of diagnostics with exactly the given severity.
    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity == severity).count()
    }

    pub fn has_warnings(&self) -> bool {
        self.entries.iter().any(|d| d.severity >= Severity::Warning)
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<T: IntoIterator<Item = Diagnostic>>(&mut self, iter: T) {
        for diagnostic in iter {
            self.push(diagnostic);
        }
    }
}
