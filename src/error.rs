//! Error types for covx
//!
//! Format-level errors (`MalformedInput`, `UnrecognizedFormat`) abort one input.
//! `UnexpectedCoverageType` is local to a single `<line>` and is normally turned
//! into a [`Diagnostic`] instead of being returned.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::index::{Handle, HandleWidth};

pub type Result<T> = std::result::Result<T, CovxError>;

#[derive(Debug, Error)]
pub enum CovxError {
    /// The raw bytes could not be parsed into a node tree.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The root marker of the expected format is missing.
    #[error("unrecognized format: {0}")]
    UnrecognizedFormat(String),

    /// A `<line>` carries a `type` outside stmt/method/cond.
    #[error("unexpected coverage type '{kind}' on line {line}")]
    UnexpectedCoverageType { kind: String, line: u32 },

    /// No more handles fit in the configured width.
    #[error("handle space exhausted for {width} handles")]
    HandleOverflow { width: HandleWidth },

    /// A handle that this index never handed out.
    #[error("unknown handle {0}")]
    UnknownHandle(Handle),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode output as {format}: {message}")]
    Encode { format: String, message: String },
}

impl CovxError {
    /// True for errors that reject a whole input file.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            CovxError::MalformedInput(_) | CovxError::UnrecognizedFormat(_)
        )
    }
}

/// Severity of a non-fatal finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
}

/// A recoverable problem found while reading a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Path of the `<file>` the problem was found in, empty when not applicable.
    pub file: String,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(file: impl Into<String>, err: &CovxError) -> Self {
        Self {
            severity: Severity::Warning,
            file: file.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.file.is_empty() {
            write!(f, "warning: {}", self.message)
        } else {
            write!(f, "warning: {}: {}", self.file, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_errors() {
        assert!(CovxError::MalformedInput("eof".into()).is_format_error());
        assert!(CovxError::UnrecognizedFormat("no clover".into()).is_format_error());
        assert!(!CovxError::UnexpectedCoverageType {
            kind: "branch".into(),
            line: 3
        }
        .is_format_error());
    }

    #[test]
    fn test_diagnostic_display() {
        let err = CovxError::UnexpectedCoverageType {
            kind: "branch".into(),
            line: 12,
        };
        let diag = Diagnostic::warning("src/a.php", &err);
        assert_eq!(
            diag.to_string(),
            "warning: src/a.php: unexpected coverage type 'branch' on line 12"
        );
    }
}
