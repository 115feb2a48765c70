//! Coverage module
//!
//! Provides:
//! - Clover XML parsing into a project/package/file tree
//! - Per-file metrics computed from line records
//! - The line classification shared with the index store

mod clover;
mod metrics;
mod model;

pub use clover::*;
pub use metrics::*;
pub use model::*;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CovxError, Result};

/// What a Clover `<line>` measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoverageKind {
    #[serde(rename = "stmt")]
    Statement,
    #[serde(rename = "method")]
    Method,
    #[serde(rename = "cond")]
    Conditional,
}

impl CoverageKind {
    /// Classify a `type` attribute value. `line` is only used for the error.
    pub fn classify(value: &str, line: u32) -> Result<Self> {
        match value {
            "stmt" => Ok(CoverageKind::Statement),
            "method" => Ok(CoverageKind::Method),
            "cond" => Ok(CoverageKind::Conditional),
            other => Err(CovxError::UnexpectedCoverageType {
                kind: other.to_string(),
                line,
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageKind::Statement => "stmt",
            CoverageKind::Method => "method",
            CoverageKind::Conditional => "cond",
        }
    }
}

impl fmt::Display for CoverageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution counts observed for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoverageInfo {
    pub kind: CoverageKind,
    pub count: u32,
    pub true_count: u32,
    pub false_count: u32,
}

impl CoverageInfo {
    /// Whether these counts show observed execution.
    ///
    /// Statements and methods need a non-zero count; conditionals need both
    /// branches taken at least once.
    pub fn has_signal(&self) -> bool {
        match self.kind {
            CoverageKind::Statement | CoverageKind::Method => self.count > 0,
            CoverageKind::Conditional => self.true_count > 0 && self.false_count > 0,
        }
    }
}

impl fmt::Display for CoverageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CoverageKind::Statement | CoverageKind::Method => {
                write!(f, "type: {}, count = {}", self.kind, self.count)
            }
            CoverageKind::Conditional => write!(
                f,
                "type: {}, truecount: {}, falsecount: {}",
                self.kind, self.true_count, self.false_count
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(kind: CoverageKind, count: u32, true_count: u32, false_count: u32) -> CoverageInfo {
        CoverageInfo {
            kind,
            count,
            true_count,
            false_count,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(CoverageKind::classify("stmt", 1).unwrap(), CoverageKind::Statement);
        assert_eq!(CoverageKind::classify("method", 1).unwrap(), CoverageKind::Method);
        assert_eq!(CoverageKind::classify("cond", 1).unwrap(), CoverageKind::Conditional);

        match CoverageKind::classify("STMT", 7) {
            Err(CovxError::UnexpectedCoverageType { kind, line }) => {
                assert_eq!(kind, "STMT");
                assert_eq!(line, 7);
            }
            other => panic!("expected UnexpectedCoverageType, got {:?}", other),
        }
    }

    #[test]
    fn test_signal() {
        assert!(!info(CoverageKind::Statement, 0, 5, 5).has_signal());
        assert!(info(CoverageKind::Statement, 1, 0, 0).has_signal());
        assert!(!info(CoverageKind::Method, 0, 0, 0).has_signal());
        assert!(info(CoverageKind::Method, 3, 0, 0).has_signal());

        assert!(!info(CoverageKind::Conditional, 9, 0, 1).has_signal());
        assert!(!info(CoverageKind::Conditional, 9, 1, 0).has_signal());
        assert!(info(CoverageKind::Conditional, 0, 1, 1).has_signal());
    }

    #[test]
    fn test_info_display() {
        assert_eq!(
            info(CoverageKind::Statement, 4, 0, 0).to_string(),
            "type: stmt, count = 4"
        );
        assert_eq!(
            info(CoverageKind::Conditional, 0, 2, 1).to_string(),
            "type: cond, truecount: 2, falsecount: 1"
        );
    }
}
