//! covx - Clover coverage index
//!
//! A library for loading coverage and test-result reports with:
//! - Clover XML parsing into a project/package/file/line tree
//! - A deduplicating index of files, tests and lines with stable handles
//! - Per-file statement/method/conditional metrics
//! - Test suite/case/failure reports
//! - JSON, XML and binary output of every model

pub mod config;
pub mod coverage;
pub mod encode;
pub mod error;
pub mod index;
pub mod junit;
pub mod xml;

pub use coverage::{
    compute_file_metrics, parse_clover, parse_clover_string, CloverReport, CoverageInfo,
    CoverageKind, FileCoverage, FileMetrics, ProjectCoverage,
};
pub use encode::{encode, Encoded, OutputFormat};
pub use error::{CovxError, Diagnostic, Result};
pub use index::{CoverageIndex, Handle, HandleWidth, IndexSummary, TestIdentity};
pub use junit::{parse_test_results, parse_test_results_string, TestReport};
