//! Coverage metrics
//!
//! Only file metrics are computed from line records. Class, package and
//! project metrics come straight from the report's `<metrics>` elements.

use serde::{Deserialize, Serialize};

use super::{CoverageKind, FileCoverage, ProjectCoverage};

/// Covered/total counts per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub elements: u32,
    pub covered_elements: u32,
    pub statements: u32,
    pub covered_statements: u32,
    pub conditionals: u32,
    pub covered_conditionals: u32,
    pub methods: u32,
    pub covered_methods: u32,
    pub complexity: u32,
    pub loc: u32,
    pub ncloc: u32,
}

impl ClassMetrics {
    pub fn element_percentage(&self) -> f64 {
        percentage(self.covered_elements, self.elements)
    }

    pub fn statement_percentage(&self) -> f64 {
        percentage(self.covered_statements, self.statements)
    }

    pub fn conditional_percentage(&self) -> f64 {
        percentage(self.covered_conditionals, self.conditionals)
    }

    pub fn method_percentage(&self) -> f64 {
        percentage(self.covered_methods, self.methods)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetrics {
    pub classes: u32,
    pub metrics: ClassMetrics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetrics {
    pub files: u32,
    pub metrics: FileMetrics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetrics {
    pub packages: u32,
    pub metrics: PackageMetrics,
}

fn percentage(covered: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (covered as f64 / total as f64) * 100.0
}

/// Compute metrics for one file from its line records.
///
/// Each conditional line counts as two branch slots but only its true branch
/// is checked when counting covered conditionals.
pub fn compute_file_metrics(file: &FileCoverage) -> FileMetrics {
    let mut m = ClassMetrics::default();

    for line in &file.lines {
        match line.kind {
            CoverageKind::Statement => {
                m.statements += 1;
                m.covered_statements += u32::from(line.count > 0);
            }
            CoverageKind::Method => {
                m.methods += 1;
                m.covered_methods += u32::from(line.count > 0);
            }
            CoverageKind::Conditional => {
                m.conditionals += 2;
                m.covered_conditionals += u32::from(line.true_count > 0);
            }
        }
    }

    m.elements = m.statements + m.methods + m.conditionals;
    m.covered_elements = m.covered_statements + m.covered_methods + m.covered_conditionals;

    FileMetrics {
        classes: file.classes.len() as u32,
        metrics: m,
    }
}

/// Metrics of every file in `project` whose path equals `path`.
pub fn file_metrics_for_path(project: &ProjectCoverage, path: &str) -> Vec<FileMetrics> {
    project.find_files(path).map(compute_file_metrics).collect()
}
