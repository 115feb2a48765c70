//! Clover XML format parser

use std::path::Path;

use super::{
    ClassCoverage, ClassMetrics, CoverageKind, FileCoverage, FileMetrics, LineRecord,
    PackageCoverage, PackageMetrics, ProjectCoverage, ProjectMetrics,
};
use crate::error::{CovxError, Diagnostic, Result};
use crate::xml::{self, XmlNode};

static EMPTY_PROJECT: ProjectCoverage = ProjectCoverage {
    name: String::new(),
    timestamp: String::new(),
    metrics: None,
    packages: Vec::new(),
};

/// A parsed Clover report and the lines that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloverReport {
    /// Every `<project>` in document order
    pub projects: Vec<ProjectCoverage>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CloverReport {
    /// The first project, or an empty one when the report has none.
    pub fn project(&self) -> &ProjectCoverage {
        self.projects.first().unwrap_or(&EMPTY_PROJECT)
    }
}

/// Parse a Clover XML file
pub fn parse_clover(path: &Path) -> Result<CloverReport> {
    let root = xml::read_document(path)?;
    build_report(&root)
}

/// Parse Clover XML content from a string
pub fn parse_clover_string(content: &str) -> Result<CloverReport> {
    let root = xml::parse_document(content)?;
    build_report(&root)
}

/// Build the coverage tree from an already parsed document.
///
/// The root must be `<coverage>` carrying a `clover` attribute; otherwise
/// nothing below it is looked at.
pub fn build_report(root: &XmlNode) -> Result<CloverReport> {
    if root.name != "coverage" || !root.has_attr("clover") {
        return Err(CovxError::UnrecognizedFormat(format!(
            "<{}> is not a clover coverage root",
            root.name
        )));
    }

    let mut diagnostics = Vec::new();
    let projects = root
        .children_named("project")
        .map(|p| parse_project(p, &mut diagnostics))
        .collect();

    Ok(CloverReport {
        projects,
        diagnostics,
    })
}

fn parse_project(node: &XmlNode, diagnostics: &mut Vec<Diagnostic>) -> ProjectCoverage {
    ProjectCoverage {
        name: node.attr_string("name"),
        timestamp: node.attr_string("timestamp"),
        metrics: node.child("metrics").map(parse_project_metrics),
        packages: node
            .children_named("package")
            .map(|p| parse_package(p, diagnostics))
            .collect(),
    }
}

fn parse_package(node: &XmlNode, diagnostics: &mut Vec<Diagnostic>) -> PackageCoverage {
    PackageCoverage {
        name: node.attr_string("name"),
        metrics: node.child("metrics").map(parse_package_metrics),
        files: node
            .children_named("file")
            .map(|f| parse_file(f, diagnostics))
            .collect(),
    }
}

fn parse_file(node: &XmlNode, diagnostics: &mut Vec<Diagnostic>) -> FileCoverage {
    let path = node.attr_string("path");

    let mut lines = Vec::new();
    for line_node in node.children_named("line") {
        match parse_line(line_node) {
            Ok(line) => lines.push(line),
            Err(e) => {
                tracing::warn!(file = %path, "skipping line: {}", e);
                diagnostics.push(Diagnostic::warning(path.as_str(), &e));
            }
        }
    }

    FileCoverage {
        name: node.attr_string("name"),
        metrics: node.child("metrics").map(parse_file_metrics),
        classes: node.children_named("class").map(parse_class).collect(),
        lines,
        path,
    }
}

fn parse_class(node: &XmlNode) -> ClassCoverage {
    ClassCoverage {
        name: node.attr_string("name"),
        metrics: node.child("metrics").map(parse_class_metrics),
    }
}

fn parse_line(node: &XmlNode) -> Result<LineRecord> {
    let num = node.attr_u32("num");
    let kind = CoverageKind::classify(node.attr("type").unwrap_or_default(), num)?;

    let mut line = LineRecord {
        num,
        kind,
        count: 0,
        true_count: 0,
        false_count: 0,
    };
    match kind {
        CoverageKind::Statement | CoverageKind::Method => {
            line.count = node.attr_u32("count");
        }
        CoverageKind::Conditional => {
            line.true_count = node.attr_u32("truecount");
            line.false_count = node.attr_u32("falsecount");
        }
    }
    Ok(line)
}

fn parse_project_metrics(node: &XmlNode) -> ProjectMetrics {
    ProjectMetrics {
        packages: node.attr_u32("packages"),
        metrics: parse_package_metrics(node),
    }
}

fn parse_package_metrics(node: &XmlNode) -> PackageMetrics {
    PackageMetrics {
        files: node.attr_u32("files"),
        metrics: parse_file_metrics(node),
    }
}

fn parse_file_metrics(node: &XmlNode) -> FileMetrics {
    FileMetrics {
        classes: node.attr_u32("classes"),
        metrics: parse_class_metrics(node),
    }
}

fn parse_class_metrics(node: &XmlNode) -> ClassMetrics {
    ClassMetrics {
        elements: node.attr_u32("elements"),
        covered_elements: node.attr_u32("coveredelements"),
        statements: node.attr_u32("statements"),
        covered_statements: node.attr_u32("coveredstatements"),
        conditionals: node.attr_u32("conditionals"),
        covered_conditionals: node.attr_u32("coveredconditionals"),
        methods: node.attr_u32("methods"),
        covered_methods: node.attr_u32("coveredmethods"),
        complexity: node.attr_u32("complexity"),
        loc: node.attr_u32("loc"),
        ncloc: node.attr_u32("ncloc"),
    }
}
