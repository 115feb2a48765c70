//! Coverage index store

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;

use super::{Handle, HandleWidth, Interner, LineKey, TestIdentity};
use crate::coverage::{self, CoverageInfo, FileCoverage, ProjectCoverage};
use crate::error::{CovxError, Diagnostic, Result};

/// One observation: a test executed a line with these counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageFact {
    pub test: Handle,
    pub line: Handle,
    pub info: CoverageInfo,
}

/// Table sizes of an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSummary {
    pub files: usize,
    pub tests: usize,
    pub lines: usize,
    pub facts: usize,
}

impl fmt::Display for IndexSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of tests: {}", self.tests)?;
        writeln!(f, "Number of source files: {}", self.files)?;
        writeln!(f, "Number of source lines: {}", self.lines)?;
        write!(f, "Number of coverage facts: {}", self.facts)
    }
}

/// Lines seen while ingesting, split by what happened to them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestStats {
    pub recorded: usize,
    /// Lines dropped because their counts carried no execution signal
    pub filtered: usize,
}

impl IngestStats {
    pub fn absorb(&mut self, other: IngestStats) {
        self.recorded += other.recorded;
        self.filtered += other.filtered;
    }
}

/// Result of ingesting a whole report.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestOutcome {
    pub test: Handle,
    pub stats: IngestStats,
    pub diagnostics: Vec<Diagnostic>,
}

/// A fact with every handle resolved back to its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedFact {
    pub test: TestIdentity,
    pub path: String,
    pub line: u32,
    pub info: CoverageInfo,
}

impl fmt::Display for ResolvedFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "test {} -> {}:{}, {}", self.test, self.path, self.line, self.info)
    }
}

/// Deduplicating store of coverage facts.
#[derive(Debug, Clone)]
pub struct CoverageIndex {
    files: Interner<String>,
    tests: Interner<TestIdentity>,
    lines: Interner<LineKey>,
    facts: Vec<CoverageFact>,
}

impl Default for CoverageIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl CoverageIndex {
    pub fn new() -> Self {
        Self::with_width(HandleWidth::default())
    }

    pub fn with_width(width: HandleWidth) -> Self {
        Self {
            files: Interner::new(width),
            tests: Interner::new(width),
            lines: Interner::new(width),
            facts: Vec::new(),
        }
    }

    // === Handles ===

    pub fn file_index(&mut self, path: &str) -> Result<Handle> {
        if let Some(handle) = self.files.lookup(path) {
            return Ok(handle);
        }
        self.files.intern(path.to_string())
    }

    pub fn test_index(&mut self, test: &TestIdentity) -> Result<Handle> {
        if let Some(handle) = self.tests.lookup(test) {
            return Ok(handle);
        }
        self.tests.intern(test.clone())
    }

    pub fn line_index(&mut self, file: Handle, num: u32) -> Result<Handle> {
        if !self.files.contains(file) {
            return Err(CovxError::UnknownHandle(file));
        }
        self.lines.intern(LineKey { file, num })
    }

    // === Facts ===

    /// Append a fact. Repeated (test, line) pairs are kept side by side.
    pub fn record_fact(&mut self, test: Handle, line: Handle, info: CoverageInfo) -> Result<()> {
        if !self.tests.contains(test) {
            return Err(CovxError::UnknownHandle(test));
        }
        if !self.lines.contains(line) {
            return Err(CovxError::UnknownHandle(line));
        }
        self.facts.push(CoverageFact { test, line, info });
        Ok(())
    }

    /// Record the lines of one file that show execution signal.
    ///
    /// The file is registered on its first line, so a file without lines leaves
    /// no trace. Filtered lines still get a line handle.
    pub fn ingest(&mut self, test: Handle, file: &FileCoverage) -> Result<IngestStats> {
        let mut stats = IngestStats::default();
        let mut file_id = None;

        for line in &file.lines {
            let fid = match file_id {
                Some(fid) => fid,
                None => {
                    let fid = self.file_index(&file.path)?;
                    file_id = Some(fid);
                    fid
                }
            };
            let line_id = self.line_index(fid, line.num)?;

            let info = line.info();
            if !info.has_signal() {
                stats.filtered += 1;
                continue;
            }
            self.record_fact(test, line_id, info)?;
            stats.recorded += 1;
        }

        Ok(stats)
    }

    /// Ingest every file of every package in `project`.
    pub fn ingest_project(
        &mut self,
        test: Handle,
        project: &ProjectCoverage,
    ) -> Result<IngestStats> {
        let mut stats = IngestStats::default();
        for file in project.files() {
            stats.absorb(self.ingest(test, file)?);
        }
        tracing::debug!(
            project = %project.name,
            recorded = stats.recorded,
            filtered = stats.filtered,
            "ingested project"
        );
        Ok(stats)
    }

    /// Parse a Clover report and ingest every project in it under `test`.
    ///
    /// The report is validated and the handle space checked before anything is
    /// registered, so a rejected report leaves the index untouched.
    pub fn ingest_report(&mut self, test: &TestIdentity, xml: &str) -> Result<IngestOutcome> {
        let report = coverage::parse_clover_string(xml)?;
        self.ingest_parsed(test, report)
    }

    /// Like [`CoverageIndex::ingest_report`], reading the report from disk.
    pub fn ingest_path(&mut self, test: &TestIdentity, path: &Path) -> Result<IngestOutcome> {
        let report = coverage::parse_clover(path)?;
        self.ingest_parsed(test, report)
    }

    fn ingest_parsed(
        &mut self,
        test: &TestIdentity,
        report: coverage::CloverReport,
    ) -> Result<IngestOutcome> {
        self.reserve(std::slice::from_ref(test), &report.projects)?;

        let handle = self.test_index(test)?;
        let mut stats = IngestStats::default();
        for project in &report.projects {
            stats.absorb(self.ingest_project(handle, project)?);
        }
        Ok(IngestOutcome {
            test: handle,
            stats,
            diagnostics: report.diagnostics,
        })
    }

    /// Check that `tests` and every file and line of `projects` can be
    /// ingested without running out of handles. Nothing is registered.
    pub fn reserve(&self, tests: &[TestIdentity], projects: &[ProjectCoverage]) -> Result<()> {
        let new_tests: HashSet<&TestIdentity> = tests
            .iter()
            .filter(|t| self.tests.lookup(*t).is_none())
            .collect();

        let mut new_files = HashSet::new();
        let mut new_lines = HashSet::new();
        for file in projects.iter().flat_map(ProjectCoverage::files) {
            let known = self.lookup_file(&file.path);
            if known.is_none() && !file.lines.is_empty() {
                new_files.insert(file.path.as_str());
            }
            for line in &file.lines {
                if known.and_then(|f| self.lookup_line(f, line.num)).is_none() {
                    new_lines.insert((file.path.as_str(), line.num));
                }
            }
        }

        self.tests.ensure_room(new_tests.len())?;
        self.files.ensure_room(new_files.len())?;
        self.lines.ensure_room(new_lines.len())
    }

    // === Queries ===

    pub fn summary(&self) -> IndexSummary {
        IndexSummary {
            files: self.files.len(),
            tests: self.tests.len(),
            lines: self.lines.len(),
            facts: self.facts.len(),
        }
    }

    pub fn width(&self) -> HandleWidth {
        self.files.width()
    }

    pub fn file_path(&self, file: Handle) -> Option<&str> {
        self.files.get(file).map(String::as_str)
    }

    pub fn test(&self, test: Handle) -> Option<&TestIdentity> {
        self.tests.get(test)
    }

    pub fn line(&self, line: Handle) -> Option<LineKey> {
        self.lines.get(line).copied()
    }

    pub fn lookup_file(&self, path: &str) -> Option<Handle> {
        self.files.lookup(path)
    }

    pub fn lookup_line(&self, file: Handle, num: u32) -> Option<Handle> {
        self.lines.lookup(&LineKey { file, num })
    }

    pub fn files(&self) -> impl Iterator<Item = (Handle, &str)> {
        self.files.iter().map(|(h, p)| (h, p.as_str()))
    }

    pub fn tests(&self) -> impl Iterator<Item = (Handle, &TestIdentity)> {
        self.tests.iter()
    }

    pub fn facts(&self) -> &[CoverageFact] {
        &self.facts
    }

    pub fn facts_for_line(&self, line: Handle) -> impl Iterator<Item = &CoverageFact> {
        self.facts.iter().filter(move |f| f.line == line)
    }

    /// Distinct lines a test has facts for, in handle order.
    pub fn test_lines(&self, test: Handle) -> Vec<Handle> {
        self.facts
            .iter()
            .filter(|f| f.test == test)
            .map(|f| f.line)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Every fact with its handles resolved, in insertion order.
    pub fn describe(&self) -> Vec<ResolvedFact> {
        self.facts
            .iter()
            .filter_map(|fact| self.resolve(fact))
            .collect()
    }

    fn resolve(&self, fact: &CoverageFact) -> Option<ResolvedFact> {
        let test = self.tests.get(fact.test)?;
        let line = self.lines.get(fact.line)?;
        let path = self.files.get(line.file)?;
        Some(ResolvedFact {
            test: test.clone(),
            path: path.clone(),
            line: line.num,
            info: fact.info,
        })
    }
}
