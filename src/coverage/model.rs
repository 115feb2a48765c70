//! Coverage tree definitions
//!
//! A one-to-one image of a single Clover report. Nothing here is deduplicated;
//! the tree is built once per report and not modified afterwards.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::{ClassMetrics, CoverageInfo, CoverageKind, FileMetrics, PackageMetrics, ProjectMetrics};

/// A `<project>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCoverage {
    pub name: String,
    /// Raw `timestamp` attribute, see [`ProjectCoverage::generated_at`]
    pub timestamp: String,
    /// `<metrics>` as reported, never recomputed
    pub metrics: Option<ProjectMetrics>,
    pub packages: Vec<PackageCoverage>,
}

impl ProjectCoverage {
    /// Iterate over every file of every package.
    pub fn files(&self) -> impl Iterator<Item = &FileCoverage> {
        self.packages.iter().flat_map(|p| p.files.iter())
    }

    /// Every file whose path equals `path`.
    pub fn find_files<'a>(
        &'a self,
        path: &'a str,
    ) -> impl Iterator<Item = &'a FileCoverage> + 'a {
        self.files().filter(move |f| f.path == path)
    }

    /// First file whose path equals `path`. The result borrows only `self`.
    pub fn find_file(&self, path: &str) -> Option<&FileCoverage> {
        self.files().find(|f| f.path == path)
    }

    pub fn line_count(&self) -> usize {
        self.files().map(|f| f.lines.len()).sum()
    }

    /// The report timestamp as a date.
    ///
    /// Clover writers emit epoch seconds or epoch milliseconds; values above
    /// `10^11` are read as milliseconds.
    pub fn generated_at(&self) -> Option<DateTime<Utc>> {
        let raw: i64 = self.timestamp.trim().parse().ok()?;
        if raw.unsigned_abs() >= 100_000_000_000 {
            Utc.timestamp_millis_opt(raw).single()
        } else {
            Utc.timestamp_opt(raw, 0).single()
        }
    }
}

/// A `<package>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageCoverage {
    pub name: String,
    pub metrics: Option<PackageMetrics>,
    pub files: Vec<FileCoverage>,
}

/// A `<file>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCoverage {
    pub path: String,
    pub name: String,
    pub metrics: Option<FileMetrics>,
    pub classes: Vec<ClassCoverage>,
    pub lines: Vec<LineRecord>,
}

/// A `<class>` element
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCoverage {
    pub name: String,
    pub metrics: Option<ClassMetrics>,
}

/// A `<line>` element
///
/// `count` is only read for statements and methods, `true_count` and
/// `false_count` only for conditionals. The other fields stay zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    pub num: u32,
    pub kind: CoverageKind,
    pub count: u32,
    pub true_count: u32,
    pub false_count: u32,
}

impl LineRecord {
    pub fn info(&self) -> CoverageInfo {
        CoverageInfo {
            kind: self.kind,
            count: self.count,
            true_count: self.true_count,
            false_count: self.false_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, lines: usize) -> FileCoverage {
        FileCoverage {
            path: path.to_string(),
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            lines: (0..lines)
                .map(|i| LineRecord {
                    num: i as u32 + 1,
                    kind: CoverageKind::Statement,
                    count: 1,
                    true_count: 0,
                    false_count: 0,
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_find_file() {
        let project = ProjectCoverage {
            name: "demo".into(),
            packages: vec![
                PackageCoverage {
                    name: "a".into(),
                    files: vec![file("src/a/one.php", 2)],
                    ..Default::default()
                },
                PackageCoverage {
                    name: "b".into(),
                    files: vec![file("src/b/two.php", 3), file("src/b/three.php", 1)],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        assert_eq!(project.files().count(), 3);
        assert_eq!(project.line_count(), 6);
        assert_eq!(project.find_file("src/b/two.php").unwrap().lines.len(), 3);
        assert!(project.find_file("src/c.php").is_none());

        let found = {
            let wanted = String::from("src/a/one.php");
            project.find_file(&wanted)
        };
        assert_eq!(found.map(|f| f.lines.len()), Some(2));
        assert_eq!(project.find_files("src/b/three.php").count(), 1);
    }

    #[test]
    fn test_generated_at() {
        let mut project = ProjectCoverage {
            timestamp: "1700000000".into(),
            ..Default::default()
        };
        assert_eq!(project.generated_at().unwrap().timestamp(), 1_700_000_000);

        project.timestamp = "1700000000123".into();
        assert_eq!(
            project.generated_at().unwrap().timestamp_millis(),
            1_700_000_000_123
        );

        project.timestamp = "-9223372036854775808".into();
        assert!(project.generated_at().is_none());

        project.timestamp = "yesterday".into();
        assert!(project.generated_at().is_none());
    }
}
