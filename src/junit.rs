//! Test result reports
//!
//! `<testsuites>` / `<testsuite>` / `<testcase>` / `<failure>` documents. Suite
//! counters are copied from the report as-is; they are never recomputed from
//! the cases, so an inconsistent report stays inconsistent here.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CovxError, Result};
use crate::xml::{self, XmlNode};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReport {
    pub suites: Vec<TestSuite>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSuite {
    pub name: String,
    pub tests: u32,
    pub errors: u32,
    pub failures: u32,
    /// True when the `failures` attribute is non-zero
    pub failed: bool,
    pub cases: Vec<TestCase>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub failures: Vec<TestFailure>,
}

impl TestCase {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestFailure {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    /// Text content of the `<failure>` element
    pub data: String,
}

impl TestReport {
    /// Sum of the suites' reported `tests` counters.
    pub fn total_tests(&self) -> u32 {
        self.suites.iter().map(|s| s.tests).sum()
    }

    /// Cases with at least one failure, paired with their suite.
    pub fn failing_cases(&self) -> impl Iterator<Item = (&TestSuite, &TestCase)> {
        self.suites
            .iter()
            .flat_map(|s| s.cases.iter().map(move |c| (s, c)))
            .filter(|(_, c)| !c.passed())
    }
}

/// Parse a test result file
pub fn parse_test_results(path: &Path) -> Result<TestReport> {
    let root = xml::read_document(path)?;
    build_report(&root)
}

/// Parse test result XML content from a string
pub fn parse_test_results_string(content: &str) -> Result<TestReport> {
    let root = xml::parse_document(content)?;
    build_report(&root)
}

pub fn build_report(root: &XmlNode) -> Result<TestReport> {
    if root.name != "testsuites" {
        return Err(CovxError::UnrecognizedFormat(format!(
            "expected <testsuites> root, found <{}>",
            root.name
        )));
    }

    Ok(TestReport {
        suites: root.children_named("testsuite").map(parse_suite).collect(),
    })
}

fn parse_suite(node: &XmlNode) -> TestSuite {
    TestSuite {
        name: node.attr_string("name"),
        tests: node.attr_u32("tests"),
        errors: node.attr_u32("errors"),
        failures: node.attr_u32("failures"),
        // Negative counters are not valid counts but still mark the suite failed.
        failed: node.attr_i64("failures") != 0,
        cases: node.children_named("testcase").map(parse_case).collect(),
    }
}

fn parse_case(node: &XmlNode) -> TestCase {
    TestCase {
        name: node.attr_string("name"),
        failures: node.children_named("failure").map(parse_failure).collect(),
    }
}

fn parse_failure(node: &XmlNode) -> TestFailure {
    TestFailure {
        kind: node.attr_string("type"),
        message: node.attr_string("message"),
        data: node.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_test_results() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<testsuites>
    <testsuite name="CartTest" tests="3" failures="1" errors="0">
        <testcase name="testAdd"/>
        <testcase name="testRemove">
            <failure message="assertion failed" type="AssertionError">Expected 1 but got 2</failure>
        </testcase>
        <testcase name="testClear"/>
    </testsuite>
    <testsuite name="ItemTest" tests="1" failures="0" errors="0">
        <testcase name="testPrice"/>
    </testsuite>
</testsuites>"#;

        let report = parse_test_results_string(xml).unwrap();
        assert_eq!(report.suites.len(), 2);
        assert_eq!(report.total_tests(), 4);

        let suite = &report.suites[0];
        assert_eq!(suite.name, "CartTest");
        assert_eq!(suite.cases.len(), 3);
        assert!(suite.failed);
        assert!(!report.suites[1].failed);

        let failure = &suite.cases[1].failures[0];
        assert_eq!(failure.kind, "AssertionError");
        assert_eq!(failure.message, "assertion failed");
        assert_eq!(failure.data, "Expected 1 but got 2");

        let failing: Vec<_> = report
            .failing_cases()
            .map(|(s, c)| format!("{}::{}", s.name, c.name))
            .collect();
        assert_eq!(failing, vec!["CartTest::testRemove"]);
    }

    #[test]
    fn test_counts_are_not_recomputed() {
        let xml = r#"<testsuites>
    <testsuite name="Liar" tests="10" failures="0" errors="4">
        <testcase name="a"><failure type="E" message="boom"/></testcase>
    </testsuite>
</testsuites>"#;

        let report = parse_test_results_string(xml).unwrap();
        let suite = &report.suites[0];
        assert_eq!(suite.tests, 10);
        assert_eq!(suite.errors, 4);
        assert_eq!(suite.failures, 0);
        assert!(!suite.failed);
        assert_eq!(suite.cases.len(), 1);
        assert_eq!(suite.cases[0].failures.len(), 1);
        assert_eq!(suite.cases[0].failures[0].data, "");
    }

    #[test]
    fn test_cdata_failure() {
        let xml = r#"<testsuites>
  <testsuite name="s">
    <testcase name="c"><failure type="T"><![CDATA[line 1 < line 2]]></failure></testcase>
  </testsuite>
</testsuites>"#;
        let report = parse_test_results_string(xml).unwrap();
        assert_eq!(report.suites[0].cases[0].failures[0].data, "line 1 < line 2");
        assert_eq!(report.suites[0].tests, 0);
    }

    #[test]
    fn test_negative_failures_marks_suite_failed() {
        let xml = r#"<testsuites><testsuite name="s" failures="-1"/></testsuites>"#;
        let suite = &parse_test_results_string(xml).unwrap().suites[0];
        assert_eq!(suite.failures, 0);
        assert!(suite.failed);
    }

    #[test]
    fn test_missing_testsuites_root() {
        let xml = r#"<testsuite name="MyTests" tests="1"><testcase name="a"/></testsuite>"#;
        let err = parse_test_results_string(xml).unwrap_err();
        assert!(matches!(err, CovxError::UnrecognizedFormat(_)));
    }

    #[test]
    fn test_malformed() {
        let err = parse_test_results_string("<testsuites><testsuite>").unwrap_err();
        assert!(matches!(err, CovxError::MalformedInput(_)));
    }

    #[test]
    fn test_parse_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.xml");
        std::fs::write(&path, "<testsuites/>").unwrap();

        let report = parse_test_results(&path).unwrap();
        assert!(report.suites.is_empty());
    }
}
