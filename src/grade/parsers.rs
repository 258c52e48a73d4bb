#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use quick_xml::{Reader, events::Event};
use serde::Deserialize;

/// Text content of a `<failure>`, `<error>` or `<skipped>` marker.
#[derive(Deserialize, Default, Debug)]
struct MarkerXml {
    /// short message attribute
    #[serde(rename = "@message", default)]
    message: Option<String>,
    /// element body, usually a stack trace
    #[serde(rename = "$text", default)]
    text:    Option<String>,
}

impl MarkerXml {
    /// The most informative text this marker carries.
    fn into_text(self) -> String {
        self.text
            .filter(|t| !t.trim().is_empty())
            .or(self.message)
            .unwrap_or_default()
    }
}

/// A `<testcase>` element.
#[derive(Deserialize, Debug)]
struct TestCaseXml {
    /// test case name, parameters included
    #[serde(rename = "@name")]
    name:    String,
    /// assertion failures
    #[serde(default)]
    failure: Vec<MarkerXml>,
    /// unexpected exceptions
    #[serde(default)]
    error:   Vec<MarkerXml>,
    /// skipped/disabled markers
    #[serde(default)]
    skipped: Vec<MarkerXml>,
}

/// A `<testsuite>` document.
#[derive(Deserialize, Debug)]
struct TestSuiteXml {
    /// fully qualified suite name
    #[serde(rename = "@name")]
    name:  String,
    /// test cases in report order
    #[serde(rename = "testcase", default)]
    cases: Vec<TestCaseXml>,
}

/// A `<testsuites>` wrapper some runners emit instead of a bare suite.
#[derive(Deserialize, Debug)]
struct TestSuitesXml {
    /// wrapped suites
    #[serde(rename = "testsuite", default)]
    suites: Vec<TestSuiteXml>,
}

/// One test case as reported by the test runner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaseRecord {
    /// test case name, parameters included
    pub name:    String,
    /// failure or error text, if the test failed
    pub failure: Option<String>,
    /// whether the runner skipped the test
    pub skipped: bool,
}

impl CaseRecord {
    /// A test passes when it neither failed nor was skipped.
    pub fn passed(&self) -> bool {
        self.failure.is_none() && !self.skipped
    }
}

/// The results of one test suite.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuiteReport {
    /// fully qualified suite name
    pub suite: String,
    /// test cases in report order
    pub cases: Vec<CaseRecord>,
}

impl From<TestSuiteXml> for SuiteReport {
    fn from(xml: TestSuiteXml) -> Self {
        let cases = xml
            .cases
            .into_iter()
            .map(|case| {
                let skipped = !case.skipped.is_empty();
                let failure = case
                    .failure
                    .into_iter()
                    .chain(case.error)
                    .next()
                    .map(MarkerXml::into_text);
                CaseRecord {
                    name: case.name,
                    failure,
                    skipped,
                }
            })
            .collect();

        SuiteReport {
            suite: xml.name,
            cases,
        }
    }
}

/// Name of the document's root element.
fn root_element(xml: &str) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().context("Malformed test report")? {
            Event::Start(e) | Event::Empty(e) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Eof => anyhow::bail!("Test report has no root element"),
            _ => {}
        }
    }
}

/// Parses a JUnit XML report into one or more suite reports.
pub fn parse_test_report(xml: &str) -> Result<Vec<SuiteReport>> {
    match root_element(xml)?.as_str() {
        "testsuites" => {
            let suites: TestSuitesXml =
                quick_xml::de::from_str(xml).context("Malformed <testsuites> report")?;
            Ok(suites.suites.into_iter().map(SuiteReport::from).collect())
        }
        "testsuite" => {
            let suite: TestSuiteXml =
                quick_xml::de::from_str(xml).context("Malformed <testsuite> report")?;
            Ok(vec![suite.into()])
        }
        other => anyhow::bail!("Unexpected <{other}> root in test report"),
    }
}

/// XML report files in `dir`, sorted by name.
fn report_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Could not read report directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "xml"))
        .collect();
    files.sort();
    Ok(files)
}

/// All test reports produced for one module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleReports {
    /// module name
    pub module:  String,
    /// parsed suite reports; empty when the module didn't compile
    pub reports: Vec<SuiteReport>,
}

impl ModuleReports {
    /// Wraps already parsed reports.
    pub fn new(module: impl Into<String>, reports: Vec<SuiteReport>) -> Self {
        Self {
            module: module.into(),
            reports,
        }
    }

    /// A module compiled if its tests produced at least one report.
    pub fn compiled(&self) -> bool {
        !self.reports.is_empty()
    }

    /// Reads every `*.xml` report in `dir`.
    ///
    /// A missing directory or any malformed report leaves the module with no
    /// reports, which grades it as not compiled.
    pub fn read_dir(module: impl Into<String>, dir: &Path) -> Self {
        let module = module.into();

        let read = || -> Result<Vec<SuiteReport>> {
            let mut reports = vec![];
            for file in report_files(dir)? {
                let xml = std::fs::read_to_string(&file)
                    .with_context(|| format!("Could not read {}", file.display()))?;
                reports.extend(
                    parse_test_report(&xml)
                        .with_context(|| format!("While parsing {}", file.display()))?,
                );
            }
            Ok(reports)
        };

        match read() {
            Ok(reports) => {
                tracing::debug!("{module}: {} suite report(s)", reports.len());
                Self::new(module, reports)
            }
            Err(e) => {
                tracing::warn!("Treating {module} as not compiled: {e:#}");
                Self::new(module, vec![])
            }
        }
    }
}

/// A single `<error>` entry of a checkstyle report.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StyleViolation {
    /// line the violation is on
    #[serde(rename = "@line", default)]
    pub line:     Option<u32>,
    /// severity, usually `error` or `warning`
    #[serde(rename = "@severity", default)]
    pub severity: Option<String>,
    /// checker message
    #[serde(rename = "@message", default)]
    pub message:  Option<String>,
}

/// A `<file>` section of a checkstyle report.
#[derive(Deserialize, Debug)]
struct StyleFileXml {
    /// path of the checked file
    #[serde(rename = "@name", default)]
    name:   String,
    /// violations in that file
    #[serde(rename = "error", default)]
    errors: Vec<StyleViolation>,
}

/// A checkstyle XML report.
#[derive(Deserialize, Debug)]
struct StyleReportXml {
    /// per-file sections
    #[serde(rename = "file", default)]
    files:  Vec<StyleFileXml>,
    /// errors reported outside any file section
    #[serde(rename = "error", default)]
    errors: Vec<StyleViolation>,
}

/// Violations found by the style checker, with the file each belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleReport {
    /// `(file, violation)` pairs; file is empty for report-level errors
    pub violations: Vec<(String, StyleViolation)>,
}

impl StyleReport {
    /// Number of recorded `<error>` entries.
    pub fn error_count(&self) -> usize {
        self.violations.len()
    }
}

/// Parses a checkstyle XML report.
pub fn parse_style_report(xml: &str) -> Result<StyleReport> {
    let report: StyleReportXml =
        quick_xml::de::from_str(xml).context("Malformed checkstyle report")?;

    let violations = report
        .files
        .into_iter()
        .flat_map(|f| {
            let name = f.name;
            f.errors.into_iter().map(move |e| (name.clone(), e))
        })
        .chain(report.errors.into_iter().map(|e| (String::new(), e)))
        .collect();

    Ok(StyleReport { violations })
}
