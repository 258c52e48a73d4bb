#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// JUnit and checkstyle XML report readers.
pub mod parsers;
/// Shared grade result types.
pub mod results;
/// Style check grading.
pub mod style;

pub use parsers::{CaseRecord, ModuleReports, SuiteReport, parse_style_report, parse_test_report};
pub use results::{
    CompileFailure, ModuleResult, ScoreTotal, ScoringEntry, StyleResult, TagValue, Tags,
    TestCaseResult, serialize_tags_except,
};
pub use style::grade_style;
pub use tests::{TestAggregator, TestTally, method_name};
