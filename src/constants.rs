#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Prefix of the line that carries a test file's embedded fingerprint.
pub const FINGERPRINT_PREFIX: &str = "// md5: ";

/// Default directory searched for fingerprinted test suites.
pub const DEFAULT_TEST_ROOT: &str = "src/test";

/// Default glob patterns (relative to the test root) for test suite sources.
pub const DEFAULT_TEST_PATTERNS: [&str; 2] = ["**/*Test.java", "**/*Test.kt"];

/// Default location of the persisted score history.
pub const DEFAULT_SCORE_FILE: &str = "config/.score.json";

/// Default grading policy file name.
pub const DEFAULT_POLICY_FILE: &str = "grade.yaml";

/// Environment variable prefix for policy overrides.
pub const POLICY_ENV_PREFIX: &str = "GRADER_";

/// Width of the horizontal rules and the note wrapping in the pretty report.
pub const REPORT_WIDTH: usize = 80;

/// Number of description characters shown in the pretty report.
pub const DESCRIPTION_WIDTH: usize = 30;

/// Column width for points in the pretty report.
pub const POINTS_WIDTH: usize = 5;

/// Default timeout, in seconds, for the POST report sink.
pub const DEFAULT_POST_TIMEOUT_SECS: u64 = 10;

/// Default port for the report ingestion server.
pub const DEFAULT_SERVER_PORT: u16 = 8181;

/// Tree-sitter query that returns the package name of a Java file
/// * `name`: dotted package name
pub const PACKAGE_QUERY: &str = include_str!("metadata/queries/package.scm");
