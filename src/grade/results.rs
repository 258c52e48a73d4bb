#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize, Serializer};
use typed_builder::TypedBuilder;

/// A tag value attached to a test case or to the whole report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    /// An integer tag, eg. a course week.
    Int(i64),
    /// A free-form string tag.
    Text(String),
}

impl Display for TagValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagValue::Int(i) => write!(f, "{i}"),
            TagValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Text(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Text(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

/// Tags keyed by name; sorted so reports are stable.
pub type Tags = BTreeMap<String, TagValue>;

/// Writes flattened tags, leaving out any whose name is one of the
/// `reserved` keys of the enclosing object.
pub fn serialize_tags_except<S: Serializer>(
    tags: &Tags,
    reserved: &[&str],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(tags.iter().filter(|(name, _)| !reserved.contains(&name.as_str())))
}

/// Keys of a serialized test case row.
const TEST_CASE_FIELDS: &[&str] = &[
    "type",
    "module",
    "className",
    "testCase",
    "passed",
    "pointsPossible",
    "pointsEarned",
    "description",
    "explanation",
    "failureStackTrace",
];

/// Tags of a test case row, minus the ones that would shadow its fields.
fn serialize_case_tags<S: Serializer>(tags: &Tags, serializer: S) -> Result<S::Ok, S::Error> {
    serialize_tags_except(tags, TEST_CASE_FIELDS, serializer)
}

#[derive(Clone, Debug, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[builder(field_defaults(setter(into)))]
#[serde(rename_all = "camelCase")]
/// Score for one graded test case.
pub struct TestCaseResult {
    /// * `module`: module (sub-project) the test belongs to
    pub module:              String,
    /// * `class_name`: fully qualified test suite name
    pub class_name:          String,
    /// * `test_case`: test case name as reported, parameters included
    pub test_case:           String,
    /// * `passed`: neither failed nor skipped
    pub passed:              bool,
    /// * `points_possible`: points the test is worth
    pub points_possible:     u32,
    /// * `points_earned`: `points_possible` if passed, otherwise 0
    pub points_earned:       u32,
    /// * `description`: friendly name, or the method name
    pub description:         String,
    /// * `explanation`: `<test> passed` or `<test> failed`
    pub explanation:         String,
    /// * `failure_stack_trace`: failure output, for failed tests only
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_stack_trace: Option<String>,
    /// * `tags`: tags declared on the test method
    #[builder(default)]
    #[serde(flatten, serialize_with = "serialize_case_tags")]
    pub tags:                Tags,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Placeholder line item for a module that produced no test reports.
pub struct CompileFailure {
    /// module that failed to compile
    pub module:          String,
    /// always "Compiler"
    pub description:     String,
    /// `<module> didn't compile`
    pub explanation:     String,
    /// always zero
    pub points_possible: u32,
    /// always zero
    pub points_earned:   u32,
}

impl CompileFailure {
    /// Creates the zero-point line item for `module`.
    pub fn new(module: impl Into<String>) -> Self {
        let module = module.into();
        Self {
            explanation: format!("{module} didn't compile"),
            description: "Compiler".to_string(),
            module,
            points_possible: 0,
            points_earned: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Outcome of folding a style-checker report into a line item.
pub struct StyleResult {
    /// the style tool left a usable report behind
    pub ran:             bool,
    /// zero errors were reported
    pub passed:          bool,
    /// configured points if passed, otherwise 0
    pub points_earned:   u32,
    /// configured points
    pub points_possible: u32,
    /// always "checkstyle"
    pub description:     String,
    /// human-readable reason
    pub explanation:     String,
}

impl StyleResult {
    /// A crashed style tool leaks its report file, so the host process has to
    /// go down after this run.
    pub fn teardown_required(&self) -> bool {
        !self.ran
    }
}

/// A single scored row of the report.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScoringEntry {
    /// A graded test case.
    #[serde(rename = "test")]
    Test(TestCaseResult),
    /// A module that did not compile.
    #[serde(rename = "compileError")]
    CompileError(CompileFailure),
    /// The style check.
    #[serde(rename = "checkstyle")]
    Style(StyleResult),
}

impl ScoringEntry {
    /// Text shown in the first column of the pretty report.
    pub fn description(&self) -> &str {
        match self {
            ScoringEntry::Test(t) => &t.description,
            ScoringEntry::CompileError(c) => &c.description,
            ScoringEntry::Style(s) => &s.description,
        }
    }

    /// Why the points were (not) awarded.
    pub fn explanation(&self) -> &str {
        match self {
            ScoringEntry::Test(t) => &t.explanation,
            ScoringEntry::CompileError(c) => &c.explanation,
            ScoringEntry::Style(s) => &s.explanation,
        }
    }

    /// Points earned by this row.
    pub fn points_earned(&self) -> u32 {
        match self {
            ScoringEntry::Test(t) => t.points_earned,
            ScoringEntry::CompileError(c) => c.points_earned,
            ScoringEntry::Style(s) => s.points_earned,
        }
    }

    /// Points this row is worth.
    pub fn points_possible(&self) -> u32 {
        match self {
            ScoringEntry::Test(t) => t.points_possible,
            ScoringEntry::CompileError(c) => c.points_possible,
            ScoringEntry::Style(s) => s.points_possible,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
/// Whether a module produced any test reports.
pub struct ModuleResult {
    /// module name
    pub name:     String,
    /// false when no test reports were produced
    pub compiled: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// Points for the whole run.
pub struct ScoreTotal {
    /// total points possible
    pub points_possible:   u32,
    /// total points earned
    pub points_earned:     u32,
    /// earned points before capping; set only when the cap lowered them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_points_earned: Option<u32>,
}

impl ScoreTotal {
    /// Creates an uncapped total.
    pub fn new(points_earned: u32, points_possible: u32) -> Self {
        Self {
            points_possible,
            points_earned,
            raw_points_earned: None,
        }
    }

    /// Applies the optional maximum-points ceiling.
    ///
    /// With a maximum, `points_possible` becomes the maximum and earned points
    /// above it are clamped, remembering the raw value.
    pub fn capped(self, max_points: Option<u32>) -> Self {
        let Some(max) = max_points else {
            return self;
        };

        if self.points_earned > max {
            Self {
                points_possible:   max,
                points_earned:     max,
                raw_points_earned: Some(self.points_earned),
            }
        } else {
            Self {
                points_possible: max,
                ..self
            }
        }
    }
}

impl Display for ScoreTotal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.points_earned, self.points_possible)
    }
}
