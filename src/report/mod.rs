#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// JSON file and stdout sinks.
pub mod json;
/// Networked sink.
pub mod post;
/// Fixed-width human-readable sink.
pub mod pretty;

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use serde::Serialize;
use typed_builder::TypedBuilder;

pub use post::{IncludedFile, collect_files, post_report};
pub use pretty::{CommitBanner, render, wrap};

use crate::{
    config::GradePolicy,
    grade::{ModuleResult, ScoreTotal, ScoringEntry, Tags, serialize_tags_except},
    vcs::{VcsFacts, VcsUser},
};

/// Repository details included in the report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GitBlock {
    /// remote name -> url
    pub remotes: BTreeMap<String, String>,
    /// committer identity
    pub user:    VcsUser,
    /// graded commit
    pub head:    Option<String>,
}

impl From<&VcsFacts> for GitBlock {
    fn from(facts: &VcsFacts) -> Self {
        Self {
            remotes: facts.remotes.clone(),
            user:    facts.user.clone(),
            head:    facts.head.clone(),
        }
    }
}

/// Keys of a serialized report.
const REPORT_FIELDS: &[&str] = &[
    "modules",
    "scores",
    "pointsPossible",
    "pointsEarned",
    "rawPointsEarned",
    "assignment",
    "checkpoint",
    "contributors",
    "output",
    "git",
    "files",
];

/// Report tags, minus the ones that would shadow its fields.
fn serialize_report_tags<S: serde::Serializer>(
    tags: &Tags,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serialize_tags_except(tags, REPORT_FIELDS, serializer)
}

#[derive(Clone, Debug, PartialEq, Serialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
/// The final result of a grading run, as sent to every sink.
pub struct Report {
    /// * `tags`: custom fields, written at the top level
    #[builder(default)]
    #[serde(flatten, serialize_with = "serialize_report_tags")]
    pub tags:         Tags,
    /// * `modules`: per-module compile status
    pub modules:      Vec<ModuleResult>,
    /// * `scores`: scored rows, in grading order
    pub scores:       Vec<ScoringEntry>,
    /// * `total`: capped totals, written as top-level fields
    #[serde(flatten)]
    pub total:        ScoreTotal,
    /// * `assignment`: assignment id
    #[builder(setter(into))]
    pub assignment:   String,
    /// * `checkpoint`: checkpoint being graded
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint:   Option<String>,
    /// * `contributors`: identified contributors
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributors: Option<Vec<String>>,
    /// * `output`: captured tool output
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output:       Option<String>,
    /// * `git`: repository details
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git:          Option<GitBlock>,
    /// * `files`: embedded file contents; only the networked report has them
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files:        Option<Vec<IncludedFile>>,
}

impl Report {
    /// Compact JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Could not serialize the report")
    }

    /// A copy carrying `files`, for the networked sink.
    pub fn with_files(&self, files: Vec<IncludedFile>) -> Self {
        Self {
            files: Some(files),
            ..self.clone()
        }
    }
}

/// What became of one sink's output. Sink failures never fail a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// the output was written or sent
    Delivered,
    /// the sink is not configured
    Skipped,
    /// the sink failed; the reason was logged
    Failed(String),
}

impl Delivery {
    /// Turns a sink's result into an outcome, logging failures.
    pub fn from_result(sink: &str, result: Result<()>) -> Self {
        match result {
            Ok(()) => Delivery::Delivered,
            Err(e) => {
                tracing::warn!("{sink} report failed: {e:#}");
                Delivery::Failed(format!("{e:#}"))
            }
        }
    }
}

/// Outcome of every sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Deliveries {
    /// JSON file
    pub json_file:   Delivery,
    /// JSON on stdout
    pub json_stdout: Delivery,
    /// human-readable table on stdout
    pub pretty:      Delivery,
    /// POST to the collection endpoint
    pub post:        Delivery,
}

/// Sends `report` to every configured sink. Each sink is independent; none
/// can fail another or the run.
///
/// * `report`: the report to send
/// * `policy`: which sinks are on
/// * `banner`: commit reminder for the pretty report
/// * `base`: directory relative paths are resolved against
pub async fn dispatch(
    report: &Report,
    policy: &GradePolicy,
    banner: Option<CommitBanner>,
    base: &Path,
) -> Deliveries {
    let reporting = &policy.reporting;

    let (json_file, json_stdout) = match report.to_json() {
        Ok(body) => (
            match &reporting.json_file {
                Some(path) => json::write_file(&body, &base.join(path)),
                None => Delivery::Skipped,
            },
            if reporting.print_json {
                json::print(&body)
            } else {
                Delivery::Skipped
            },
        ),
        Err(e) => {
            let failed = Delivery::from_result("JSON", Err(e));
            (failed.clone(), failed)
        }
    };

    let pretty = if reporting.print_pretty.enabled {
        pretty::print(&render(report, &reporting.print_pretty, banner))
    } else {
        Delivery::Skipped
    };

    let post = match &reporting.post.endpoint {
        Some(endpoint) => {
            let files = collect_files(&reporting.post.include_files, base);
            let report = if reporting.post.include_files.is_empty() {
                report.clone()
            } else {
                report.with_files(files)
            };
            post_report(endpoint, &report, policy.post_timeout()).await
        }
        None => Delivery::Skipped,
    };

    Deliveries {
        json_file,
        json_stdout,
        pretty,
        post,
    }
}
