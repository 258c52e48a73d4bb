#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! One grading pass, from pre-flight checks to report delivery.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::{
    config::{GradePolicy, MetadataPolicy},
    error::GradeError,
    fingerprint,
    grade::{ModuleReports, ScoreTotal, ScoringEntry, TestAggregator, grade_style},
    identification::read_contributors,
    metadata::{MetadataResolver, PointManifest, scan_sources},
    report::{CommitBanner, Deliveries, GitBlock, Report, dispatch},
    vcs::{CommitGate, GitInspector, VcsInspector},
};

/// Builds the points table from the configured manifest and annotated
/// sources. Manifest entries win over annotations.
///
/// * `policy`: where metadata comes from
/// * `base`: directory relative paths are resolved against
pub fn load_metadata(policy: &MetadataPolicy, base: &Path) -> Result<PointManifest> {
    let mut manifest = PointManifest::new();

    if let Some(sources) = &policy.sources {
        let dir = base.join(sources);
        if dir.is_dir() {
            manifest.extend(scan_sources(&dir, &policy.include)?);
        } else {
            tracing::debug!("No annotated sources at {}", dir.display());
        }
    }
    if let Some(path) = &policy.manifest {
        manifest.extend(PointManifest::load(&base.join(path))?);
    }

    tracing::info!("{} graded test(s) found", manifest.len());
    Ok(manifest)
}

/// What a grading run produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// the report sent to every sink
    pub report:       Report,
    /// the score rose from uncommitted changes
    pub needs_commit: bool,
    /// the host must go down after this run
    pub teardown:     bool,
    /// what became of each sink
    pub deliveries:   Deliveries,
}

/// Grades one project directory under one policy.
pub struct Grader<'p> {
    /// the grading policy
    policy:      &'p GradePolicy,
    /// directory relative paths are resolved against
    project_dir: PathBuf,
    /// version control facts; git by default
    vcs:         Option<Box<dyn VcsInspector + 'p>>,
    /// point metadata; loaded from the policy by default
    resolver:    Option<Box<dyn MetadataResolver + 'p>>,
    /// tool output to include when the policy captures output
    output:      Option<String>,
}

impl<'p> Grader<'p> {
    /// Creates a grader for `project_dir`.
    pub fn new(policy: &'p GradePolicy, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            policy,
            project_dir: project_dir.into(),
            vcs: None,
            resolver: None,
            output: None,
        }
    }

    /// Uses `vcs` instead of inspecting the project's git repository.
    pub fn with_vcs(mut self, vcs: impl VcsInspector + 'p) -> Self {
        self.vcs = Some(Box::new(vcs));
        self
    }

    /// Uses `resolver` instead of the policy's metadata sources.
    pub fn with_resolver(mut self, resolver: impl MetadataResolver + 'p) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Tool output for the report's `output` field.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Runs every stage once, in order. Fatal problems stop the run before
    /// anything is graded; sink failures never do.
    pub async fn run(&self) -> Result<RunOutcome, GradeError> {
        let policy = self.policy;
        let base = self.project_dir.as_path();
        policy.validate()?;

        if policy.fingerprint.enabled {
            fingerprint::verify_tree(
                base,
                &base.join(&policy.fingerprint.root),
                &policy.fingerprint.include,
            )?;
        }

        let contributors = read_contributors(&policy.identification, base)?;
        let checkpoint = policy.current_checkpoint(base)?;

        let facts = if policy.vcs.git || policy.vcs.require_commit {
            let facts = match &self.vcs {
                Some(vcs) => vcs.inspect()?,
                None => GitInspector::new(base).inspect()?,
            };
            Some(facts)
        } else {
            None
        };

        let gate = match (&facts, policy.vcs.require_commit) {
            (Some(facts), true) => {
                CommitGate::open(&base.join(&policy.vcs.score_file), checkpoint.clone(), facts)
            }
            _ => None,
        };
        if let Some(gate) = &gate {
            gate.check()?;
        }

        let loaded;
        let resolver: &dyn MetadataResolver = match &self.resolver {
            Some(resolver) => &**resolver,
            None => {
                loaded = load_metadata(&policy.metadata, base)?;
                &loaded
            }
        };

        tracing::info!("Grading {} module(s)", policy.modules.len());
        let modules = policy
            .modules
            .iter()
            .map(|m| ModuleReports::read_dir(m.name.as_str(), &base.join(&m.reports)))
            .collect::<Vec<_>>();
        let tally = TestAggregator::new(resolver).aggregate(&modules);

        let mut scores = tally.entries;
        let mut points_possible = tally.points_possible;
        let mut points_earned = tally.points_earned;
        let mut teardown = false;

        if policy.checkstyle.enabled {
            let style = grade_style(&base.join(&policy.checkstyle.report), policy.checkstyle.points);
            points_possible += style.points_possible;
            points_earned += style.points_earned;
            teardown = style.teardown_required();
            scores.push(ScoringEntry::Style(style));
        }

        let total = ScoreTotal::new(points_earned, points_possible).capped(policy.max_points);
        tracing::info!("Score: {total}");

        let update = gate.map(|g| g.record_score(total.points_earned)).transpose()?;
        let banner = update
            .as_ref()
            .filter(|u| u.needs_commit)
            .map(|u| CommitBanner {
                previous_best: u.previous_best,
                points_earned: total.points_earned,
            });

        let report = Report::builder()
            .tags(policy.reporting.tags.clone())
            .modules(tally.modules)
            .scores(scores)
            .total(total)
            .assignment(policy.assignment.clone().unwrap_or_default())
            .checkpoint(checkpoint)
            .contributors(contributors)
            .output(self.output.clone().filter(|_| policy.capture_output))
            .git(facts.as_ref().filter(|_| policy.vcs.git).map(GitBlock::from))
            .build();

        let deliveries = dispatch(&report, policy, banner, base).await;

        Ok(RunOutcome {
            report,
            needs_commit: banner.is_some(),
            teardown,
            deliveries,
        })
    }
}
