#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Stops students from re-running the grader on the same uncommitted changes
//! once those changes raised their score. They have to commit first.
//!
//! Any new commit satisfies the gate, whether or not it contains the change
//! that raised the score.

use std::path::{Path, PathBuf};

use anyhow::Context;

use super::{CheckpointScoreRecord, ScoreHistory, VcsFacts};
use crate::error::GradeError;

/// Refuses to grade when the last run raised the score from uncommitted
/// changes and nothing was committed since.
///
/// * `record`: the checkpoint's record as loaded at the start of the run
/// * `head`: current commit id
/// * `clean`: whether the working tree has no changes
pub fn pre_check(record: &CheckpointScoreRecord, head: &str, clean: bool) -> Result<(), GradeError> {
    if record.increased && record.last_seen_commit.as_deref() == Some(head) && !clean {
        return Err(GradeError::CommitRequired {
            checkpoint: record.checkpoint.clone(),
            commit:     head.to_string(),
        });
    }
    Ok(())
}

/// Result of recording a run's score.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateUpdate {
    /// the score went up from uncommitted changes
    pub needs_commit:  bool,
    /// best score before this run
    pub previous_best: u32,
    /// the record to store
    pub record:        CheckpointScoreRecord,
}

/// Computes the checkpoint's next record from this run's capped score.
pub fn post_update(
    record: &CheckpointScoreRecord,
    head: &str,
    clean: bool,
    points_earned: u32,
) -> GateUpdate {
    let needs_commit = points_earned > record.max_score && !clean;

    GateUpdate {
        needs_commit,
        previous_best: record.max_score,
        record: CheckpointScoreRecord {
            checkpoint:       record.checkpoint.clone(),
            last_seen_commit: Some(head.to_string()),
            max_score:        points_earned.max(record.max_score),
            increased:        needs_commit,
        },
    }
}

/// The gate for one run: loads the history once, checks it before grading,
/// and writes it back once after.
#[derive(Debug)]
pub struct CommitGate {
    /// where the history lives
    path:       PathBuf,
    /// history as loaded at the start of the run
    history:    ScoreHistory,
    /// checkpoint being graded
    checkpoint: Option<String>,
    /// current commit id
    head:       String,
    /// whether the working tree is clean
    clean:      bool,
}

impl CommitGate {
    /// Loads the score history for a run.
    ///
    /// Returns `None` when there is no commit yet; a repository without
    /// commits can't be gated.
    pub fn open(path: &Path, checkpoint: Option<String>, facts: &VcsFacts) -> Option<Self> {
        let head = facts.head.clone().filter(|h| !h.is_empty())?;

        Some(Self {
            path: path.to_path_buf(),
            history: ScoreHistory::load(path),
            checkpoint,
            head,
            clean: facts.clean,
        })
    }

    /// The checkpoint's record as loaded.
    pub fn record(&self) -> CheckpointScoreRecord {
        self.history.record_for(self.checkpoint.as_deref())
    }

    /// Runs [`pre_check`] against the loaded record.
    pub fn check(&self) -> Result<(), GradeError> {
        pre_check(&self.record(), &self.head, self.clean)
    }

    /// Records the run's capped score and persists the whole history.
    pub fn record_score(mut self, points_earned: u32) -> Result<GateUpdate, GradeError> {
        let update = post_update(&self.record(), &self.head, self.clean, points_earned);

        self.history.set(update.record.clone());
        self.history
            .persist(&self.path)
            .context("Could not save the score history")?;

        if update.needs_commit {
            tracing::info!(
                "Score rose from {} to {points_earned} on uncommitted changes",
                update.previous_best
            );
        }
        Ok(update)
    }
}
