#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// The commit-before-regrading state machine.
pub mod gate;
/// git2-backed repository inspection.
pub mod git;
/// Persisted per-checkpoint best scores.
pub mod history;

use std::collections::BTreeMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub use gate::{CommitGate, GateUpdate, post_update, pre_check};
pub use git::GitInspector;
pub use history::{CheckpointScoreRecord, ScoreHistory};

/// Committer identity from the repository configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsUser {
    /// `user.name`
    pub name:  Option<String>,
    /// `user.email`
    pub email: Option<String>,
}

/// Everything the grader needs to know about the working tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VcsFacts {
    /// id of the commit HEAD points at; `None` before the first commit
    pub head:    Option<String>,
    /// no staged or unstaged changes to tracked files
    pub clean:   bool,
    /// remote name -> url
    pub remotes: BTreeMap<String, String>,
    /// committer identity
    pub user:    VcsUser,
}

/// Supplies version control facts; the grader never touches the repository
/// itself.
pub trait VcsInspector {
    /// Reads the current state of the working tree.
    fn inspect(&self) -> Result<VcsFacts>;
}

/// Fixed facts, for hosts that already know them.
impl VcsInspector for VcsFacts {
    fn inspect(&self) -> Result<VcsFacts> {
        Ok(self.clone())
    }
}
