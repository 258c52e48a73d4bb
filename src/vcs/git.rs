#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use git2::{Repository, Status, StatusOptions};

use super::{VcsFacts, VcsInspector, VcsUser};

/// Changes that make a working tree dirty. Untracked files don't count.
fn dirty_bits() -> Status {
    Status::INDEX_NEW
        | Status::INDEX_MODIFIED
        | Status::INDEX_DELETED
        | Status::INDEX_RENAMED
        | Status::INDEX_TYPECHANGE
        | Status::WT_MODIFIED
        | Status::WT_DELETED
        | Status::WT_TYPECHANGE
        | Status::WT_RENAMED
}

/// Inspects the git repository containing a project directory.
#[derive(Clone, Debug)]
pub struct GitInspector {
    /// directory to start repository discovery from
    project_dir: PathBuf,
}

impl GitInspector {
    /// Creates an inspector for the repository containing `project_dir`.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
        }
    }

    /// Opens the repository, failing with a student-friendly message.
    fn open(&self) -> Result<Repository> {
        Repository::discover(&self.project_dir).with_context(|| {
            format!(
                "Grader Git integration is enabled but {} isn't a Git repository.",
                display(&self.project_dir)
            )
        })
    }
}

/// `.` reads badly in messages; show the absolute path when we can.
fn display(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

impl VcsInspector for GitInspector {
    fn inspect(&self) -> Result<VcsFacts> {
        let repo = self.open()?;

        let head = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .map(|c| c.id().to_string());

        let mut options = StatusOptions::new();
        options
            .include_untracked(false)
            .include_ignored(false)
            .exclude_submodules(true);
        let statuses = repo
            .statuses(Some(&mut options))
            .context("Could not read the working tree status")?;
        let clean = !statuses
            .iter()
            .any(|entry| entry.status().intersects(dirty_bits()));

        let mut remotes = std::collections::BTreeMap::new();
        for name in repo.remotes().context("Could not list remotes")?.iter().flatten() {
            let remote = repo
                .find_remote(name)
                .with_context(|| format!("Could not read remote {name}"))?;
            if let Some(url) = remote.url() {
                remotes.insert(name.to_string(), url.to_string());
            }
        }

        let config = repo.config().context("Could not read git configuration")?;
        let user = VcsUser {
            name:  config.get_string("user.name").ok(),
            email: config.get_string("user.email").ok(),
        };

        tracing::debug!("git head {:?}, clean: {clean}", head);
        Ok(VcsFacts {
            head,
            clean,
            remotes,
            user,
        })
    }
}
