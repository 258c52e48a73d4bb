#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

/// Best score and last graded commit for one checkpoint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointScoreRecord {
    /// checkpoint id; `None` when checkpointing is off
    #[serde(default)]
    pub checkpoint:       Option<String>,
    /// commit graded most recently
    #[serde(default)]
    pub last_seen_commit: Option<String>,
    /// best score ever earned for this checkpoint
    #[serde(default)]
    pub max_score:        u32,
    /// whether the best score came from uncommitted changes
    #[serde(default)]
    pub increased:        bool,
}

impl CheckpointScoreRecord {
    /// The record of a checkpoint that was never graded.
    pub fn empty(checkpoint: Option<String>) -> Self {
        Self {
            checkpoint,
            ..Default::default()
        }
    }
}

/// The shapes a score file has been written in.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredHistory {
    /// a plain array of records
    Records(Vec<CheckpointScoreRecord>),
    /// the older `{"checkpoints": [...]}` wrapper
    Wrapped {
        /// wrapped records
        checkpoints: Vec<CheckpointScoreRecord>,
    },
}

/// Per-checkpoint score records, unique by checkpoint, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScoreHistory {
    /// the records
    records: Vec<CheckpointScoreRecord>,
}

impl ScoreHistory {
    /// Creates a history from records; later duplicates of a checkpoint are
    /// dropped.
    pub fn new(records: Vec<CheckpointScoreRecord>) -> Self {
        let mut history = Self::default();
        for record in records {
            if history.get(record.checkpoint.as_deref()).is_none() {
                history.records.push(record);
            }
        }
        history
    }

    /// Parses a score file.
    pub fn from_json(json: &str) -> Result<Self> {
        let stored: StoredHistory =
            serde_json::from_str(json).context("Could not parse score history")?;
        Ok(match stored {
            StoredHistory::Records(records) => Self::new(records),
            StoredHistory::Wrapped { checkpoints } => Self::new(checkpoints),
        })
    }

    /// Loads the score file at `path`.
    ///
    /// A missing or unreadable file is the same as no history; it never
    /// stops a run.
    pub fn load(path: &Path) -> Self {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) => {
                tracing::debug!("No score history at {}: {e}", path.display());
                return Self::default();
            }
        };

        match Self::from_json(&json) {
            Ok(history) => history,
            Err(e) => {
                tracing::warn!("Ignoring corrupt score history {}: {e:#}", path.display());
                Self::default()
            }
        }
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[CheckpointScoreRecord] {
        &self.records
    }

    /// The record for `checkpoint`, if it was ever graded.
    pub fn get(&self, checkpoint: Option<&str>) -> Option<&CheckpointScoreRecord> {
        self.records
            .iter()
            .find(|r| r.checkpoint.as_deref() == checkpoint)
    }

    /// The record for `checkpoint`, or an empty one.
    pub fn record_for(&self, checkpoint: Option<&str>) -> CheckpointScoreRecord {
        self.get(checkpoint)
            .cloned()
            .unwrap_or_else(|| CheckpointScoreRecord::empty(checkpoint.map(str::to_string)))
    }

    /// Replaces the record of `record.checkpoint`, or appends it.
    pub fn set(&mut self, record: CheckpointScoreRecord) {
        match self
            .records
            .iter_mut()
            .find(|r| r.checkpoint == record.checkpoint)
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    /// Writes the whole history to `path`.
    ///
    /// The file is written next to its destination and renamed into place,
    /// so a killed process leaves either the old or the new history.
    pub fn persist(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Could not create {}", dir.display()))?;

        let mut file = NamedTempFile::new_in(dir)
            .with_context(|| format!("Could not create a temporary file in {}", dir.display()))?;
        serde_json::to_writer(&mut file, &self.records)
            .context("Could not serialize score history")?;
        file.flush().context("Could not write score history")?;
        file.as_file()
            .sync_all()
            .context("Could not sync score history")?;
        file.persist(path)
            .map_err(|e| e.error)
            .with_context(|| format!("Could not replace {}", path.display()))?;

        Ok(())
    }
}
