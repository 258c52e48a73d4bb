#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::path::PathBuf;

use crate::config::ConfigError;

/// Tampering detected while checking test suite fingerprints.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// The file carries no `// md5: ` line at all.
    #[error("Can't find fingerprint for file {}. Restore from Git or download again.", .path.display())]
    MissingFingerprint {
        /// path of the offending file, relative to the project root when known
        path: PathBuf,
    },
    /// The stored fingerprint does not match the file contents.
    #[error(
        "Fingerprint mismatch for test file {}. Undo your changes, restore from Git, or download \
         again.",
        .path.display()
    )]
    FingerprintMismatch {
        /// path of the offending file, relative to the project root when known
        path:     PathBuf,
        /// hash written in the file
        stored:   String,
        /// hash computed from the current contents
        computed: String,
    },
}

impl IntegrityError {
    /// Path of the file that failed verification.
    pub fn path(&self) -> &std::path::Path {
        match self {
            IntegrityError::MissingFingerprint { path }
            | IntegrityError::FingerprintMismatch { path, .. } => path.as_path(),
        }
    }
}

/// Every fatal way a grading run can end.
#[derive(thiserror::Error, Debug)]
pub enum GradeError {
    /// A test suite was modified or lost its fingerprint.
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    /// The grading policy is missing something it needs.
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    /// The contributor identification file is missing or invalid.
    #[error("{0}")]
    Identification(String),
    /// The student has uncommitted score-increasing changes.
    #[error(
        "The autograder will not run until you commit the changes that increased your score."
    )]
    CommitRequired {
        /// checkpoint the refusal applies to
        checkpoint: Option<String>,
        /// commit that was graded last time
        commit:     String,
    },
    /// Unknown error
    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}
