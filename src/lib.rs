//! # gradeguard
//!
//! Scores coursework submissions from their test and style reports, and
//! keeps the grading honest: test suites carry fingerprints that catch
//! tampering, and students who raise their score from uncommitted changes
//! have to commit before the grader runs again.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// The grading policy and its loader
pub mod config;
/// Constant values used throughout
pub mod constants;
/// Error types
pub mod error;
/// Test suite fingerprints
pub mod fingerprint;
/// Test and style grading
pub mod grade;
/// Contributor identification
pub mod identification;
/// Host process finish/fail decisions
pub mod lifecycle;
/// Point metadata: manifests and annotated sources
pub mod metadata;
/// Report assembly and sinks
pub mod report;
/// The grading driver
pub mod run;
/// Report ingestion server
pub mod server;
/// Version control facts and the commit gate
pub mod vcs;

pub use config::GradePolicy;
pub use error::{GradeError, IntegrityError};
pub use lifecycle::{ExitDecision, Failure, Lifecycle};
pub use run::{Grader, RunOutcome};

/// Defined for convenience
type Dict = std::collections::HashMap<String, String>;
