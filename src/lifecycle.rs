#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Decides whether the host process survives the end of a grading run.
//!
//! Nothing here exits; the binary acts on the returned decisions.

use crate::error::GradeError;

/// What the host should do once grading is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitDecision {
    /// keep the host process running
    KeepAlive,
    /// bring the host process down with this exit code
    Terminate(i32),
}

/// A fatal grading error together with how it should end the run.
#[derive(Debug)]
pub enum Failure {
    /// report the error; the host process stays up
    Recoverable(GradeError),
    /// report the error and bring the host down
    Terminate {
        /// what went wrong
        error: GradeError,
        /// process exit code
        code:  i32,
    },
}

impl Failure {
    /// The underlying error.
    pub fn error(&self) -> &GradeError {
        match self {
            Failure::Recoverable(error) | Failure::Terminate { error, .. } => error,
        }
    }

    /// Whether the host has to go down.
    pub fn terminates(&self) -> bool {
        matches!(self, Failure::Terminate { .. })
    }

    /// Exit decision matching this failure.
    pub fn decision(&self) -> ExitDecision {
        match self {
            Failure::Recoverable(_) => ExitDecision::KeepAlive,
            Failure::Terminate { code, .. } => ExitDecision::Terminate(*code),
        }
    }
}

/// Finish/fail policy for a host process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lifecycle {
    /// keep the host alive unless forced
    keep_alive: bool,
}

impl Lifecycle {
    /// Exit code of a run that failed and took the host down.
    pub const FAILURE_CODE: i32 = 1;

    /// Creates a lifecycle.
    ///
    /// * `keep_alive`: survive normal endings and recoverable failures
    pub fn new(keep_alive: bool) -> Self {
        Self { keep_alive }
    }

    /// Called when grading completes.
    ///
    /// * `force`: terminate even when configured to stay alive, eg. after a
    ///   style tool crash
    pub fn finish(&self, force: bool) -> ExitDecision {
        if !self.keep_alive || force {
            ExitDecision::Terminate(0)
        } else {
            ExitDecision::KeepAlive
        }
    }

    /// Called when grading cannot go on.
    ///
    /// * `error`: what went wrong
    /// * `force`: terminate even when configured to stay alive
    pub fn fail(&self, error: GradeError, force: bool) -> Failure {
        if self.keep_alive && !force {
            Failure::Recoverable(error)
        } else {
            Failure::Terminate {
                error,
                code: Self::FAILURE_CODE,
            }
        }
    }
}
