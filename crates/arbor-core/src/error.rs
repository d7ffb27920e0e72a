//! Error types for Arbor core.

use std::fmt;

/// Errors reported by the command scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The command is already resident in the waiting or working queue.
    ///
    /// A command may be queued at most once at a time. Re-executing it is
    /// possible after it finishes or is removed.
    AlreadyQueued,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyQueued => {
                write!(f, "Command is already queued for execution")
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

/// A specialized Result type for Arbor core operations.
pub type Result<T> = std::result::Result<T, SchedulerError>;
