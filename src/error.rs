//! Typed failures of the harness.
//!
//! Public functions return [`anyhow::Result`] like the rest of the crate.
//! The failures a caller may want to branch on are raised as
//! [`HarnessError`] values wrapped in the `anyhow::Error`, so they can be
//! recovered with `err.downcast_ref::<HarnessError>()`.
use std::path::PathBuf;
use thiserror::Error;

/// Failure kinds surfaced by packaging, dataset loading and evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HarnessError {
    /// Subject identifier not in the dataset's subject list.
    #[error("invalid subject number {subject} (valid subjects: {valid:?})")]
    InvalidSubject {
        /// Requested subject
        subject: u32,
        /// Configured subject list
        valid: Vec<u32>,
    },

    /// Raw capture too short, too few channels, or sampled at the wrong rate.
    #[error("malformed capture {}: {reason}", .path.display())]
    MalformedCapture {
        /// Capture file
        path: PathBuf,
        /// What precondition failed
        reason: String,
    },

    /// Resolved archive path does not exist.
    #[error("subject archive not found: {}", .path.display())]
    ArchiveNotFound {
        /// Archive path that was looked up
        path: PathBuf,
    },

    /// Archive present but unreadable or missing expected fields.
    #[error("corrupt subject archive {}: {reason}", .path.display())]
    ArchiveCorrupt {
        /// Archive file
        path: PathBuf,
        /// Missing field or decode failure
        reason: String,
    },

    /// Configuration values that cannot describe a valid recording layout.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Offending field and value
        reason: String,
    },

    /// Degenerate input to a classifier or cross-validation splitter.
    #[error("classifier error: {reason}")]
    Classifier {
        /// Error reason
        reason: String,
    },
}

impl HarnessError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedCapture { path: path.into(), reason: reason.into() }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ArchiveCorrupt { path: path.into(), reason: reason.into() }
    }

    pub(crate) fn classifier(reason: impl Into<String>) -> Self {
        Self::Classifier { reason: reason.into() }
    }
}
