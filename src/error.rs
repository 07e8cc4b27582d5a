use thiserror::Error;

use crate::landmark::BodyPart;

pub type Result<T> = std::result::Result<T, SentinelError>;

/// Errors raised at the boundary where external pose results enter the crate.
///
/// Classifiers and monitors never fail: once a [`crate::landmark::Frame`]
/// exists every per-frame operation degrades to a default angle or an
/// `Unknown` status instead.
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("expected {expected} landmarks per frame, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("{0:?} is not visible enough to calibrate")]
    NotVisible(BodyPart),

    #[error("unknown threshold profile '{0}'")]
    UnknownProfile(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("replay line {line}: {message}")]
    Replay { line: usize, message: String },
}
