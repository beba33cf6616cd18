use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lineage::OriginId;
use crate::mass_copy::TargetFailure;
use crate::workflow::WorkflowId;

/// Errors from repository operations (used by trait definitions in botmaas-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Whether the failure is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            RepositoryError::Connection => true,
            RepositoryError::Query(msg) => {
                msg.contains("database is locked") || msg.contains("database is busy")
            }
            _ => false,
        }
    }
}

/// Errors from clone operations (single clone, lineage recording).
#[derive(Debug, Error)]
pub enum CloneError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("origin '{0}' not found")]
    OriginNotFound(OriginId),

    #[error("user '{uid}' may not clone '{origin}' into the requested space")]
    PermissionDenied { uid: String, origin: OriginId },

    #[error("origin definition is malformed: {0}")]
    DuplicationConflict(String),

    #[error("workflow '{0}' already has a lineage record")]
    DuplicateProducedId(WorkflowId),

    #[error("storage error: {message}")]
    Storage { message: String, retryable: bool },
}

impl CloneError {
    /// Stable classification used in batch reports and API error codes.
    pub fn kind(&self) -> CloneErrorKind {
        match self {
            CloneError::InvalidRequest(_) => CloneErrorKind::InvalidRequest,
            CloneError::OriginNotFound(_) => CloneErrorKind::OriginNotFound,
            CloneError::PermissionDenied { .. } => CloneErrorKind::PermissionDenied,
            CloneError::DuplicationConflict(_) => CloneErrorKind::DuplicationConflict,
            CloneError::DuplicateProducedId(_) => CloneErrorKind::DuplicateProducedId,
            CloneError::Storage { .. } => CloneErrorKind::Storage,
        }
    }

    /// Whether the caller may retry. Retrying a clone creates a new clone.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CloneError::Storage { retryable: true, .. })
    }
}

impl From<RepositoryError> for CloneError {
    fn from(e: RepositoryError) -> Self {
        CloneError::Storage {
            retryable: e.is_retryable(),
            message: e.to_string(),
        }
    }
}

/// Serializable classification of a `CloneError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloneErrorKind {
    InvalidRequest,
    OriginNotFound,
    PermissionDenied,
    DuplicationConflict,
    DuplicateProducedId,
    Storage,
}

/// Some targets of a mass copy failed. Reported as data alongside the
/// successes, never as a failure of the whole batch.
#[derive(Debug, Clone, Error)]
#[error("{} of the mass-copy targets failed", .failures.len())]
pub struct PartialBatchFailure {
    pub failures: Vec<TargetFailure>,
}
