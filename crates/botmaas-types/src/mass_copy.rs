//! Duplication request and mass-copy report types.

use serde::{Deserialize, Serialize};

use crate::error::{CloneError, CloneErrorKind, PartialBatchFailure};
use crate::lineage::{CloneRecordId, OriginId};
use crate::workflow::{SpaceId, WorkflowId};

/// Request to instantiate one bot workflow from an origin. The caller's
/// `uid` is supplied separately by the authenticated context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaasDuplicate {
    pub origin_id: OriginId,
    #[serde(default)]
    pub space_id: Option<SpaceId>,
    /// Overrides the produced workflow's name.
    #[serde(default)]
    pub name: Option<String>,
}

/// One destination of a mass copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyTarget {
    pub uid: String,
    #[serde(default)]
    pub space_id: Option<SpaceId>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Fan one origin out to many users/spaces. Not persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassCopyRequest {
    pub origin_id: OriginId,
    pub targets: Vec<CopyTarget>,
}

/// What happened to a single mass-copy target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetOutcome {
    Cloned {
        workflow_id: WorkflowId,
        record_id: CloneRecordId,
    },
    /// An earlier clone exists and the re-clone policy skips it.
    Skipped { existing: WorkflowId },
    Failed {
        kind: CloneErrorKind,
        reason: String,
    },
    /// The batch was cancelled before this target started.
    Cancelled,
}

impl TargetOutcome {
    pub fn failed(err: &CloneError) -> Self {
        TargetOutcome::Failed {
            kind: err.kind(),
            reason: err.to_string(),
        }
    }

    pub fn is_cloned(&self) -> bool {
        matches!(self, TargetOutcome::Cloned { .. })
    }
}

/// A target paired with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetResult {
    pub target: CopyTarget,
    #[serde(flatten)]
    pub outcome: TargetOutcome,
}

/// A failed target with its reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetFailure {
    /// Position of the target in the request.
    pub index: usize,
    pub uid: String,
    pub space_id: Option<SpaceId>,
    pub kind: CloneErrorKind,
    pub reason: String,
}

/// Aggregate result of a mass copy, with one result per target in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassCopyReport {
    pub origin_id: OriginId,
    pub success_count: usize,
    pub results: Vec<TargetResult>,
}

impl MassCopyReport {
    pub fn new(origin_id: OriginId, results: Vec<TargetResult>) -> Self {
        let success_count = results.iter().filter(|r| r.outcome.is_cloned()).count();
        Self {
            origin_id,
            success_count,
            results,
        }
    }

    /// Targets that failed, in request order.
    pub fn failures(&self) -> Vec<TargetFailure> {
        self.results
            .iter()
            .enumerate()
            .filter_map(|(index, r)| match &r.outcome {
                TargetOutcome::Failed { kind, reason } => Some(TargetFailure {
                    index,
                    uid: r.target.uid.clone(),
                    space_id: r.target.space_id,
                    kind: *kind,
                    reason: reason.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// `Some` when at least one target failed.
    pub fn partial_failure(&self) -> Option<PartialBatchFailure> {
        let failures = self.failures();
        if failures.is_empty() {
            None
        } else {
            Some(PartialBatchFailure { failures })
        }
    }

    pub fn cancelled_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome == TargetOutcome::Cancelled)
            .count()
    }
}
