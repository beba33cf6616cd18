//! Clone lineage types.
//!
//! A `CloneRecord` links a produced workflow back to the template or
//! workflow it was copied from. Lineage is historical: the origin may be
//! deleted later without invalidating the record.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::template::TemplateId;
use crate::workflow::{SpaceId, WorkflowId};

uuid_id! {
    /// Identifier of a lineage record.
    CloneRecordId
}

/// What a clone was copied from: a template or another workflow.
///
/// Rendered as `template:<uuid>` or `workflow:<uuid>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OriginId {
    Template(TemplateId),
    Workflow(WorkflowId),
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginId::Template(id) => write!(f, "template:{id}"),
            OriginId::Workflow(id) => write!(f, "workflow:{id}"),
        }
    }
}

impl FromStr for OriginId {
    type Err = String;

    /// Parses `template:<uuid>` / `workflow:<uuid>`. A bare UUID is read as a
    /// template id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, raw) = match s.split_once(':') {
            Some((kind, raw)) => (kind, raw),
            None => ("template", s),
        };
        match kind {
            "template" => raw
                .parse::<TemplateId>()
                .map(OriginId::Template)
                .map_err(|e| format!("invalid template id '{raw}': {e}")),
            "workflow" => raw
                .parse::<WorkflowId>()
                .map(OriginId::Workflow)
                .map_err(|e| format!("invalid workflow id '{raw}': {e}")),
            other => Err(format!("invalid origin kind: '{other}'")),
        }
    }
}

impl TryFrom<String> for OriginId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OriginId> for String {
    fn from(value: OriginId) -> Self {
        value.to_string()
    }
}

impl From<TemplateId> for OriginId {
    fn from(id: TemplateId) -> Self {
        OriginId::Template(id)
    }
}

impl From<WorkflowId> for OriginId {
    fn from(id: WorkflowId) -> Self {
        OriginId::Workflow(id)
    }
}

/// Synchronization state of a clone relative to its origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    /// Structurally identical to the origin at clone time.
    #[default]
    Synced,
    /// Independently edited; flagged by an external comparison.
    Diverged,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Synced => write!(f, "synced"),
            SyncState::Diverged => write!(f, "diverged"),
        }
    }
}

impl FromStr for SyncState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "synced" => Ok(SyncState::Synced),
            "diverged" => Ok(SyncState::Diverged),
            other => Err(format!("invalid sync state: '{other}'")),
        }
    }
}

/// One origin -> clone lineage entry.
///
/// Immutable after creation except for `sync_state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneRecord {
    pub id: CloneRecordId,
    /// User who owns the produced workflow.
    pub uid: String,
    pub origin_id: OriginId,
    /// The produced workflow. Unique across all records.
    pub current_id: WorkflowId,
    /// Target space; `None` for personal clones.
    pub space_id: Option<SpaceId>,
    /// Flow id of the concrete graph that was copied.
    pub flow_id: String,
    pub created_at: DateTime<Utc>,
    pub sync_state: SyncState,
}

impl CloneRecord {
    /// Build a fresh record in the `Synced` state.
    pub fn new(
        uid: impl Into<String>,
        origin_id: OriginId,
        current_id: WorkflowId,
        space_id: Option<SpaceId>,
        flow_id: impl Into<String>,
    ) -> Self {
        Self {
            id: CloneRecordId::new(),
            uid: uid.into(),
            origin_id,
            current_id,
            space_id,
            flow_id: flow_id.into(),
            created_at: Utc::now(),
            sync_state: SyncState::Synced,
        }
    }
}

/// Lineage of a copy materialized outside the duplication engine, submitted
/// for recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloneSynchronize {
    pub uid: String,
    pub origin_id: OriginId,
    pub current_id: WorkflowId,
    #[serde(default)]
    pub space_id: Option<SpaceId>,
    pub flow_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_id_roundtrip() {
        let template = OriginId::Template(TemplateId::new());
        let workflow = OriginId::Workflow(WorkflowId::new());
        for origin in [template, workflow] {
            let parsed: OriginId = origin.to_string().parse().unwrap();
            assert_eq!(origin, parsed);
        }
    }

    #[test]
    fn test_origin_id_bare_uuid_is_template() {
        let id = TemplateId::new();
        let parsed: OriginId = id.to_string().parse().unwrap();
        assert_eq!(parsed, OriginId::Template(id));
    }

    #[test]
    fn test_origin_id_rejects_unknown_kind() {
        let err = "space:0190f1a2-0000-7000-8000-000000000000"
            .parse::<OriginId>()
            .unwrap_err();
        assert!(err.contains("invalid origin kind"));
    }

    #[test]
    fn test_origin_id_serializes_as_string() {
        let id = WorkflowId::new();
        let json = serde_json::to_string(&OriginId::Workflow(id)).unwrap();
        assert_eq!(json, format!("\"workflow:{id}\""));
    }

    #[test]
    fn test_new_record_starts_synced() {
        let record = CloneRecord::new(
            "u1",
            OriginId::Template(TemplateId::new()),
            WorkflowId::new(),
            None,
            "flow",
        );
        assert_eq!(record.sync_state, SyncState::Synced);
        assert_eq!(record.uid, "u1");
    }

    #[test]
    fn test_sync_state_roundtrip() {
        for state in [SyncState::Synced, SyncState::Diverged] {
            let parsed: SyncState = state.to_string().parse().unwrap();
            assert_eq!(state, parsed);
        }
    }
}
