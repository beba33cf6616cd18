//! Workflow graph and produced-workflow types.
//!
//! A `WorkflowGraph` is the node/edge structure shared by templates and the
//! workflows instantiated from them. Its node payloads are opaque to the
//! clone engine: only node ids and edge endpoints carry meaning here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lineage::{CloneRecordId, OriginId};

uuid_id! {
    /// Identifier of a produced (bot) workflow instance.
    WorkflowId
}

uuid_id! {
    /// Identifier of a collaborative space.
    SpaceId
}

/// The node/edge graph of a workflow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    pub nodes: Vec<WorkflowNode>,
    #[serde(default)]
    pub edges: Vec<WorkflowEdge>,
}

impl WorkflowGraph {
    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&WorkflowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// A single node in a workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    /// Node id, unique within its graph.
    pub id: String,
    /// Node kind as understood by the workflow runtime (e.g. "llm", "knowledge").
    #[serde(rename = "type")]
    pub node_type: String,
    /// Opaque node configuration. May reference other nodes by id.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

/// A workflow instance owned by a user, optionally inside a space.
///
/// Clones are ordinary workflows: nothing in this struct links back to the
/// origin. Lineage lives in the ledger (`CloneRecord`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotWorkflow {
    pub id: WorkflowId,
    /// Owning user.
    pub uid: String,
    /// Owning space; `None` for personal workflows.
    pub space_id: Option<SpaceId>,
    pub name: String,
    pub description: String,
    /// Identifier of this workflow's concrete graph.
    pub flow_id: String,
    pub graph: WorkflowGraph,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Generate a fresh flow identifier (32 lowercase hex characters).
pub fn new_flow_id() -> String {
    uuid::Uuid::now_v7().simple().to_string()
}

/// Presentation view of a newly created bot workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotInfo {
    pub workflow_id: WorkflowId,
    pub uid: String,
    pub space_id: Option<SpaceId>,
    pub name: String,
    pub description: String,
    pub flow_id: String,
    pub origin_id: OriginId,
    pub clone_record_id: CloneRecordId,
    pub node_count: usize,
    pub created_at: DateTime<Utc>,
}
