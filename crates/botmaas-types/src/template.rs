//! Workflow template types.
//!
//! Templates are authored outside this system and are read-only from the
//! clone engine's point of view. A template keeps its id across edits; only
//! its version tag changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::{SpaceId, WorkflowGraph};

uuid_id! {
    /// Stable identifier of a workflow template.
    TemplateId
}

/// A reusable workflow definition from which bots are instantiated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Template group (category) this template is listed under.
    pub group_id: i64,
    /// Version tag; changes on every edit.
    pub version: String,
    /// Identifier of the template's current concrete graph.
    pub flow_id: String,
    pub definition: WorkflowGraph,
    /// Space that owns the template; `None` for public templates.
    #[serde(default)]
    pub space_id: Option<SpaceId>,
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Soft-delete flag.
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A category grouping templates for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateGroup {
    pub id: i64,
    pub name: String,
    pub sort_order: i32,
    #[serde(default)]
    pub is_deleted: bool,
}

/// Presentation projection of a `WorkflowTemplate` for catalog listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaasTemplate {
    pub id: TemplateId,
    pub group_id: i64,
    pub name: String,
    pub description: String,
    pub version: String,
    pub flow_id: String,
    pub cover_url: Option<String>,
    pub node_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&WorkflowTemplate> for MaasTemplate {
    fn from(t: &WorkflowTemplate) -> Self {
        Self {
            id: t.id,
            group_id: t.group_id,
            name: t.name.clone(),
            description: t.description.clone(),
            version: t.version.clone(),
            flow_id: t.flow_id.clone(),
            cover_url: t.cover_url.clone(),
            node_count: t.definition.nodes.len(),
            updated_at: t.updated_at,
        }
    }
}

/// Query parameters for listing templates.
///
/// Every field is optional; an empty query lists all non-deleted templates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateQuery {
    /// Restrict to one template group.
    #[serde(default)]
    pub group_id: Option<i64>,
    /// Case-insensitive substring match on the template name.
    #[serde(default)]
    pub keyword: Option<String>,
    /// Include soft-deleted templates.
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}
