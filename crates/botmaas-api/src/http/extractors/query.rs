//! Query parameter extractors for list endpoints.

use serde::Deserialize;

use botmaas_types::template::TemplateQuery;

/// Query parameters for the template list endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct TemplateListQuery {
    pub group_id: Option<i64>,
    /// Case-insensitive substring of the template name.
    pub keyword: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl From<TemplateListQuery> for TemplateQuery {
    fn from(q: TemplateListQuery) -> Self {
        TemplateQuery {
            group_id: q.group_id,
            keyword: q.keyword.filter(|k| !k.trim().is_empty()),
            include_deleted: q.include_deleted,
            limit: q.limit,
            offset: q.offset,
        }
    }
}

/// Query parameters for the descendants endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct DescendantsQuery {
    /// Maximum records returned; the configured lineage page size when absent.
    pub limit: Option<usize>,
}
