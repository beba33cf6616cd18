//! SQLite template store.
//!
//! Implements `TemplateStore` from `botmaas-core`. Authoring methods
//! (`save_template`, `soft_delete_template`, `save_group`) are inherent and
//! only reachable from the CLI.

use botmaas_core::repository::template::TemplateStore;
use botmaas_types::error::RepositoryError;
use botmaas_types::template::{TemplateGroup, TemplateId, TemplateQuery, WorkflowTemplate};
use botmaas_types::workflow::{SpaceId, WorkflowGraph};
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, map_read_error, map_write_error, parse_datetime};

pub struct SqliteTemplateStore {
    pool: DatabasePool,
}

impl SqliteTemplateStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Insert or replace a template by id.
    pub async fn save_template(&self, template: &WorkflowTemplate) -> Result<(), RepositoryError> {
        let definition = serde_json::to_string(&template.definition)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            "INSERT INTO workflow_templates (id, name, description, group_id, version, flow_id, definition, space_id, cover_url, is_deleted, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                group_id = excluded.group_id,
                version = excluded.version,
                flow_id = excluded.flow_id,
                definition = excluded.definition,
                space_id = excluded.space_id,
                cover_url = excluded.cover_url,
                is_deleted = excluded.is_deleted,
                updated_at = excluded.updated_at",
        )
        .bind(template.id.to_string())
        .bind(&template.name)
        .bind(&template.description)
        .bind(template.group_id)
        .bind(&template.version)
        .bind(&template.flow_id)
        .bind(&definition)
        .bind(template.space_id.map(|s| s.to_string()))
        .bind(&template.cover_url)
        .bind(template.is_deleted)
        .bind(format_datetime(&template.created_at))
        .bind(format_datetime(&template.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| map_write_error(e, || format!("template '{}' conflicts", template.id)))?;

        Ok(())
    }

    /// Hide a template from listing and cloning. `NotFound` if it does not exist.
    pub async fn soft_delete_template(&self, id: &TemplateId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE workflow_templates SET is_deleted = 1, updated_at = ? WHERE id = ?",
        )
        .bind(format_datetime(&chrono::Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| map_write_error(e, || format!("template '{id}'")))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert or replace a template group by id.
    pub async fn save_group(&self, group: &TemplateGroup) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO template_groups (id, name, sort_order, is_deleted) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                sort_order = excluded.sort_order,
                is_deleted = excluded.is_deleted",
        )
        .bind(group.id)
        .bind(&group.name)
        .bind(group.sort_order)
        .bind(group.is_deleted)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| map_write_error(e, || format!("group {} conflicts", group.id)))?;

        Ok(())
    }
}

fn template_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<WorkflowTemplate, RepositoryError> {
    let get = |e: sqlx::Error| RepositoryError::Query(e.to_string());

    let id: String = row.try_get("id").map_err(get)?;
    let definition: String = row.try_get("definition").map_err(get)?;
    let space_id: Option<String> = row.try_get("space_id").map_err(get)?;
    let created_at: String = row.try_get("created_at").map_err(get)?;
    let updated_at: String = row.try_get("updated_at").map_err(get)?;

    let definition: WorkflowGraph = serde_json::from_str(&definition)
        .map_err(|e| RepositoryError::Query(format!("invalid template definition: {e}")))?;

    Ok(WorkflowTemplate {
        id: id
            .parse::<TemplateId>()
            .map_err(|e| RepositoryError::Query(format!("invalid template id: {e}")))?,
        name: row.try_get("name").map_err(get)?,
        description: row.try_get("description").map_err(get)?,
        group_id: row.try_get("group_id").map_err(get)?,
        version: row.try_get("version").map_err(get)?,
        flow_id: row.try_get("flow_id").map_err(get)?,
        definition,
        space_id: space_id
            .as_deref()
            .map(str::parse::<SpaceId>)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid space id: {e}")))?,
        cover_url: row.try_get("cover_url").map_err(get)?,
        is_deleted: row.try_get("is_deleted").map_err(get)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

/// `%keyword%` with LIKE wildcards in the keyword escaped.
fn like_pattern(keyword: &str) -> String {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

impl TemplateStore for SqliteTemplateStore {
    async fn get_template(&self, id: &TemplateId) -> Result<Option<WorkflowTemplate>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM workflow_templates WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_read_error)?;

        row.as_ref().map(template_from_row).transpose()
    }

    async fn list_templates(&self, query: &TemplateQuery) -> Result<Vec<WorkflowTemplate>, RepositoryError> {
        let keyword = query
            .keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(like_pattern);

        // A negative LIMIT means "no limit" in SQLite.
        let rows = sqlx::query(
            "SELECT t.* FROM workflow_templates t
             LEFT JOIN template_groups g ON g.id = t.group_id
             WHERE (?1 IS NULL OR t.group_id = ?1)
               AND (?2 IS NULL OR t.name LIKE ?2 ESCAPE '\\' OR t.description LIKE ?2 ESCAPE '\\')
               AND (?3 OR t.is_deleted = 0)
             ORDER BY COALESCE(g.sort_order, 2147483647), t.updated_at DESC, t.id
             LIMIT ?4 OFFSET ?5",
        )
        .bind(query.group_id)
        .bind(keyword)
        .bind(query.include_deleted)
        .bind(query.limit.unwrap_or(-1))
        .bind(query.offset.unwrap_or(0))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_read_error)?;

        rows.iter().map(template_from_row).collect()
    }

    async fn list_groups(&self) -> Result<Vec<TemplateGroup>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, sort_order, is_deleted FROM template_groups
             WHERE is_deleted = 0 ORDER BY sort_order, id",
        )
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_read_error)?;

        rows.iter()
            .map(|row| -> Result<TemplateGroup, sqlx::Error> {
                Ok(TemplateGroup {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                    sort_order: row.try_get("sort_order")?,
                    is_deleted: row.try_get("is_deleted")?,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }
}
