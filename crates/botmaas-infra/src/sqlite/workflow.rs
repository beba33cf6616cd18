//! SQLite workflow repository.

use botmaas_core::repository::workflow::WorkflowRepository;
use botmaas_types::error::RepositoryError;
use botmaas_types::workflow::{BotWorkflow, SpaceId, WorkflowGraph, WorkflowId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::pool::DatabasePool;
use super::{format_datetime, map_read_error, map_write_error, parse_datetime};

pub struct SqliteWorkflowRepository {
    pool: DatabasePool,
}

impl SqliteWorkflowRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to `BotWorkflow`.
struct WorkflowRow {
    id: String,
    uid: String,
    space_id: Option<String>,
    name: String,
    description: String,
    flow_id: String,
    graph: String,
    created_at: String,
    updated_at: String,
}

impl WorkflowRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            uid: row.try_get("uid")?,
            space_id: row.try_get("space_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            flow_id: row.try_get("flow_id")?,
            graph: row.try_get("graph")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_workflow(self) -> Result<BotWorkflow, RepositoryError> {
        let id = self
            .id
            .parse::<WorkflowId>()
            .map_err(|e| RepositoryError::Query(format!("invalid workflow id: {e}")))?;
        let space_id = self
            .space_id
            .as_deref()
            .map(str::parse::<SpaceId>)
            .transpose()
            .map_err(|e| RepositoryError::Query(format!("invalid space id: {e}")))?;
        let graph: WorkflowGraph = serde_json::from_str(&self.graph)
            .map_err(|e| RepositoryError::Query(format!("invalid graph JSON: {e}")))?;

        Ok(BotWorkflow {
            id,
            uid: self.uid,
            space_id,
            name: self.name,
            description: self.description,
            flow_id: self.flow_id,
            graph,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn map_row(row: &SqliteRow) -> Result<BotWorkflow, RepositoryError> {
    WorkflowRow::from_row(row)
        .map_err(|e| RepositoryError::Query(e.to_string()))?
        .into_workflow()
}

/// Insert a workflow row on any executor (pool or open transaction).
pub(crate) async fn insert_workflow<'e, E>(executor: E, workflow: &BotWorkflow) -> Result<(), RepositoryError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let graph =
        serde_json::to_string(&workflow.graph).map_err(|e| RepositoryError::Query(e.to_string()))?;

    sqlx::query(
        "INSERT INTO workflows (id, uid, space_id, name, description, flow_id, graph, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(workflow.id.to_string())
    .bind(&workflow.uid)
    .bind(workflow.space_id.map(|s| s.to_string()))
    .bind(&workflow.name)
    .bind(&workflow.description)
    .bind(&workflow.flow_id)
    .bind(&graph)
    .bind(format_datetime(&workflow.created_at))
    .bind(format_datetime(&workflow.updated_at))
    .execute(executor)
    .await
    .map_err(|e| {
        map_write_error(e, || {
            format!(
                "workflow '{}' or flow '{}' already exists",
                workflow.id, workflow.flow_id
            )
        })
    })?;

    Ok(())
}

impl WorkflowRepository for SqliteWorkflowRepository {
    async fn create_workflow(&self, workflow: &BotWorkflow) -> Result<WorkflowId, RepositoryError> {
        insert_workflow(&self.pool.writer, workflow).await?;
        Ok(workflow.id)
    }

    async fn get_workflow(&self, id: &WorkflowId) -> Result<Option<BotWorkflow>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM workflows WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_read_error)?;

        row.as_ref().map(map_row).transpose()
    }

    async fn update_graph(&self, id: &WorkflowId, graph: &WorkflowGraph) -> Result<(), RepositoryError> {
        let graph = serde_json::to_string(graph).map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query("UPDATE workflows SET graph = ?, updated_at = ? WHERE id = ?")
            .bind(&graph)
            .bind(format_datetime(&chrono::Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| map_write_error(e, || format!("workflow '{id}'")))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_by_owner(&self, uid: &str) -> Result<Vec<BotWorkflow>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM workflows WHERE uid = ? ORDER BY created_at DESC, id DESC")
            .bind(uid)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(map_read_error)?;

        rows.iter().map(map_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::test_support::test_pool;
    use botmaas_types::workflow::{WorkflowNode, new_flow_id};
    use chrono::Utc;

    fn make_workflow(uid: &str, name: &str) -> BotWorkflow {
        let now = Utc::now();
        BotWorkflow {
            id: WorkflowId::new(),
            uid: uid.to_string(),
            space_id: Some(SpaceId::new()),
            name: name.to_string(),
            description: String::new(),
            flow_id: new_flow_id(),
            graph: WorkflowGraph {
                nodes: vec![WorkflowNode {
                    id: "start".to_string(),
                    node_type: "start".to_string(),
                    data: serde_json::json!({"x": 1}),
                }],
                edges: vec![],
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_workflow() {
        let repo = SqliteWorkflowRepository::new(test_pool().await);
        let workflow = make_workflow("u1", "Bot");

        let id = repo.create_workflow(&workflow).await.unwrap();
        assert_eq!(id, workflow.id);

        let loaded = repo.get_workflow(&id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Bot");
        assert_eq!(loaded.space_id, workflow.space_id);
        assert_eq!(loaded.graph, workflow.graph);

        assert!(repo.get_workflow(&WorkflowId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_duplicate_id_conflicts() {
        let repo = SqliteWorkflowRepository::new(test_pool().await);
        let workflow = make_workflow("u1", "Bot");
        repo.create_workflow(&workflow).await.unwrap();

        let err = repo.create_workflow(&workflow).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_graph() {
        let repo = SqliteWorkflowRepository::new(test_pool().await);
        let workflow = make_workflow("u1", "Bot");
        repo.create_workflow(&workflow).await.unwrap();

        repo.update_graph(&workflow.id, &WorkflowGraph::default()).await.unwrap();
        let loaded = repo.get_workflow(&workflow.id).await.unwrap().unwrap();
        assert!(loaded.graph.nodes.is_empty());

        let err = repo
            .update_graph(&WorkflowId::new(), &WorkflowGraph::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[tokio::test]
    async fn test_list_by_owner() {
        let repo = SqliteWorkflowRepository::new(test_pool().await);
        repo.create_workflow(&make_workflow("u1", "A")).await.unwrap();
        repo.create_workflow(&make_workflow("u1", "B")).await.unwrap();
        repo.create_workflow(&make_workflow("u2", "C")).await.unwrap();

        assert_eq!(repo.list_by_owner("u1").await.unwrap().len(), 2);
        assert_eq!(repo.list_by_owner("u2").await.unwrap().len(), 1);
        assert!(repo.list_by_owner("u3").await.unwrap().is_empty());
    }
}
