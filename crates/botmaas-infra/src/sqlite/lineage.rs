//! SQLite lineage ledger.
//!
//! `clone_records.current_id` carries a UNIQUE constraint; concurrent
//! inserts for the same produced workflow resolve in the database, with the
//! loser getting `RepositoryError::Conflict`. Descendant listings are
//! keyset-paged on the autoincrement `seq` column so they stay in insertion
//! order and never materialize the full result set.

use botmaas_core::repository::lineage::{CloneCommitter, CloneRecordStream, LineageLedger};
use botmaas_types::error::RepositoryError;
use botmaas_types::lineage::{CloneRecord, CloneRecordId, OriginId, SyncState};
use botmaas_types::workflow::{BotWorkflow, SpaceId, WorkflowId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::pool::DatabasePool;
use super::workflow::insert_workflow;
use super::{format_datetime, map_read_error, map_write_error, parse_datetime};

/// Rows fetched per page when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Clone)]
pub struct SqliteLineageLedger {
    pool: DatabasePool,
    page_size: u32,
}

impl SqliteLineageLedger {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            pool,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}

fn record_from_row(row: &SqliteRow) -> Result<CloneRecord, RepositoryError> {
    let get = |e: sqlx::Error| RepositoryError::Query(e.to_string());
    let invalid = |what: &str, e: &dyn std::fmt::Display| RepositoryError::Query(format!("invalid {what}: {e}"));

    let id: String = row.try_get("id").map_err(get)?;
    let origin_id: String = row.try_get("origin_id").map_err(get)?;
    let current_id: String = row.try_get("current_id").map_err(get)?;
    let space_id: Option<String> = row.try_get("space_id").map_err(get)?;
    let sync_state: String = row.try_get("sync_state").map_err(get)?;
    let created_at: String = row.try_get("created_at").map_err(get)?;

    Ok(CloneRecord {
        id: id.parse::<CloneRecordId>().map_err(|e| invalid("record id", &e))?,
        uid: row.try_get("uid").map_err(get)?,
        origin_id: origin_id.parse::<OriginId>().map_err(|e| invalid("origin id", &e))?,
        current_id: current_id.parse::<WorkflowId>().map_err(|e| invalid("workflow id", &e))?,
        space_id: space_id
            .as_deref()
            .map(str::parse::<SpaceId>)
            .transpose()
            .map_err(|e| invalid("space id", &e))?,
        flow_id: row.try_get("flow_id").map_err(get)?,
        created_at: parse_datetime(&created_at)?,
        sync_state: sync_state.parse::<SyncState>().map_err(|e| invalid("sync state", &e))?,
    })
}

async fn insert_record<'e, E>(executor: E, record: &CloneRecord) -> Result<(), RepositoryError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "INSERT INTO clone_records (id, uid, origin_id, current_id, space_id, flow_id, sync_state, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(record.id.to_string())
    .bind(&record.uid)
    .bind(record.origin_id.to_string())
    .bind(record.current_id.to_string())
    .bind(record.space_id.map(|s| s.to_string()))
    .bind(&record.flow_id)
    .bind(record.sync_state.to_string())
    .bind(format_datetime(&record.created_at))
    .execute(executor)
    .await
    .map_err(|e| {
        map_write_error(e, || {
            format!("clone record for workflow '{}' already exists", record.current_id)
        })
    })?;

    Ok(())
}

impl LineageLedger for SqliteLineageLedger {
    async fn record_clone(&self, record: &CloneRecord) -> Result<CloneRecord, RepositoryError> {
        insert_record(&self.pool.writer, record).await?;
        Ok(record.clone())
    }

    async fn find_ancestor(&self, current_id: &WorkflowId) -> Result<Option<CloneRecord>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM clone_records WHERE current_id = ?")
            .bind(current_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_read_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    fn find_descendants(&self, origin_id: &OriginId) -> CloneRecordStream {
        let reader = self.pool.reader.clone();
        let origin = origin_id.to_string();
        let page_size = i64::from(self.page_size);

        Box::pin(async_stream::try_stream! {
            let mut last_seq: i64 = 0;
            loop {
                let rows = sqlx::query(
                    "SELECT * FROM clone_records WHERE origin_id = ? AND seq > ? ORDER BY seq LIMIT ?",
                )
                .bind(&origin)
                .bind(last_seq)
                .bind(page_size)
                .fetch_all(&reader)
                .await
                .map_err(map_read_error)?;

                let fetched = rows.len();
                for row in &rows {
                    last_seq = row.try_get("seq").map_err(|e| RepositoryError::Query(e.to_string()))?;
                    yield record_from_row(row)?;
                }

                if (fetched as i64) < page_size {
                    break;
                }
            }
        })
    }

    async fn find_clone_for(
        &self,
        uid: &str,
        origin_id: &OriginId,
        space_id: Option<&SpaceId>,
    ) -> Result<Option<CloneRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM clone_records WHERE uid = ? AND origin_id = ? AND space_id IS ?
             ORDER BY seq DESC LIMIT 1",
        )
        .bind(uid)
        .bind(origin_id.to_string())
        .bind(space_id.map(|s| s.to_string()))
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(map_read_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn mark_diverged(&self, current_id: &WorkflowId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE clone_records SET sync_state = ? WHERE current_id = ?")
            .bind(SyncState::Diverged.to_string())
            .bind(current_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| map_write_error(e, || format!("clone record for workflow '{current_id}'")))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl CloneCommitter for SqliteLineageLedger {
    async fn commit_clone(&self, workflow: &BotWorkflow, record: &CloneRecord) -> Result<(), RepositoryError> {
        let conflict = || format!("clone of workflow '{}'", workflow.id);
        let mut tx = self.pool.writer.begin().await.map_err(|e| map_write_error(e, conflict))?;

        // Dropping `tx` on an early return rolls back both inserts. Only the
        // lineage row's UNIQUE(current_id) reports a taken produced id.
        insert_workflow(&mut *tx, workflow).await.map_err(|e| match e {
            RepositoryError::Conflict(message) => RepositoryError::Query(message),
            other => other,
        })?;
        insert_record(&mut *tx, record).await?;

        tx.commit().await.map_err(|e| map_write_error(e, conflict))?;
        Ok(())
    }
}
