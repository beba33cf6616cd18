//! SQLite space membership.

use botmaas_core::repository::space::SpaceAccess;
use botmaas_types::error::RepositoryError;
use botmaas_types::workflow::SpaceId;

use super::pool::DatabasePool;
use super::{format_datetime, map_read_error, map_write_error};

/// Space access backed by the `space_members` table.
///
/// A user may clone into a space only as a member of it, and may clone a
/// space-owned origin only as a member of the owning space. Public origins
/// into personal targets need no membership.
pub struct SqliteSpaceAccess {
    pool: DatabasePool,
}

impl SqliteSpaceAccess {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Add `uid` to `space_id` with `role`. Granting an existing membership
    /// only updates the role.
    pub async fn grant(&self, space_id: &SpaceId, uid: &str, role: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO space_members (space_id, uid, role, created_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(space_id, uid) DO UPDATE SET role = excluded.role",
        )
        .bind(space_id.to_string())
        .bind(uid)
        .bind(role)
        .bind(format_datetime(&chrono::Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| map_write_error(e, || format!("membership {uid}@{space_id}")))?;
        Ok(())
    }

    /// Remove `uid` from `space_id`. `NotFound` if not a member.
    pub async fn revoke(&self, space_id: &SpaceId, uid: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM space_members WHERE space_id = ? AND uid = ?")
            .bind(space_id.to_string())
            .bind(uid)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| map_write_error(e, || format!("membership {uid}@{space_id}")))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn is_member(&self, uid: &str, space_id: &SpaceId) -> Result<bool, RepositoryError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM space_members WHERE space_id = ? AND uid = ?")
                .bind(space_id.to_string())
                .bind(uid)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(map_read_error)?;
        Ok(row.is_some())
    }
}

impl SpaceAccess for SqliteSpaceAccess {
    async fn can_access(
        &self,
        uid: &str,
        target_space: Option<&SpaceId>,
        origin_space: Option<&SpaceId>,
    ) -> Result<bool, RepositoryError> {
        if let Some(space) = target_space {
            if !self.is_member(uid, space).await? {
                return Ok(false);
            }
        }
        if let Some(space) = origin_space {
            if Some(space) != target_space && !self.is_member(uid, space).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
