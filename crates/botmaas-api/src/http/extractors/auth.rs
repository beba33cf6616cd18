//! API key authentication extractor.
//!
//! Extracts and verifies API keys from:
//! - `Authorization: Bearer <key>` header
//! - `X-API-Key: <key>` header
//!
//! Keys are SHA-256 hashed and compared against the `api_keys` table. Each
//! key belongs to one user; that user is the caller of every clone made with
//! the key.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sha2::{Digest, Sha256};

use botmaas_infra::sqlite::pool::DatabasePool;

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated caller. Extracting this validates the API key.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub uid: String,
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let api_key = extract_api_key(parts)?;
        let key_hash = hash_api_key(&api_key);

        let row: Option<(String, String)> =
            sqlx::query_as("SELECT id, uid FROM api_keys WHERE key_hash = ?")
                .bind(&key_hash)
                .fetch_optional(&state.db_pool.reader)
                .await
                .map_err(|e| AppError::Internal(format!("Database error: {e}")))?;

        let Some((id, uid)) = row else {
            return Err(AppError::Unauthorized(
                "Invalid API key. Provide a valid key via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
            ));
        };

        // Best effort; a failed timestamp update does not fail the request.
        if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
            .bind(chrono::Utc::now().to_rfc3339())
            .bind(&id)
            .execute(&state.db_pool.writer)
            .await
        {
            tracing::debug!(error = %e, "failed to update api key last_used_at");
        }

        Ok(Authenticated { uid })
    }
}

fn extract_api_key(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header encoding".to_string()))?;
        if let Some(key) = auth_str.strip_prefix("Bearer ") {
            return Ok(key.trim().to_string());
        }
    }

    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid X-API-Key header encoding".to_string()))?;
        return Ok(key_str.trim().to_string());
    }

    Err(AppError::Unauthorized(
        "Missing API key. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
    ))
}

/// Compute SHA-256 hash of an API key (lowercase hex).
pub fn hash_api_key(key: &str) -> String {
    format!("{:x}", Sha256::digest(key.as_bytes()))
}

/// Generate a new API key for `uid` and store its hash.
///
/// Returns the plaintext key. It is not stored and cannot be shown again.
pub async fn create_api_key(pool: &DatabasePool, uid: &str, name: &str) -> anyhow::Result<String> {
    let plaintext_key = format!(
        "bmaas_{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    );

    sqlx::query("INSERT INTO api_keys (id, key_hash, uid, name, created_at) VALUES (?, ?, ?, ?, ?)")
        .bind(uuid::Uuid::now_v7().to_string())
        .bind(hash_api_key(&plaintext_key))
        .bind(uid)
        .bind(name)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&pool.writer)
        .await?;

    Ok(plaintext_key)
}
