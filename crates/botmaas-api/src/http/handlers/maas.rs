//! Clone handlers: single duplicate, mass copy, lineage synchronize.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use botmaas_types::error::CloneError;
use botmaas_types::lineage::CloneSynchronize;
use botmaas_types::mass_copy::{MaasDuplicate, MassCopyReport, MassCopyRequest, TargetFailure};
use botmaas_types::workflow::BotInfo;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MassCopyResponse {
    #[serde(flatten)]
    pub report: MassCopyReport,
    pub cancelled_count: usize,
    pub failures: Vec<TargetFailure>,
}

#[derive(Debug, Serialize)]
pub struct SynchronizeResponse {
    pub recorded: usize,
}

/// POST /api/v1/maas/duplicate - Clone one origin for the caller.
pub async fn duplicate(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<MaasDuplicate>,
) -> Result<Json<ApiResponse<BotInfo>>, AppError> {
    let start = Instant::now();
    let info = state.service.create_from_template(&auth.uid, body).await?;
    let resp = ApiResponse::success(info, start);
    let self_link = format!("/api/v1/workflows/{}", resp.data.workflow_id);
    let ancestor_link = format!("{self_link}/ancestor");
    Ok(Json(
        resp.with_link("self", self_link).with_link("ancestor", ancestor_link),
    ))
}

/// POST /api/v1/maas/mass-copy - Clone one origin for many targets.
///
/// The batch runs on its own task. If the client goes away, the drop guard
/// cancels the token: targets that have not started are reported cancelled,
/// targets already running still commit.
pub async fn mass_copy(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<MassCopyRequest>,
) -> Result<Json<ApiResponse<MassCopyResponse>>, AppError> {
    let start = Instant::now();
    tracing::info!(
        caller = %auth.uid,
        origin = %body.origin_id,
        targets = body.targets.len(),
        "mass copy requested"
    );

    let token = CancellationToken::new();
    let _guard = token.clone().drop_guard();
    let service = Arc::clone(&state.service);

    let report = tokio::spawn(async move { service.mass_copy(body, token).await })
        .await
        .map_err(|e| AppError::Internal(format!("mass copy task failed: {e}")))??;

    let response = MassCopyResponse {
        cancelled_count: report.cancelled_count(),
        failures: report.failures(),
        report,
    };
    Ok(Json(ApiResponse::success(response, start)))
}

/// POST /api/v1/maas/synchronize - Record lineage for an externally made copy.
pub async fn synchronize(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<CloneSynchronize>,
) -> Result<Json<ApiResponse<SynchronizeResponse>>, AppError> {
    let start = Instant::now();
    if body.uid != auth.uid {
        tracing::warn!(caller = %auth.uid, uid = %body.uid, "synchronize for another user refused");
        return Err(AppError::Clone(CloneError::PermissionDenied {
            uid: auth.uid,
            origin: body.origin_id,
        }));
    }
    tracing::debug!(caller = %auth.uid, current = %body.current_id, "synchronize lineage");
    let link = format!("/api/v1/workflows/{}/ancestor", body.current_id);
    let recorded = state.service.mass_copy_synchronize(body).await?;
    Ok(Json(
        ApiResponse::success(SynchronizeResponse { recorded }, start).with_link("ancestor", link),
    ))
}
