//! Manual weather sync trigger

use axum::{extract::State, Json};
use serde::Serialize;
use shared::{SyncSummary, SyncTrigger};

use crate::error::{AppError, AppResult};
use crate::services::SyncOutcome;
use crate::AppState;

#[derive(Serialize)]
pub struct TriggerSyncResponse {
    pub success: bool,
    pub summary: SyncSummary,
}

/// Run a sync pass now and report its counters
///
/// Answers 409 when a scheduled or manual pass is already running.
pub async fn trigger_sync(State(state): State<AppState>) -> AppResult<Json<TriggerSyncResponse>> {
    tracing::info!("Manual weather sync requested");

    match state.sync.run_sync_pass(SyncTrigger::Manual).await {
        SyncOutcome::Completed(summary) => Ok(Json(TriggerSyncResponse {
            success: true,
            summary,
        })),
        SyncOutcome::AlreadyRunning => Err(AppError::SyncInProgress),
    }
}
