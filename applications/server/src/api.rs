/// HTTP handlers: health probe and the sync trigger.
use crate::error::{Result, ServerError};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mirror_core::SyncOutcome;
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Trigger one sync run. Requires `Authorization: Bearer <sync_secret>`.
pub async fn trigger_sync(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response> {
    authorize(&state, &headers)?;

    // One run at a time; a trigger during a run is not queued.
    let Ok(_guard) = state.run_guard.try_lock() else {
        return Ok((
            StatusCode::CONFLICT,
            Json(json!({ "error": "a sync run is already in progress" })),
        )
            .into_response());
    };

    let outcome = state.manager.run_sync().await?;

    let body = match outcome {
        SyncOutcome::Unchanged => json!({ "outcome": "unchanged" }),
        SyncOutcome::Published(summary) => json!({
            "outcome": "published",
            "target": summary.target,
            "total_bytes": summary.total_bytes,
            "duration_seconds": summary.duration_seconds,
        }),
    };

    Ok(Json(body).into_response())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<()> {
    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == state.sync_secret => Ok(()),
        Some(_) => Err(ServerError::Auth("invalid sync secret".to_string())),
        None => Err(ServerError::Auth(
            "missing bearer authorization".to_string(),
        )),
    }
}
