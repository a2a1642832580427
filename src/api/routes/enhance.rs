//! Enhance handler

use crate::api::AppState;
use crate::error::Error;
use crate::types::{EnhanceRequest, EnhanceResponse};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};

/// POST /enhance-script/ - Enhance a script and voice it
///
/// Blocks until the agent job finishes and the audio has been resolved,
/// downloaded and published (or each best-effort stage has given up).
#[utoipa::path(
    post,
    path = "/enhance-script/",
    tag = "enhance",
    request_body = EnhanceRequest,
    responses(
        (status = 200, description = "Pipeline finished; check `message` for degraded stages", body = EnhanceResponse),
        (status = 422, description = "Malformed body or empty script", body = crate::error::ApiError),
        (status = 500, description = "Service misconfigured", body = crate::error::ApiError),
        (status = 502, description = "Agent service rejected or lost the job", body = crate::error::ApiError),
        (status = 504, description = "Agent job did not finish in time", body = crate::error::ApiError)
    )
)]
pub async fn enhance_script(
    State(state): State<AppState>,
    payload: Result<Json<EnhanceRequest>, JsonRejection>,
) -> Result<Json<EnhanceResponse>, Error> {
    let Json(request) = payload.map_err(|rejection| Error::Validation(rejection.body_text()))?;

    tracing::info!(
        script_chars = request.script.chars().count(),
        voice_id = request.voice_id.as_deref(),
        "enhance request received"
    );

    let response = state.orchestrator.enhance(request).await?;
    Ok(Json(response))
}
