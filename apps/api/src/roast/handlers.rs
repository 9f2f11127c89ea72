//! Axum route handlers for the Roast API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::admission::ClientId;
use crate::errors::AppError;
use crate::models::analysis::AnalysisResult;
use crate::models::rebuild::RebuiltDocument;
use crate::roast::pipeline::{AnalysisRequest, RebuildRequest};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request bodies
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeBody {
    /// Raw values so a non-string field never fails the whole body.
    #[serde(default, alias = "resumeText")]
    pub text: Option<Value>,
    #[serde(default)]
    pub target_role: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RebuildBody {
    #[serde(default, alias = "resumeText")]
    pub text: Option<String>,
    #[serde(default, alias = "roastResult")]
    pub prior_result: Option<Value>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyze
///
/// Admission → validate → compose → invoke → extract. A malformed body is
/// still counted against the client's quota before it is rejected.
pub async fn handle_analyze(
    State(state): State<AppState>,
    client: ClientId,
    payload: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<AnalysisResult>, AppError> {
    let body = payload.map(|Json(body)| body).unwrap_or_else(|rejection| {
        debug!("Unreadable analyze body from {client}: {}", rejection.body_text());
        AnalyzeBody::default()
    });

    let request = AnalysisRequest {
        text: body.text.and_then(|v| v.as_str().map(str::to_string)),
        target_role: body.target_role.and_then(|v| v.as_str().map(str::to_string)),
    };

    let result = state.pipeline.analyze(client.as_str(), request).await?;
    Ok(Json(result))
}

/// POST /api/v1/rebuild
///
/// Rewrites the resume using a prior analysis. Not separately rate limited.
pub async fn handle_rebuild(
    State(state): State<AppState>,
    payload: Result<Json<RebuildBody>, JsonRejection>,
) -> Result<Json<RebuiltDocument>, AppError> {
    let Json(body) = payload
        .map_err(|rejection| AppError::Validation(format!("Missing required data: {}", rejection.body_text())))?;

    let request = RebuildRequest::from_parts(body.text, body.prior_result)?;
    let document = state.pipeline.rebuild(request).await?;
    Ok(Json(document))
}
