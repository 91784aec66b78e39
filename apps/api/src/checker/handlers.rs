//! Axum route handlers for the resume checker.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::checker::decoder::{decode, Decoded};
use crate::checker::sink::persist_best_effort;
use crate::checker::upload::{receive_upload, KeywordSpec, TransientResume};
use crate::errors::AppError;
use crate::models::check::ScoreRecord;
use crate::state::AppState;

/// POST /api/resume-checker
///
/// Multipart fields: `resume` (file, required), `keywords` (text, optional).
/// Returns the scorer's JSON payload unchanged on success.
pub async fn handle_check_resume(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, AppError> {
    let check_id = Uuid::new_v4();

    // Not a multipart body at all: treated the same as a missing file part.
    let multipart = multipart.map_err(|e| {
        debug!("check {check_id}: rejected body: {e}");
        AppError::MissingFile
    })?;

    let upload = receive_upload(multipart, &state.config.upload_dir).await?;
    let Some(resume) = upload.resume else {
        return Err(AppError::MissingFile);
    };

    info!(
        "check {check_id}: received '{}' ({} bytes, {}), keywords: {}",
        resume.original_name,
        resume.size,
        resume.content_type.as_deref().unwrap_or("unknown type"),
        upload.keywords.as_str()
    );

    let outcome = run_check(&state, &resume, &upload.keywords).await;
    resume.cleanup();

    match &outcome {
        Ok(_) => info!("check {check_id}: succeeded"),
        Err(e) => info!("check {check_id}: failed: {e}"),
    }
    outcome.map(Json)
}

/// Delegate -> decode -> persist. The caller owns cleanup.
async fn run_check(
    state: &AppState,
    resume: &TransientResume,
    keywords: &KeywordSpec,
) -> Result<Value, AppError> {
    let output = state.delegate.run(resume.path(), keywords).await?;
    debug!(
        "Scorer produced {} bytes of stdout, {} bytes of stderr",
        output.stdout.len(),
        output.stderr.len()
    );

    match decode(&output.stdout)? {
        Decoded::Rejected(payload) => Err(AppError::Rejected(payload)),
        Decoded::Score { payload, result } => {
            let record = ScoreRecord {
                ats_score: result.ats_score,
                matched_keywords: result.matched_keywords,
                suggestions: result.suggestions,
                created_at: Utc::now(),
            };
            persist_best_effort(state.sink.as_ref(), &record).await;
            Ok(payload)
        }
    }
}

/// Any verb other than POST on the checker route.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
