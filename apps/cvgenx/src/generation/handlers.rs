//! Axum route handlers for generation, history and reference resumes.

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{AppError, ValidatedJson};
use crate::generation::generator::{generate, GenerateRequest};
use crate::generation::reference::{extract_text, merge_resume_text, normalize};
use crate::models::{GenerationRecord, ResumeRecord};
use crate::state::AppState;
use crate::store::DEFAULT_HISTORY_LIMIT;

/// How many stored resumes the list and merged views look at.
const RESUME_LIST_LIMIT: i64 = 20;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub results: Vec<GenerationRecord>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGenerationRequest {
    pub output: String,
}

#[derive(Debug, Serialize)]
pub struct MergedResumeResponse {
    pub content: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let results = generate(
        &state.store,
        state.provider.as_ref(),
        &state.config.default_model,
        &request,
    )
    .await?;

    info!("Generated {} document(s)", results.len());
    Ok(Json(GenerateResponse { results }))
}

// ────────────────────────────────────────────────────────────────────────────
// History
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/history?limit=
pub async fn handle_list_history(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<GenerationRecord>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(state.store.list_generations(limit).await?))
}

/// GET /api/history/:id
pub async fn handle_get_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<GenerationRecord>, AppError> {
    Ok(Json(state.store.get_generation(id).await?))
}

/// PUT /api/history/:id
///
/// Replaces the stored output, e.g. after the user edited the markdown.
pub async fn handle_update_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<UpdateGenerationRequest>,
) -> Result<Json<GenerationRecord>, AppError> {
    state.store.update_generation(id, &request.output).await?;
    Ok(Json(state.store.get_generation(id).await?))
}

/// DELETE /api/history/:id
pub async fn handle_delete_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_generation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Reference resumes
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/resumes?limit=
pub async fn handle_list_resumes(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<ResumeRecord>>, AppError> {
    let limit = query.limit.unwrap_or(RESUME_LIST_LIMIT);
    Ok(Json(state.store.list_resumes(limit).await?))
}

/// GET /api/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ResumeRecord>, AppError> {
    Ok(Json(state.store.get_resume(id).await?))
}

/// GET /api/resumes/merged
pub async fn handle_merged_resumes(
    State(state): State<AppState>,
) -> Result<Json<MergedResumeResponse>, AppError> {
    let resumes = state.store.list_resumes(RESUME_LIST_LIMIT).await?;
    Ok(Json(MergedResumeResponse {
        content: merge_resume_text(&resumes),
    }))
}

/// POST /api/resumes (multipart, one field named `file`)
///
/// Extracts and normalizes the text, then stores it as a reference resume.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeRecord>), AppError> {
    let mut upload: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read multipart: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("resume").to_string();
        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file data: {e}")))?;
        upload = Some((filename, mime, data.to_vec()));
    }

    let (filename, mime, data) =
        upload.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    // PDF parsing is CPU-bound; keep it off the async workers.
    let (filename, mime, text) = tokio::task::spawn_blocking(move || {
        let text = extract_text(&filename, &mime, &data).map(|t| normalize(&t));
        (filename, mime, text)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("Extraction task failed: {e}")))?;
    let text = text?;

    if text.is_empty() {
        return Err(AppError::Validation(format!(
            "No text could be extracted from '{filename}'"
        )));
    }

    let id = state.store.add_resume(&filename, &mime, &text).await?;
    info!("Stored reference resume {id} ({filename}, {} chars)", text.len());
    Ok((StatusCode::CREATED, Json(state.store.get_resume(id).await?)))
}
