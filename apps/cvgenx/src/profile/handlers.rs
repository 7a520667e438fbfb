//! Axum route handlers for settings and profiles.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::{AppError, ValidatedJson};
use crate::models::{ConfigSummary, ConfigUpdate, ProfileRecord, StoredConfig, UserProfile};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveProfileRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: UserProfile,
}

fn summarize(state: &AppState, config: &StoredConfig) -> ConfigSummary {
    ConfigSummary {
        has_api_key: config.has_api_key(),
        model_name: state.config.model_or_default(&config.model_name).to_string(),
        key_preview: config.key_preview(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Settings
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/config
pub async fn handle_get_config(
    State(state): State<AppState>,
) -> Result<Json<ConfigSummary>, AppError> {
    let config = state.store.get_config().await?;
    Ok(Json(summarize(&state, &config)))
}

/// PUT /api/config
///
/// A non-empty key is checked with the provider before it is stored. An empty
/// key clears the credential.
pub async fn handle_update_config(
    State(state): State<AppState>,
    ValidatedJson(mut update): ValidatedJson<ConfigUpdate>,
) -> Result<Json<ConfigSummary>, AppError> {
    update.api_key = update.api_key.map(|k| k.trim().to_string());
    update.model_name = update.model_name.map(|m| m.trim().to_string());
    update.profile = None;

    if let Some(key) = update.api_key.as_deref().filter(|k| !k.is_empty()) {
        if !state.provider.validate_key(key).await {
            warn!("Rejected {} API key", state.provider.name());
            return Err(AppError::Configuration(format!(
                "The {} API key was rejected",
                state.provider.name()
            )));
        }
    }

    state.store.save_config(update).await?;
    info!("Settings updated");

    let config = state.store.get_config().await?;
    Ok(Json(summarize(&state, &config)))
}

// ────────────────────────────────────────────────────────────────────────────
// Profile snapshot
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
) -> Result<Json<UserProfile>, AppError> {
    Ok(Json(state.store.get_config().await?.profile))
}

/// PUT /api/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    ValidatedJson(profile): ValidatedJson<UserProfile>,
) -> Result<Json<UserProfile>, AppError> {
    state.store.save_profile_snapshot(profile).await?;
    Ok(Json(state.store.get_config().await?.profile))
}

// ────────────────────────────────────────────────────────────────────────────
// Saved profiles
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/profiles
pub async fn handle_list_profiles(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProfileRecord>>, AppError> {
    Ok(Json(state.store.list_profiles().await?))
}

/// POST /api/profiles
pub async fn handle_create_profile(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SaveProfileRequest>,
) -> Result<(StatusCode, Json<ProfileRecord>), AppError> {
    let id = state.store.add_profile(&request.name, &request.data).await?;
    info!("Created profile {id}");
    Ok((StatusCode::CREATED, Json(state.store.get_profile(id).await?)))
}

/// GET /api/profiles/:id
pub async fn handle_get_saved_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ProfileRecord>, AppError> {
    Ok(Json(state.store.get_profile(id).await?))
}

/// PUT /api/profiles/:id
pub async fn handle_update_saved_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ValidatedJson(request): ValidatedJson<SaveProfileRequest>,
) -> Result<Json<ProfileRecord>, AppError> {
    state
        .store
        .update_profile(id, &request.name, &request.data)
        .await?;
    Ok(Json(state.store.get_profile(id).await?))
}

/// DELETE /api/profiles/:id
pub async fn handle_delete_profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_profile(id).await?;
    info!("Deleted profile {id}");
    Ok(StatusCode::NO_CONTENT)
}
