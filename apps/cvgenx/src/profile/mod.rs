//! Profile management: import from files, display, interactive editing and
//! the credential setup flow.

use std::path::Path;

use crate::errors::AppError;
use crate::models::UserProfile;

pub mod auth;
pub mod form;
pub mod handlers;

/// Serialization used when printing a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ProfileFormat {
    #[default]
    Json,
    Yaml,
}

/// Parses a profile document, choosing the format from the file extension.
pub fn parse_profile(path: &Path, content: &str) -> Result<UserProfile, AppError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "json" => serde_json::from_str(content)
            .map_err(|e| AppError::Validation(format!("Invalid JSON profile: {e}"))),
        "yaml" | "yml" => serde_yaml::from_str(content)
            .map_err(|e| AppError::Validation(format!("Invalid YAML profile: {e}"))),
        _ => Err(AppError::Validation(format!(
            "Unsupported profile format '{}' (use .json, .yaml or .yml)",
            path.display()
        ))),
    }
}

pub async fn read_profile_file(path: &Path) -> Result<UserProfile, AppError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Validation(format!("Failed to read {}: {e}", path.display()))
    })?;
    parse_profile(path, &content)
}

pub fn render_profile(profile: &UserProfile, format: ProfileFormat) -> Result<String, AppError> {
    match format {
        ProfileFormat::Json => serde_json::to_string_pretty(profile)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to render profile: {e}"))),
        ProfileFormat::Yaml => serde_yaml::to_string(profile)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to render profile: {e}"))),
    }
}
