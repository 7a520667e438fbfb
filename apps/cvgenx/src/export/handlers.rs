//! Axum route handler for document downloads.

use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::info;

use crate::errors::{AppError, ValidatedJson};
use crate::export::{render, slugify, ExportFormat};

const DEFAULT_FILE_STEM: &str = "cvgenx";

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content: String,
}

fn default_format() -> String {
    "md".to_string()
}

/// File stem safe to put in a `Content-Disposition` header. A trailing
/// extension matching the requested format is dropped so it is not doubled.
fn download_stem(filename: &str, format: ExportFormat) -> String {
    let trimmed = filename.trim();
    let without_ext = trimmed
        .strip_suffix(&format!(".{}", format.extension()))
        .unwrap_or(trimmed);
    match slugify(without_ext) {
        stem if stem.is_empty() => DEFAULT_FILE_STEM.to_string(),
        stem => stem,
    }
}

/// POST /api/download
///
/// Converts the posted markdown and returns it as an attachment.
pub async fn handle_download(
    ValidatedJson(request): ValidatedJson<DownloadRequest>,
) -> Result<Response, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("Missing content".to_string()));
    }
    let format = request
        .format
        .parse::<ExportFormat>()
        .map_err(AppError::Validation)?;

    let content = request.content;
    let bytes = tokio::task::spawn_blocking(move || render(format, &content))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Export task failed: {e}")))??;

    let filename = format!(
        "{}.{}",
        download_stem(&request.filename, format),
        format.extension()
    );
    info!("Serving {filename} ({} bytes)", bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}
