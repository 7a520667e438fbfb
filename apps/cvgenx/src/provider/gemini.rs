//! Google Gemini backend (`generateContent` REST API).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{strip_markdown_fences, ContentProvider, GenerateContent};
use crate::config::DEFAULT_MODEL_NAME;
use crate::errors::AppError;

/// Cheap model used for key validation.
const VALIDATION_MODEL: &str = "gemini-2.0-flash";
const VALIDATION_PROMPT: &str = "ping";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiContent<'a> {
    role: &'a str,
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeminiResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidatePart {
    text: Option<String>,
}

impl GeminiResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}

impl GeminiErrorBody {
    /// Gemini reports a bad key as 400 INVALID_ARGUMENT rather than 401.
    fn is_invalid_key(&self) -> bool {
        self.details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
            || self.message.contains("API key not valid")
    }
}

#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    base_url: String,
}

impl GeminiProvider {
    /// No client-side timeout: calls run to completion or transport failure.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    fn request_body(prompt: &str) -> GeminiRequest<'_> {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user",
                parts: vec![GeminiPart { text: prompt }],
            }],
        }
    }
}

#[async_trait]
impl ContentProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn generate_content(&self, request: GenerateContent<'_>) -> Result<String, AppError> {
        let credential = request
            .credential
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::Configuration(
                    "No API key configured. Run `cvgenx auth` or save a key in settings."
                        .to_string(),
                )
            })?;

        let model = match request.model.trim() {
            "" => DEFAULT_MODEL_NAME,
            model => model,
        };

        info!(
            "Generating {} with {} (candidate: {})",
            request.kind.label(),
            model,
            if request.profile.name.is_empty() {
                "<unnamed>"
            } else {
                request.profile.name.as_str()
            }
        );

        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, credential)
            .json(&Self::request_body(request.prompt))
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Request to Gemini failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AppError::Provider(format!(
                "Gemini returned {}: {}",
                status.as_u16(),
                message
            )));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Unreadable Gemini response: {e}")))?;

        let text = strip_markdown_fences(&parsed.text()).to_string();
        if text.is_empty() {
            return Err(AppError::Provider(
                "Gemini returned no content".to_string(),
            ));
        }

        debug!("Gemini returned {} characters", text.len());
        Ok(text)
    }

    async fn validate_key(&self, credential: &str) -> bool {
        let credential = credential.trim();
        if credential.is_empty() {
            return true;
        }

        let response = match self
            .client
            .post(self.endpoint(VALIDATION_MODEL))
            .header(API_KEY_HEADER, credential)
            .json(&Self::request_body(VALIDATION_PROMPT))
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Key validation request failed: {e}");
                return false;
            }
        };

        match response.status() {
            StatusCode::OK => true,
            // Authenticated but the request itself was rejected, unless the
            // rejection is about the key.
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                !serde_json::from_str::<GeminiError>(&body)
                    .map(|e| e.error.is_invalid_key())
                    .unwrap_or(false)
            }
            status => {
                debug!("Key validation returned {status}");
                false
            }
        }
    }
}
