//! Generation pipeline.
//!
//! Flow: validate job description → read config → resolve profile →
//!       resolve reference text → per kind: build prompt → provider → persist.
//!
//! Kinds are generated strictly in order; a failure stops the run and is
//! returned unchanged. Records persisted before the failure stay in history.

use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::generation::prompt_builder::build_prompt;
use crate::generation::reference::resolve_reference;
use crate::models::{ContentRequest, GenerationRecord, UserProfile};
use crate::provider::{ContentProvider, GenerateContent};
use crate::store::Store;

/// One generation request. Deserializes from the `POST /api/generate` body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub job_description: String,
    #[serde(rename = "type", default = "default_content")]
    pub content: ContentRequest,
    #[serde(default)]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub resume_id: Option<i64>,
    #[serde(default)]
    pub profile_id: Option<i64>,
}

fn default_content() -> ContentRequest {
    ContentRequest::Resume
}

impl GenerateRequest {
    pub fn new(job_description: impl Into<String>, content: ContentRequest) -> Self {
        Self {
            job_description: job_description.into(),
            content,
            resume_text: None,
            resume_id: None,
            profile_id: None,
        }
    }
}

/// Resolves the profile for a request: a saved profile when `profile_id` is
/// given, otherwise the snapshot held in the configuration record.
async fn resolve_profile(
    store: &Store,
    profile_id: Option<i64>,
    snapshot: UserProfile,
) -> Result<UserProfile, AppError> {
    match profile_id {
        Some(id) => Ok(store.get_profile(id).await?.data),
        None => Ok(snapshot),
    }
}

/// Runs the pipeline and returns the persisted records, in generation order.
pub async fn generate(
    store: &Store,
    provider: &dyn ContentProvider,
    default_model: &str,
    request: &GenerateRequest,
) -> Result<Vec<GenerationRecord>, AppError> {
    let job_description = request.job_description.trim();
    if job_description.is_empty() {
        return Err(AppError::Validation(
            "Job description must not be empty".to_string(),
        ));
    }

    // Read fresh on every request so a key saved a moment ago is used.
    let config = store.get_config().await?;
    let provider_config = config.provider();
    let model = match provider_config.model_name.trim() {
        "" => default_model,
        name => name,
    };
    let credential = Some(provider_config.api_key.as_str()).filter(|k| !k.trim().is_empty());

    let profile = resolve_profile(store, request.profile_id, config.profile).await?;
    let (reference_text, resume_id) =
        resolve_reference(store, request.resume_text.as_deref(), request.resume_id).await?;

    let kinds = request.content.kinds();
    info!(
        "Generating {} document(s) with {} (model {}, reference: {})",
        kinds.len(),
        provider.name(),
        model,
        if reference_text.is_some() { "yes" } else { "no" }
    );

    // Nothing is stored until every requested document has been produced.
    let mut outputs = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let prompt = build_prompt(&profile, job_description, kind, reference_text.as_deref());
        let output = provider
            .generate_content(GenerateContent {
                prompt: &prompt,
                kind,
                profile: &profile,
                credential,
                model,
            })
            .await?;
        outputs.push((kind, output));
    }

    let mut records = Vec::with_capacity(outputs.len());
    for (kind, output) in outputs {
        let id = store
            .add_generation(kind, job_description, &output, resume_id, request.profile_id)
            .await?;
        records.push(store.get_generation(id).await?);
    }

    Ok(records)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ConfigUpdate, ContentKind};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every call and answers with a canned document per kind.
    #[derive(Default)]
    pub(crate) struct MockProvider {
        pub calls: Mutex<Vec<(ContentKind, String, Option<String>, String)>>,
        pub fail_on: Option<ContentKind>,
    }

    #[async_trait]
    impl ContentProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        async fn generate_content(&self, request: GenerateContent<'_>) -> Result<String, AppError> {
            self.calls.lock().unwrap().push((
                request.kind,
                request.prompt.to_string(),
                request.credential.map(str::to_string),
                request.model.to_string(),
            ));
            let Some(_) = request.credential else {
                return Err(AppError::Configuration("missing key".into()));
            };
            if self.fail_on == Some(request.kind) {
                return Err(AppError::Provider("upstream down".into()));
            }
            Ok(format!("# {} for {}", request.kind.label(), request.profile.name))
        }

        async fn validate_key(&self, credential: &str) -> bool {
            credential.is_empty() || credential.starts_with("valid")
        }
    }

    async fn store_with_key() -> Store {
        let store = Store::in_memory().await;
        store
            .save_config(ConfigUpdate {
                api_key: Some("valid-key".into()),
                profile: Some(UserProfile {
                    name: "Jane Doe".into(),
                    email: "jane@x.com".into(),
                    education: vec!["BS CS".into()],
                    ..Default::default()
                }),
                ..Default::default()
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_blank_job_description_is_rejected_before_provider() {
        let store = store_with_key().await;
        let provider = MockProvider::default();
        let result = generate(
            &store,
            &provider,
            "gemini-2.0-flash",
            &GenerateRequest::new("  \n ", ContentRequest::Resume),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_both_generates_resume_then_cover_letter() {
        let store = store_with_key().await;
        let provider = MockProvider::default();
        let records = generate(
            &store,
            &provider,
            "gemini-2.0-flash",
            &GenerateRequest::new("Backend engineer, Go, Kubernetes", ContentRequest::Both),
        )
        .await
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, ContentKind::Resume);
        assert_eq!(records[0].output, "# resume for Jane Doe");
        assert_eq!(records[1].kind, ContentKind::CoverLetter);

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls[0].0, ContentKind::Resume);
        assert!(calls[0].1.contains("Jane Doe"));
        assert!(calls[0].1.contains("Backend engineer, Go, Kubernetes"));
        assert_eq!(calls[0].2.as_deref(), Some("valid-key"));
        assert_eq!(calls[0].3, "gemini-2.0-flash");

        assert_eq!(store.list_generations(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_key_surfaces_configuration_error() {
        let store = Store::in_memory().await;
        let provider = MockProvider::default();
        let result = generate(
            &store,
            &provider,
            "gemini-2.0-flash",
            &GenerateRequest::new("Backend engineer", ContentRequest::Resume),
        )
        .await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
        assert!(store.list_generations(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_cover_letter_stores_nothing() {
        let store = store_with_key().await;
        let provider = MockProvider {
            fail_on: Some(ContentKind::CoverLetter),
            ..Default::default()
        };
        let result = generate(
            &store,
            &provider,
            "gemini-2.0-flash",
            &GenerateRequest::new("Backend engineer", ContentRequest::Both),
        )
        .await;
        assert!(matches!(result, Err(AppError::Provider(_))));
        assert_eq!(provider.calls.lock().unwrap().len(), 2);
        assert!(store.list_generations(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_resume_skips_cover_letter() {
        let store = store_with_key().await;
        let provider = MockProvider {
            fail_on: Some(ContentKind::Resume),
            ..Default::default()
        };
        let result = generate(
            &store,
            &provider,
            "gemini-2.0-flash",
            &GenerateRequest::new("Backend engineer", ContentRequest::Both),
        )
        .await;
        assert!(matches!(result, Err(AppError::Provider(_))));
        assert_eq!(provider.calls.lock().unwrap().len(), 1);
        assert!(store.list_generations(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_saved_profile_and_reference_are_used() {
        let store = store_with_key().await;
        store
            .save_config(ConfigUpdate {
                model_name: Some("gemini-1.5-pro".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let profile_id = store
            .add_profile(
                "Platform",
                &UserProfile {
                    name: "John Roe".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let resume_id = store
            .add_resume("old.txt", "text/plain", "Acme Corp 2019-2023")
            .await
            .unwrap();

        let provider = MockProvider::default();
        let mut request = GenerateRequest::new("SRE role", ContentRequest::CoverLetter);
        request.profile_id = Some(profile_id);
        let records = generate(&store, &provider, "gemini-2.0-flash", &request)
            .await
            .unwrap();

        assert_eq!(records[0].profile_id, Some(profile_id));
        assert_eq!(records[0].resume_id, Some(resume_id));
        let calls = provider.calls.lock().unwrap();
        assert!(calls[0].1.contains("John Roe"));
        assert!(calls[0].1.contains("Acme Corp 2019-2023"));
        assert_eq!(calls[0].3, "gemini-1.5-pro");
    }

    #[tokio::test]
    async fn test_unknown_profile_is_not_found() {
        let store = store_with_key().await;
        let provider = MockProvider::default();
        let mut request = GenerateRequest::new("SRE role", ContentRequest::Resume);
        request.profile_id = Some(42);
        let result = generate(&store, &provider, "gemini-2.0-flash", &request).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_request_deserializes_from_api_body() {
        let request: GenerateRequest = serde_json::from_str(
            r#"{"jobDescription":"SRE","type":"coverLetter","resumeId":3,"profileId":null}"#,
        )
        .unwrap();
        assert_eq!(request.content, ContentRequest::CoverLetter);
        assert_eq!(request.resume_id, Some(3));
        assert_eq!(request.profile_id, None);

        let request: GenerateRequest =
            serde_json::from_str(r#"{"jobDescription":"SRE"}"#).unwrap();
        assert_eq!(request.content, ContentRequest::Resume);
    }
}
