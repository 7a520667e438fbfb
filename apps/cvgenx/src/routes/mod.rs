pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::export::handlers as export;
use crate::generation::handlers as generation;
use crate::profile::handlers as profile;
use crate::state::AppState;

/// Upper bound for uploaded reference resumes.
const UPLOAD_BODY_LIMIT: usize = 8 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Settings and profiles
        .route(
            "/api/config",
            get(profile::handle_get_config).put(profile::handle_update_config),
        )
        .route(
            "/api/profile",
            get(profile::handle_get_profile).put(profile::handle_update_profile),
        )
        .route(
            "/api/profiles",
            get(profile::handle_list_profiles).post(profile::handle_create_profile),
        )
        .route(
            "/api/profiles/:id",
            get(profile::handle_get_saved_profile)
                .put(profile::handle_update_saved_profile)
                .delete(profile::handle_delete_profile),
        )
        // Reference resumes
        .route(
            "/api/resumes",
            get(generation::handle_list_resumes)
                .post(generation::handle_upload_resume)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/resumes/merged", get(generation::handle_merged_resumes))
        .route("/api/resumes/:id", get(generation::handle_get_resume))
        // Generation and history
        .route("/api/generate", post(generation::handle_generate))
        .route("/api/history", get(generation::handle_list_history))
        .route(
            "/api/history/:id",
            get(generation::handle_get_history)
                .put(generation::handle_update_history)
                .delete(generation::handle_delete_history),
        )
        // Export
        .route("/api/download", post(export::handle_download))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::generation::generator::tests::MockProvider;
    use crate::models::ConfigUpdate;
    use crate::store::Store;

    async fn test_state() -> AppState {
        AppState {
            store: Store::in_memory().await,
            provider: Arc::new(MockProvider::default()),
            config: Config::for_tests("http://localhost"),
        }
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        build_router(state.clone()).oneshot(request).await.unwrap()
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state().await;
        let response = send(&state, get_request("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["service"], "cvgenx");
    }

    #[tokio::test]
    async fn test_config_rejects_invalid_key() {
        let state = test_state().await;
        let response = send(
            &state,
            json_request("PUT", "/api/config", json!({"apiKey": "bogus"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "CONFIGURATION_ERROR"
        );
        assert!(!state.store.get_config().await.unwrap().has_api_key());
    }

    #[tokio::test]
    async fn test_config_summary_hides_key() {
        let state = test_state().await;
        let response = send(
            &state,
            json_request("PUT", "/api/config", json!({"apiKey": "valid-secret-9876"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(send(&state, get_request("/api/config")).await).await;
        assert_eq!(body["hasApiKey"], true);
        assert_eq!(body["keyPreview"], "••••9876");
        assert_eq!(body["modelName"], "gemini-2.0-flash");
        assert!(!body.to_string().contains("valid-secret"));
    }

    #[tokio::test]
    async fn test_generate_then_history() {
        let state = test_state().await;
        state
            .store
            .save_config(ConfigUpdate {
                api_key: Some("valid-key".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        send(
            &state,
            json_request("PUT", "/api/profile", json!({"name": "Jane Doe"})),
        )
        .await;

        let response = send(
            &state,
            json_request(
                "POST",
                "/api/generate",
                json!({"jobDescription": "Backend engineer, Go", "type": "both"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["type"], "resume");
        assert_eq!(results[1]["type"], "coverLetter");
        assert_eq!(results[0]["output"], "# resume for Jane Doe");

        let history = body_json(send(&state, get_request("/api/history?limit=1")).await).await;
        assert_eq!(history.as_array().unwrap().len(), 1);
        assert_eq!(history[0]["type"], "coverLetter");
    }

    #[tokio::test]
    async fn test_generate_without_key_is_configuration_error() {
        let state = test_state().await;
        let response = send(
            &state,
            json_request("POST", "/api/generate", json!({"jobDescription": "Go"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"]["code"],
            "CONFIGURATION_ERROR"
        );
    }

    #[tokio::test]
    async fn test_missing_history_is_not_found() {
        let state = test_state().await;
        let response = send(&state, get_request("/api/history/42")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_pdf() {
        let state = test_state().await;
        let response = send(
            &state,
            json_request(
                "POST",
                "/api/download",
                json!({"format": "pdf", "filename": "Jane Doe resume", "content": "# Jane Doe\n"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"jane-doe-resume.pdf\""
        );
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_download_rejects_bad_input() {
        let state = test_state().await;
        let empty = send(
            &state,
            json_request("POST", "/api/download", json!({"format": "docx", "content": "  "})),
        )
        .await;
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);

        let unknown = send(
            &state,
            json_request("POST", "/api/download", json!({"format": "rtf", "content": "# Hi"})),
        )
        .await;
        assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_validation_errors() {
        let state = test_state().await;
        let bodies = [
            ("/api/generate", json!({"jobDescription": "Go", "type": "poem"})),
            ("/api/generate", json!({"type": "resume"})),
            ("/api/download", json!({"format": "pdf", "content": 5})),
        ];
        for (uri, body) in bodies {
            let response = send(&state, json_request("POST", uri, body)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body = body_json(response).await;
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
            assert!(body["error"]["message"]
                .as_str()
                .unwrap()
                .starts_with("Invalid request body"));
        }

        let not_json = Request::builder()
            .method("POST")
            .uri("/api/generate")
            .body(Body::from("jobDescription=Go"))
            .unwrap();
        let response = send(&state, not_json).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_upload_and_merge_resumes() {
        let state = test_state().await;
        let boundary = "cvgenx-test-boundary";
        let body = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"old.txt\"\r\n\
             Content-Type: text/plain\r\n\r\n\
             Jane Doe\r\nBackend engineer\r\n\
             --{boundary}--\r\n"
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/resumes")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .unwrap();

        let response = send(&state, request).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let record = body_json(response).await;
        assert_eq!(record["filename"], "old.txt");
        assert!(record["content"].as_str().unwrap().contains("Backend engineer"));

        let merged = body_json(send(&state, get_request("/api/resumes/merged")).await).await;
        assert!(merged["content"].as_str().unwrap().contains("Jane Doe"));
    }

    #[tokio::test]
    async fn test_saved_profile_lifecycle() {
        let state = test_state().await;
        let created = send(
            &state,
            json_request(
                "POST",
                "/api/profiles",
                json!({"name": "Backend", "data": {"name": "Jane Doe"}}),
            ),
        )
        .await;
        assert_eq!(created.status(), StatusCode::CREATED);
        let id = body_json(created).await["id"].as_i64().unwrap();

        let deleted = send(
            &state,
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/profiles/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

        let missing = send(&state, get_request(&format!("/api/profiles/{id}"))).await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
