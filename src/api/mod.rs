//! API 路由模块

mod auth;
mod config;
mod health;
mod ideas;
mod quiz;

pub use config::config_routes;
pub use health::health_routes;
pub use ideas::idea_routes;
pub use quiz::quiz_routes;

use axum::Router;

use crate::state::SharedState;

/// 创建所有 API 路由
pub fn create_api_routes(state: SharedState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(config_routes())
        .merge(quiz_routes())
        .merge(idea_routes())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::auth::USER_ID_HEADER;
    use super::*;
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::config::{AppConfig, ConfigStore};
    use crate::llm::{GenerationBackend, LlmError};
    use crate::services::idea_generator::RetryPolicy;
    use crate::services::IdeaGenerator;
    use crate::state::AppState;

    const IDEA_TEXT: &str = "Title: Stargazing Picnic\nDescription: Blankets and a thermos\nEstimated cost: $25\nDuration: 3 hours\nWhat makes it special: Shooting stars";

    /// 固定返回同一结果的后端
    struct FixedBackend {
        fail: bool,
        calls: Mutex<usize>,
    }

    impl FixedBackend {
        fn ok() -> Arc<Self> {
            Arc::new(Self {
                fail: false,
                calls: Mutex::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                fail: true,
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl GenerationBackend for FixedBackend {
        async fn generate_content(&self, _prompt: &str) -> Result<String, LlmError> {
            *self.calls.lock() += 1;
            if self.fail {
                Err(LlmError::Timeout)
            } else {
                Ok(IDEA_TEXT.to_string())
            }
        }

        fn model(&self) -> &str {
            "fixed"
        }

        fn endpoint(&self) -> &str {
            "http://fixed.local"
        }
    }

    async fn state_in(dir: &TempDir) -> AppState {
        let config = AppConfig {
            data_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let store = ConfigStore::with_config(dir.path().join("config.json"), config);
        AppState::new(store).await.unwrap()
    }

    /// 一直不返回的后端
    struct HangingBackend;

    #[async_trait]
    impl GenerationBackend for HangingBackend {
        async fn generate_content(&self, _prompt: &str) -> Result<String, LlmError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(IDEA_TEXT.to_string())
        }

        fn model(&self) -> &str {
            "hanging"
        }

        fn endpoint(&self) -> &str {
            "http://hanging.local"
        }
    }

    async fn app_with(dir: &TempDir, backend: Arc<dyn GenerationBackend>) -> Router {
        let generator = IdeaGenerator::new(
            Some(backend),
            RetryPolicy {
                max_attempts: 3,
                backoff_step: Duration::ZERO,
            },
        );
        let state = state_in(dir).await.with_generator(generator);
        create_api_routes(Arc::new(state))
    }

    async fn send(app: &Router, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(USER_ID_HEADER, user);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// 走完基础问卷，返回会话 ID
    async fn complete_basic_quiz(app: &Router) -> String {
        let (status, started) = send(app, Method::POST, "/api/quiz", None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = started["sessionId"].as_str().unwrap().to_string();

        let answers = [
            json!({"index": 0, "answer": {"question": "mood", "value": "romantic"}}),
            json!({"index": 1, "answer": {"question": "budget", "value": 80}}),
        ];
        for answer in answers {
            let (status, _) = send(app, Method::POST, &format!("/api/quiz/{}/answer", id), None, Some(answer)).await;
            assert_eq!(status, StatusCode::OK);
        }

        // 预算题只能通过 next 前进
        let (_, body) = send(app, Method::POST, &format!("/api/quiz/{}/next", id), None, None).await;
        assert_eq!(body["question"]["index"], 2);

        let rest = [
            json!({"index": 2, "answer": {"question": "location", "value": "outdoor"}}),
            json!({"index": 3, "answer": {"question": "food_preference", "value": "yes"}}),
        ];
        for answer in rest {
            send(app, Method::POST, &format!("/api/quiz/{}/answer", id), None, Some(answer)).await;
        }

        let (_, body) = send(app, Method::GET, &format!("/api/quiz/{}", id), None, None).await;
        assert_eq!(body["complete"], true);
        id
    }

    #[tokio::test]
    async fn test_saved_ideas_require_sign_in() {
        let dir = TempDir::new().unwrap();
        let app = app_with(&dir, FixedBackend::ok()).await;

        let (status, body) = send(&app, Method::GET, "/api/ideas", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "not signed in");
    }

    #[tokio::test]
    async fn test_incomplete_preferences_rejected_before_network() {
        let dir = TempDir::new().unwrap();
        let backend = FixedBackend::ok();
        let app = app_with(&dir, Arc::<FixedBackend>::clone(&backend)).await;

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ideas/generate",
            None,
            Some(json!({"mood": "fun", "budget": 50})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_quiz_generate_and_save() {
        let dir = TempDir::new().unwrap();
        let app = app_with(&dir, FixedBackend::ok()).await;
        let id = complete_basic_quiz(&app).await;

        let (status, body) = send(&app, Method::POST, &format!("/api/quiz/{}/generate", id), Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["idea"]["title"], "Stargazing Picnic");
        assert_eq!(body["preferences"]["budget"], 80);
        assert!(body.get("storageWarning").is_none());

        let (status, saved) = send(&app, Method::POST, &format!("/api/quiz/{}/save", id), Some("alice"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(saved["idea"]["duration"], "3 hours");

        let (_, list) = send(&app, Method::GET, "/api/ideas", Some("alice"), None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (_, others) = send(&app, Method::GET, "/api/ideas", Some("bob"), None).await;
        assert!(others.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quiz_save_requires_sign_in() {
        let dir = TempDir::new().unwrap();
        let app = app_with(&dir, FixedBackend::ok()).await;
        let id = complete_basic_quiz(&app).await;

        let (status, _) = send(&app, Method::POST, &format!("/api/quiz/{}/generate", id), None, None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, Method::POST, &format!("/api/quiz/{}/save", id), None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_failed_generation_returns_to_final_question() {
        let dir = TempDir::new().unwrap();
        let backend = FixedBackend::failing();
        let app = app_with(&dir, Arc::<FixedBackend>::clone(&backend)).await;
        let id = complete_basic_quiz(&app).await;

        let (status, body) = send(&app, Method::POST, &format!("/api/quiz/{}/generate", id), None, None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body["error"].as_str().unwrap().contains("timed out"));
        assert_eq!(backend.calls(), 3);

        let (_, quiz) = send(&app, Method::GET, &format!("/api/quiz/{}", id), None, None).await;
        assert_eq!(quiz["complete"], false);
        assert_eq!(quiz["generating"], false);
        assert_eq!(quiz["question"]["index"], 3);
        assert_eq!(quiz["answers"]["mood"], "romantic");
        assert_eq!(quiz["answers"]["budget"], 80);
    }

    #[tokio::test]
    async fn test_missing_api_key_reports_configuration() {
        let dir = TempDir::new().unwrap();
        let app = create_api_routes(Arc::new(state_in(&dir).await));

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/ideas/generate",
            None,
            Some(json!({"mood": "fun", "budget": 50, "location": "indoor", "foodPreference": "no"})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("API key"));
    }

    #[tokio::test]
    async fn test_checklist_scoped_to_owner() {
        let dir = TempDir::new().unwrap();
        let app = app_with(&dir, FixedBackend::ok()).await;

        let (_, saved) = send(&app, Method::POST, "/api/ideas", Some("alice"), Some(json!({"idea": IDEA_TEXT}))).await;
        let idea_id = saved["id"].as_str().unwrap().to_string();

        let (status, checklist) = send(&app, Method::GET, &format!("/api/ideas/{}/checklist", idea_id), Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(checklist["items"].as_array().unwrap().len(), 3);

        let (status, toggled) = send(
            &app,
            Method::POST,
            &format!("/api/ideas/{}/checklist/items/1/toggle", idea_id),
            Some("alice"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(toggled["items"][0]["isCompleted"], true);

        let (status, _) = send(&app, Method::GET, &format!("/api/ideas/{}/checklist", idea_id), Some("bob"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_share_message_from_saved_idea() {
        let dir = TempDir::new().unwrap();
        let app = app_with(&dir, FixedBackend::ok()).await;

        let (_, saved) = send(&app, Method::POST, "/api/ideas", Some("alice"), Some(json!({"idea": IDEA_TEXT}))).await;
        let idea_id = saved["id"].as_str().unwrap().to_string();

        let (status, body) = send(&app, Method::GET, &format!("/api/ideas/{}/share", idea_id), Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("Stargazing Picnic"));
    }

    #[tokio::test]
    async fn test_dropped_generate_request_releases_session() {
        let dir = TempDir::new().unwrap();
        let app = app_with(&dir, Arc::new(HangingBackend)).await;
        let id = complete_basic_quiz(&app).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/quiz/{}/generate", id))
            .body(Body::empty())
            .unwrap();
        let dropped = tokio::time::timeout(Duration::from_millis(50), app.clone().oneshot(request)).await;
        assert!(dropped.is_err());

        let (_, quiz) = send(&app, Method::GET, &format!("/api/quiz/{}", id), None, None).await;
        assert_eq!(quiz["generating"], false);
        assert_eq!(quiz["complete"], false);
        assert_eq!(quiz["question"]["index"], 3);
        assert_eq!(quiz["answers"]["location"], "outdoor");

        let (status, quiz) = send(
            &app,
            Method::POST,
            &format!("/api/quiz/{}/answer", id),
            None,
            Some(json!({"index": 3, "answer": {"question": "food_preference", "value": "no"}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quiz["complete"], true);
    }

    #[tokio::test]
    async fn test_failed_save_keeps_idea_for_retry() {
        let dir = TempDir::new().unwrap();
        let app = app_with(&dir, FixedBackend::ok()).await;
        let id = complete_basic_quiz(&app).await;

        let (status, _) = send(&app, Method::POST, &format!("/api/quiz/{}/generate", id), Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);

        // 临时文件位置被目录占用，写入失败
        let blocker = dir.path().join("ideas.json.tmp");
        std::fs::create_dir(&blocker).unwrap();

        let (status, body) = send(&app, Method::POST, &format!("/api/quiz/{}/save", id), Some("alice"), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to save your changes. Please try again.");

        let (_, quiz) = send(&app, Method::GET, &format!("/api/quiz/{}", id), None, None).await;
        assert_eq!(quiz["idea"]["title"], "Stargazing Picnic");

        std::fs::remove_dir(&blocker).unwrap();

        let (status, saved) = send(&app, Method::POST, &format!("/api/quiz/{}/save", id), Some("alice"), None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(saved["idea"]["title"], "Stargazing Picnic");

        let (_, list) = send(&app, Method::GET, "/api/ideas", Some("alice"), None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generation_log_failure_is_a_warning() {
        let dir = TempDir::new().unwrap();
        let app = app_with(&dir, FixedBackend::ok()).await;
        let id = complete_basic_quiz(&app).await;

        std::fs::create_dir(dir.path().join("ideas.json.tmp")).unwrap();

        let (status, body) = send(&app, Method::POST, &format!("/api/quiz/{}/generate", id), Some("alice"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["idea"]["title"], "Stargazing Picnic");
        assert_eq!(body["storageWarning"], "Your idea was generated but could not be recorded.");
    }

    #[tokio::test]
    async fn test_calendar_rejects_huge_duration() {
        let dir = TempDir::new().unwrap();
        let app = app_with(&dir, FixedBackend::ok()).await;

        let (_, saved) = send(&app, Method::POST, "/api/ideas", Some("alice"), Some(json!({"idea": IDEA_TEXT}))).await;
        let idea_id = saved["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/api/ideas/{}/calendar", idea_id),
            Some("alice"),
            Some(json!({"start": "2026-02-14T18:00:00Z", "durationHours": 1e15})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
