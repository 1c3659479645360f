//! 创意生成服务
//!
//! 单次尝试 [`IdeaGenerator::attempt`] 只做一件事：掷活动类型、构建 prompt、
//! 调用一次后端并解析。[`IdeaGenerator::generate`] 负责重试循环与线性退避。

use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

use super::idea_parser::parse_idea;
use super::prompt_service::{build_prompt, ActivityType};
use crate::config::AppConfig;
use crate::llm::{GeminiClient, GenerationBackend, LlmError};
use crate::models::{GeneratedIdea, PreferenceSet};
use crate::utils::RequestLogger;

/// 生成失败时展示给用户的提示
const USER_RETRY_MESSAGE: &str =
    "We couldn't reach the date idea service. Please check your connection and try again.";
const USER_CONFIG_MESSAGE: &str =
    "Date idea generation is not configured yet. Please add an API key in Settings.";

/// 终止性的生成错误
#[derive(Debug, Error)]
pub enum GenerationError {
    /// 缺少 API 密钥等配置问题，不重试
    #[error("generation is not configured: {0}")]
    Configuration(String),

    /// 重试次数耗尽
    #[error("generation failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl GenerationError {
    /// 面向用户的提示，不包含原始错误
    pub fn user_message(&self) -> &'static str {
        match self {
            GenerationError::Configuration(_) => USER_CONFIG_MESSAGE,
            GenerationError::Exhausted { .. } => USER_RETRY_MESSAGE,
        }
    }
}

/// 重试策略：总尝试次数与线性退避步长
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl RetryPolicy {
    /// 第 `attempt` 次失败后的等待时间
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(1000),
        }
    }
}

/// 创意生成器
pub struct IdeaGenerator {
    backend: Option<Arc<dyn GenerationBackend>>,
    policy: RetryPolicy,
    logger: Option<Arc<RequestLogger>>,
}

impl IdeaGenerator {
    pub fn new(backend: Option<Arc<dyn GenerationBackend>>, policy: RetryPolicy) -> Self {
        Self {
            backend,
            policy,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<RequestLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// 根据当前配置构建
    ///
    /// 没有 API 密钥时不创建后端，后续 `generate` 会立即返回配置错误。
    pub fn from_config(config: &AppConfig, logger: Option<Arc<RequestLogger>>) -> Self {
        let backend: Option<Arc<dyn GenerationBackend>> = match GeminiClient::new(
            config.api_key.clone(),
            &config.base_url,
            config.model.clone(),
            config.generation_options(),
            config.request_timeout(),
        ) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                warn!("Idea generation unavailable: {}", e);
                None
            }
        };

        let policy = RetryPolicy {
            max_attempts: config.max_attempts.max(1),
            backoff_step: config.retry_delay(),
        };

        let generator = Self::new(backend, policy);
        match logger {
            Some(logger) => generator.with_logger(logger),
            None => generator,
        }
    }

    /// 生成一个创意，失败时按策略重试
    pub async fn generate(&self, preferences: &PreferenceSet) -> Result<GeneratedIdea, GenerationError> {
        if self.backend.is_none() {
            error!("Idea generation requested without an API key");
            return Err(GenerationError::Configuration("API Key is required".to_string()));
        }

        let request_id = RequestLogger::generate_request_id();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.attempt_logged(&request_id, preferences, attempt).await {
                Ok(idea) => {
                    info!(
                        request_id = %request_id,
                        attempt,
                        title = %idea.title,
                        "Date idea generated"
                    );
                    return Ok(idea);
                }
                Err(e) if !e.is_retriable() => {
                    error!(request_id = %request_id, attempt, error = %e, "Idea generation failed permanently");
                    return Err(GenerationError::Configuration(e.to_string()));
                }
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        let delay = self.policy.delay_after(attempt);
                        warn!(
                            request_id = %request_id,
                            attempt,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Idea generation failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        error!(
                            request_id = %request_id,
                            attempt,
                            error = %e,
                            "Idea generation failed, no attempts left"
                        );
                    }
                }
            }
        }

        Err(GenerationError::Exhausted {
            attempts: max_attempts,
            last_error,
        })
    }

    /// 单次尝试
    ///
    /// 每次都会重新随机活动类型，因此重试不是字节相同的请求。
    pub async fn attempt(&self, preferences: &PreferenceSet, attempt: u32) -> Result<GeneratedIdea, LlmError> {
        self.attempt_logged("-", preferences, attempt).await
    }

    async fn attempt_logged(
        &self,
        request_id: &str,
        preferences: &PreferenceSet,
        attempt: u32,
    ) -> Result<GeneratedIdea, LlmError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| LlmError::ConfigError("API Key is required".to_string()))?;

        let activity = ActivityType::random();
        let prompt = build_prompt(preferences, activity);

        let log_entry = self.logger.as_ref().map(|logger| {
            logger.log_request(
                request_id,
                attempt,
                backend.endpoint(),
                backend.model(),
                activity.label(),
                &prompt,
            )
        });
        let start_time = Instant::now();

        let result = backend.generate_content(&prompt).await.and_then(|text| {
            let idea = parse_idea(&text);
            if idea.raw.trim().is_empty() {
                Err(LlmError::EmptyResponse("blank response text".to_string()))
            } else {
                Ok(idea)
            }
        });

        if let (Some(logger), Some(entry)) = (self.logger.as_ref(), log_entry) {
            match &result {
                Ok(idea) => logger.log_success(entry, start_time, &idea.raw),
                Err(e) => logger.log_error(entry, start_time, e.kind(), &e.to_string(), e.status_code()),
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Budget, FoodPreference, Location, Mood};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    const IDEA_TEXT: &str = "Title: Picnic\nDescription: Bring snacks\nEstimated cost: $20\nDuration: 2 hours\nWhat makes it special: It's outdoors";

    /// 按脚本返回结果的后端，记录每次调用的 prompt 和时间
    struct ScriptedBackend {
        script: Mutex<Vec<Result<String, LlmError>>>,
        calls: Mutex<Vec<(String, tokio::time::Instant)>>,
    }

    impl ScriptedBackend {
        fn new(mut script: Vec<Result<String, LlmError>>) -> Arc<Self> {
            script.reverse();
            Arc::new(Self {
                script: Mutex::new(script),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl GenerationBackend for ScriptedBackend {
        async fn generate_content(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls
                .lock()
                .push((prompt.to_string(), tokio::time::Instant::now()));
            self.script
                .lock()
                .pop()
                .unwrap_or_else(|| Err(LlmError::EmptyResponse("script exhausted".into())))
        }

        fn model(&self) -> &str {
            "scripted"
        }

        fn endpoint(&self) -> &str {
            "http://scripted.local"
        }
    }

    fn preferences() -> PreferenceSet {
        PreferenceSet::basic(Mood::Romantic, Budget::new(100), Location::Outdoor, FoodPreference::Yes)
    }

    fn generator(backend: Arc<ScriptedBackend>) -> IdeaGenerator {
        IdeaGenerator::new(Some(backend), RetryPolicy::default())
    }

    fn transient() -> LlmError {
        LlmError::ApiError {
            status: 503,
            message: "unavailable".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let backend = ScriptedBackend::new(vec![Ok(IDEA_TEXT.to_string())]);
        let idea = generator(backend.clone()).generate(&preferences()).await.unwrap();

        assert_eq!(idea.title, "Picnic");
        assert_eq!(idea.special_note, "It's outdoors");
        assert!(!idea.raw.is_empty());
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let backend = ScriptedBackend::new(vec![
            Err(LlmError::Timeout),
            Err(LlmError::EmptyResponse("no candidates".into())),
            Ok(IDEA_TEXT.to_string()),
        ]);
        let idea = generator(backend.clone()).generate(&preferences()).await.unwrap();

        assert_eq!(idea.duration, "2 hours");
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_three_attempts_with_linear_backoff() {
        let backend = ScriptedBackend::new(vec![Err(transient()), Err(transient()), Err(transient())]);
        let started = tokio::time::Instant::now();
        let result = generator(backend.clone()).generate(&preferences()).await;

        match result {
            Err(GenerationError::Exhausted { attempts, last_error }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("503"));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }

        let calls = backend.calls.lock();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].1 - calls[0].1, Duration::from_millis(1000));
        assert_eq!(calls[2].1 - calls[1].1, Duration::from_millis(2000));
        // 最后一次失败后不再等待
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_success_text_is_retried() {
        let backend = ScriptedBackend::new(vec![Ok("   ".to_string()), Ok(IDEA_TEXT.to_string())]);
        let idea = generator(backend.clone()).generate(&preferences()).await.unwrap();
        assert_eq!(idea.title, "Picnic");
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_backend_makes_no_calls() {
        let generator = IdeaGenerator::new(None, RetryPolicy::default());
        let result = generator.generate(&preferences()).await;
        assert!(matches!(result, Err(GenerationError::Configuration(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_error_is_not_retried() {
        let backend = ScriptedBackend::new(vec![Err(LlmError::ConfigError("bad key".into()))]);
        let result = generator(backend.clone()).generate(&preferences()).await;

        assert!(matches!(result, Err(GenerationError::Configuration(_))));
        assert_eq!(backend.call_count(), 1);
    }

    #[test]
    fn test_from_config_without_key_has_no_backend() {
        let generator = IdeaGenerator::from_config(&AppConfig::default(), None);
        assert!(generator.backend.is_none());
        assert!(generator.logger.is_none());
        assert_eq!(generator.policy, RetryPolicy::default());
    }

    #[test]
    fn test_from_config_attaches_logger() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            api_key: "test-key".into(),
            max_attempts: 5,
            retry_delay_ms: 250,
            ..AppConfig::default()
        };

        let generator = IdeaGenerator::from_config(&config, Some(Arc::new(RequestLogger::new(dir.path()))));
        assert!(generator.backend.is_some());
        assert!(generator.logger.is_some());
        assert_eq!(
            generator.policy,
            RetryPolicy {
                max_attempts: 5,
                backoff_step: Duration::from_millis(250),
            }
        );
    }

    #[test]
    fn test_user_message_hides_raw_error() {
        let error = GenerationError::Exhausted {
            attempts: 3,
            last_error: "API 错误 (503): secret upstream detail".into(),
        };
        assert!(!error.user_message().contains("503"));
        assert_eq!(error.user_message(), USER_RETRY_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_attempt_rolls_activity_and_is_logged() {
        let dir = TempDir::new().unwrap();
        let logger = Arc::new(RequestLogger::new(dir.path()));
        let backend = ScriptedBackend::new(vec![Err(transient()), Ok(IDEA_TEXT.to_string())]);
        let generator = generator(backend.clone()).with_logger(logger.clone());

        generator.generate(&preferences()).await.unwrap();

        for (prompt, _) in backend.calls.lock().iter() {
            assert!(ActivityType::ALL
                .iter()
                .any(|a| prompt.contains(&format!("- Activity Type: {}", a.label()))));
        }

        let entries = logger.recent_entries(10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, "error");
        assert_eq!(entries[0].error_type.as_deref(), Some("api"));
        assert_eq!(entries[1].status, "success");
        assert_eq!(entries[0].request_id, entries[1].request_id);
    }

    #[tokio::test]
    async fn test_single_attempt_does_not_retry() {
        let backend = ScriptedBackend::new(vec![Err(transient()), Ok(IDEA_TEXT.to_string())]);
        let generator = generator(backend.clone());

        assert!(generator.attempt(&preferences(), 1).await.is_err());
        assert_eq!(backend.call_count(), 1);
        assert!(generator.attempt(&preferences(), 2).await.is_ok());
    }
}
