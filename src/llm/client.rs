//! Gemini generateContent 客户端

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

use super::format::build_generate_endpoint;
use super::types::{GenerateContentRequest, GenerateContentResponse, GenerationOptions, LlmError};

/// 文本生成后端
///
/// 一次调用对应一次 HTTP 请求，重试由调用方负责。
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// 发送 prompt，返回第一个候选的文本
    async fn generate_content(&self, prompt: &str) -> Result<String, LlmError>;

    /// 模型名称，用于日志
    fn model(&self) -> &str;

    /// 请求端点，用于日志
    fn endpoint(&self) -> &str;
}

/// Gemini 客户端
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    options: GenerationOptions,
}

impl GeminiClient {
    /// 创建新的客户端
    ///
    /// API 密钥为空时直接返回配置错误，不会构造 HTTP 客户端。
    pub fn new(
        api_key: impl Into<String>,
        base_url: &str,
        model: impl Into<String>,
        options: GenerationOptions,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::ConfigError("API Key is required".to_string()));
        }

        let model = model.into();

        // 构建 HTTP 客户端
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(LlmError::HttpError)?;

        Ok(Self {
            client,
            api_key,
            endpoint: build_generate_endpoint(base_url, &model),
            model,
            options,
        })
    }
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    async fn generate_content(&self, prompt: &str) -> Result<String, LlmError> {
        let payload = GenerateContentRequest::from_prompt(prompt, &self.options);

        debug!("Gemini API request: endpoint={}, model={}", self.endpoint, self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(map_transport_error)?;

        // 检查状态码
        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = response.text().await.unwrap_or_default();
            let preview: String = error_text.chars().take(500).collect();
            error!("Gemini API error: status={}, body={}", status_code, preview);
            return Err(LlmError::ApiError {
                status: status_code,
                message: error_text,
            });
        }

        let body = response.text().await.map_err(map_transport_error)?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;

        parsed
            .into_first_text()
            .ok_or_else(|| LlmError::EmptyResponse("no candidate text in response".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn map_transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::HttpError(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_config_error() {
        let result = GeminiClient::new(
            "  ",
            "https://generativelanguage.googleapis.com/v1beta",
            "gemini-1.5-flash",
            GenerationOptions::default(),
            Duration::from_secs(5),
        );
        assert!(matches!(result, Err(LlmError::ConfigError(_))));
    }

    #[test]
    fn test_client_builds_endpoint() {
        let client = GeminiClient::new(
            "test-key",
            "https://generativelanguage.googleapis.com/v1beta/",
            "gemini-1.5-flash",
            GenerationOptions::default(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(client.model(), "gemini-1.5-flash");
    }
}
