//! LLM 类型定义

use serde::{Deserialize, Serialize};

/// 采样配置
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// 温度参数
    pub temperature: f64,
    /// top_k 参数
    pub top_k: u32,
    /// top_p 参数
    pub top_p: f64,
    /// 最大输出 token 数
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

/// generateContent 请求载荷
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

impl GenerateContentRequest {
    pub fn from_prompt(prompt: &str, options: &GenerationOptions) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_k: options.top_k,
                top_p: options.top_p,
                max_output_tokens: options.max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// generateContent 响应
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// 取出 `candidates[0].content.parts[0].text`，空白文本视为缺失
    pub fn into_first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .next()?
            .text
            .filter(|text| !text.trim().is_empty())
    }
}

/// LLM 错误类型
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP 请求错误
    #[error("HTTP 请求失败: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API 返回错误
    #[error("API 错误 ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// 超时错误
    #[error("请求超时")]
    Timeout,

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// JSON 解析错误
    #[error("JSON 解析失败: {0}")]
    JsonError(#[from] serde_json::Error),

    /// 响应中没有可用的候选文本
    #[error("响应格式错误: {0}")]
    EmptyResponse(String),
}

impl LlmError {
    /// 是否值得重试；缺少密钥等配置问题重试也无济于事
    pub fn is_retriable(&self) -> bool {
        !matches!(self, LlmError::ConfigError(_))
    }

    /// 简短的错误类别，写入请求日志
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::HttpError(_) => "http",
            LlmError::ApiError { .. } => "api",
            LlmError::Timeout => "timeout",
            LlmError::ConfigError(_) => "config",
            LlmError::JsonError(_) => "json",
            LlmError::EmptyResponse(_) => "empty_response",
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::ApiError { status, .. } => Some(*status),
            LlmError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
