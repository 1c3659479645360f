//! 配置管理端点

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::llm::{mask_api_key, GeminiClient, GenerationBackend, GenerationOptions};
use crate::state::SharedState;
use crate::utils::LogEntry;

/// 配置响应（隐藏 api_key 的实际值）
#[derive(Serialize)]
pub struct ConfigResponse {
    /// 是否已设置 API 密钥
    pub api_key_set: bool,
    pub base_url: String,
    pub model: String,
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl From<AppConfig> for ConfigResponse {
    fn from(config: AppConfig) -> Self {
        Self {
            api_key_set: !config.api_key.trim().is_empty(),
            base_url: config.base_url,
            model: config.model,
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
            max_attempts: config.max_attempts,
            retry_delay_ms: config.retry_delay_ms,
            request_timeout_secs: config.request_timeout_secs,
        }
    }
}

/// 配置更新请求
#[derive(Deserialize)]
pub struct ConfigUpdateRequest {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f64>,
    pub top_k: Option<u32>,
    pub top_p: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub max_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

/// 配置更新响应
#[derive(Serialize)]
pub struct ConfigUpdateResponse {
    pub success: bool,
    pub message: String,
}

/// 连接测试请求
#[derive(Deserialize)]
pub struct TestConnectionRequest {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// 连接测试响应
#[derive(Serialize)]
pub struct TestConnectionResponse {
    pub success: bool,
    pub message: String,
    pub model: String,
}

#[derive(Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_log_limit")]
    pub limit: usize,
}

fn default_log_limit() -> usize {
    50
}

/// 获取当前配置
async fn get_config_handler(State(state): State<SharedState>) -> Json<ConfigResponse> {
    Json(ConfigResponse::from(state.config.get()))
}

/// 更新配置
async fn update_config_handler(
    State(state): State<SharedState>,
    Json(req): Json<ConfigUpdateRequest>,
) -> AppResult<Json<ConfigUpdateResponse>> {
    if let Some(attempts) = req.max_attempts {
        if attempts == 0 {
            return Err(AppError::BadRequest("max_attempts must be at least 1".to_string()));
        }
    }

    state.config.update(|config| {
        if let Some(api_key) = req.api_key {
            config.api_key = api_key;
        }
        if let Some(base_url) = req.base_url {
            config.base_url = base_url;
        }
        if let Some(model) = req.model {
            config.model = model;
        }
        if let Some(temperature) = req.temperature {
            config.temperature = temperature;
        }
        if let Some(top_k) = req.top_k {
            config.top_k = top_k;
        }
        if let Some(top_p) = req.top_p {
            config.top_p = top_p;
        }
        if let Some(max_output_tokens) = req.max_output_tokens {
            config.max_output_tokens = max_output_tokens;
        }
        if let Some(max_attempts) = req.max_attempts {
            config.max_attempts = max_attempts;
        }
        if let Some(retry_delay_ms) = req.retry_delay_ms {
            config.retry_delay_ms = retry_delay_ms;
        }
        if let Some(request_timeout_secs) = req.request_timeout_secs {
            config.request_timeout_secs = request_timeout_secs;
        }
    })?;

    Ok(Json(ConfigUpdateResponse {
        success: true,
        message: "Config updated successfully".to_string(),
    }))
}

/// 从文件重新加载配置
async fn reload_config_handler(State(state): State<SharedState>) -> Json<ConfigResponse> {
    state.config.reload();
    Json(ConfigResponse::from(state.config.get()))
}

/// 测试 Gemini 连接
async fn test_connection_handler(
    State(state): State<SharedState>,
    Json(req): Json<TestConnectionRequest>,
) -> AppResult<Json<TestConnectionResponse>> {
    let config = state.config.get();

    // 确定使用的参数
    let api_key = req.api_key.unwrap_or(config.api_key.clone());
    let base_url = req.base_url.unwrap_or(config.base_url.clone());
    let model = req.model.unwrap_or(config.model.clone());

    // 检查 API 密钥
    if api_key.trim().is_empty() {
        return Err(AppError::BadRequest("API Key is required".to_string()));
    }

    info!(
        "Testing Gemini connection: model={}, key={}",
        model,
        mask_api_key(&api_key)
    );

    let options = GenerationOptions {
        max_output_tokens: 10,
        ..config.generation_options()
    };
    let client = GeminiClient::new(api_key, &base_url, model.clone(), options, config.request_timeout())
        .map_err(|e| AppError::BadRequest(format!("创建客户端失败: {}", e)))?;

    client
        .generate_content("Hi")
        .await
        .map_err(|e| AppError::BadRequest(format!("Connection failed: {}", e)))?;

    Ok(Json(TestConnectionResponse {
        success: true,
        message: "Connection successful".to_string(),
        model,
    }))
}

/// 最近的生成请求日志
async fn generation_logs_handler(
    State(state): State<SharedState>,
    Query(query): Query<LogsQuery>,
) -> Json<Vec<LogEntry>> {
    Json(state.request_logger.recent_entries(query.limit.min(1000)))
}

/// 创建配置路由
pub fn config_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/config", get(get_config_handler).put(update_config_handler))
        .route("/api/config/reload", post(reload_config_handler))
        .route("/api/config/test", post(test_connection_handler))
        .route("/api/config/logs", get(generation_logs_handler))
}
