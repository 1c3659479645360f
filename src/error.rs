//! 统一错误处理模块
//!
//! 定义应用级错误类型，并实现 axum 的 IntoResponse trait 以便自动转换为 HTTP 响应。

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::IncompletePreferences;
use crate::services::date_actions::ActionError;
use crate::services::idea_generator::GenerationError;
use crate::services::quiz::QuizError;
use crate::services::storage::StorageError;

/// 应用错误枚举
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 创意生成失败（面向用户的提示，不含原始错误）
    #[error("生成失败: {0}")]
    Generation(String),

    /// 未登录
    #[error("未登录")]
    NotSignedIn,

    /// 持久化失败（生成结果仍保留在内存中）
    #[error("保存失败: {0}")]
    Persistence(String),

    /// 请求参数错误
    #[error("请求错误: {0}")]
    BadRequest(String),

    /// 资源未找到
    #[error("未找到: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::Generation(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::NotSignedIn => (StatusCode::UNAUTHORIZED, "not signed in".to_string()),
            AppError::Persistence(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = Json(json!({
            "success": false,
            "error": error_message
        }));

        (status, body).into_response()
    }
}

impl From<QuizError> for AppError {
    fn from(e: QuizError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl From<IncompletePreferences> for AppError {
    fn from(e: IncompletePreferences) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

/// 只携带面向用户的提示，原始错误已在生成器里记录
impl From<GenerationError> for AppError {
    fn from(e: GenerationError) -> Self {
        match e {
            GenerationError::Configuration(_) => AppError::Config(e.user_message().to_string()),
            GenerationError::Exhausted { .. } => AppError::Generation(e.user_message().to_string()),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => AppError::NotFound(what),
            StorageError::Invalid(msg) => AppError::BadRequest(msg),
            other => {
                tracing::error!("Storage failure: {}", other);
                AppError::Persistence("Failed to save your changes. Please try again.".to_string())
            }
        }
    }
}

impl From<ActionError> for AppError {
    fn from(e: ActionError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

/// 便捷类型别名
pub type AppResult<T> = Result<T, AppError>;
