//! 当前用户提取
//!
//! 登录由外部认证服务完成，网关把用户 ID 放在 `x-user-id` 请求头中转发过来。

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// 用户 ID 请求头
pub const USER_ID_HEADER: &str = "x-user-id";

/// 已登录用户
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| CurrentUser(id.to_string()))
            .ok_or(AppError::NotSignedIn)
    }
}
