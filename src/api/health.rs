//! 健康检查端点

use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::SharedState;

/// 健康检查处理器
async fn health_check(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "generation_configured": !state.config.get().api_key.trim().is_empty(),
        "active_quizzes": state.quizzes.len()
    }))
}

/// 创建健康检查路由
pub fn health_routes() -> Router<SharedState> {
    Router::new().route("/api/health", get(health_check))
}
