//! 问卷端点
//!
//! 会话保存在服务端注册表中，客户端只持有会话 ID。

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::{
    AnswerRequest, GenerateResponse, GeneratedIdea, PreferenceSet, QuizResponse,
    SavedIdeaResponse, StartQuizRequest,
};
use crate::services::idea_generator::GenerationError;
use crate::services::quiz::QuizSession;
use crate::state::SharedState;

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Quiz session {} not found", id))
}

/// 当前会话快照
fn snapshot(state: &SharedState, id: Uuid) -> AppResult<QuizResponse> {
    let session = state.quizzes.get(&id).ok_or_else(|| session_not_found(id))?;
    Ok(QuizResponse::from_session(id, &session))
}

/// 对会话执行修改，生成进行中时拒绝
fn with_session(
    state: &SharedState,
    id: Uuid,
    f: impl FnOnce(&mut QuizSession) -> AppResult<()>,
) -> AppResult<QuizResponse> {
    let mut session = state.quizzes.get_mut(&id).ok_or_else(|| session_not_found(id))?;
    if session.generating {
        return Err(AppError::BadRequest("Generation already in progress".to_string()));
    }
    f(&mut session)?;
    Ok(QuizResponse::from_session(id, &session))
}

/// 开始问卷
async fn start_quiz(
    State(state): State<SharedState>,
    body: Option<Json<StartQuizRequest>>,
) -> (StatusCode, Json<QuizResponse>) {
    let variant = body.map(|Json(req)| req.variant).unwrap_or_default();
    let id = Uuid::new_v4();
    let session = QuizSession::new(variant);
    let response = QuizResponse::from_session(id, &session);
    state.quizzes.insert(id, session);

    info!("Quiz started: id={}, variant={:?}", id, variant);
    (StatusCode::CREATED, Json(response))
}

async fn get_quiz(State(state): State<SharedState>, Path(id): Path<Uuid>) -> AppResult<Json<QuizResponse>> {
    snapshot(&state, id).map(Json)
}

/// 放弃问卷
async fn abandon_quiz(State(state): State<SharedState>, Path(id): Path<Uuid>) -> AppResult<StatusCode> {
    state.quizzes.remove(&id).ok_or_else(|| session_not_found(id))?;
    info!("Quiz abandoned: id={}", id);
    Ok(StatusCode::NO_CONTENT)
}

async fn answer_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerRequest>,
) -> AppResult<Json<QuizResponse>> {
    with_session(&state, id, |session| {
        session.collector.record_answer(req.index, req.answer)?;
        Ok(())
    })
    .map(Json)
}

/// 预算题的“下一步”
async fn next_question(State(state): State<SharedState>, Path(id): Path<Uuid>) -> AppResult<Json<QuizResponse>> {
    with_session(&state, id, |session| {
        session.collector.next()?;
        Ok(())
    })
    .map(Json)
}

async fn previous_question(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<QuizResponse>> {
    with_session(&state, id, |session| {
        session.collector.back()?;
        Ok(())
    })
    .map(Json)
}

/// 生成期间对会话的占用
///
/// 请求在等待模型时被丢弃（客户端断开、超时）时，`Drop` 释放占用并回到最后一题。
struct GeneratingSession {
    state: SharedState,
    id: Uuid,
    armed: bool,
}

impl GeneratingSession {
    /// 标记会话为生成中，返回完成的偏好
    fn begin(state: &SharedState, id: Uuid) -> AppResult<(Self, PreferenceSet)> {
        let mut session = state.quizzes.get_mut(&id).ok_or_else(|| session_not_found(id))?;
        if session.generating {
            return Err(AppError::BadRequest("Generation already in progress".to_string()));
        }
        let preferences = session.collector.preferences()?;
        session.generating = true;

        let guard = Self {
            state: Arc::clone(state),
            id,
            armed: true,
        };
        Ok((guard, preferences))
    }

    /// 写回生成结果：成功时保存创意，失败时回到最后一题
    fn finish(mut self, result: &Result<GeneratedIdea, GenerationError>) {
        self.armed = false;
        match self.state.quizzes.get_mut(&self.id) {
            Some(mut session) => {
                session.generating = false;
                match result {
                    Ok(idea) => session.last_idea = Some(idea.clone()),
                    Err(_) => session.collector.reopen(),
                }
            }
            None => warn!("Quiz {} was abandoned during generation", self.id),
        }
    }
}

impl Drop for GeneratingSession {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(mut session) = self.state.quizzes.get_mut(&self.id) {
            session.generating = false;
            session.collector.reopen();
            warn!("Generation for quiz {} was interrupted", self.id);
        }
    }
}

/// 根据已完成的问卷生成创意
///
/// 失败时问卷回到最后一题，已有答案保留。
async fn generate_from_quiz(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    user: Option<CurrentUser>,
) -> AppResult<Json<GenerateResponse>> {
    let (guard, preferences) = GeneratingSession::begin(&state, id)?;

    let result = state.generator().generate(&preferences).await;
    guard.finish(&result);
    let idea = result?;

    let storage_warning = match user {
        Some(user) => match state
            .ideas
            .log_generation(user.id(), &idea.raw, Some(preferences))
            .await
        {
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to record generated idea: {}", e);
                Some("Your idea was generated but could not be recorded.".to_string())
            }
        },
        None => None,
    };

    Ok(Json(GenerateResponse {
        success: true,
        idea,
        preferences,
        storage_warning,
    }))
}

/// 收藏会话中最近生成的创意
///
/// 保存失败时创意仍留在会话里，可以再次调用。
async fn save_quiz_idea(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    user: CurrentUser,
) -> AppResult<(StatusCode, Json<SavedIdeaResponse>)> {
    let (idea, preferences) = {
        let session = state.quizzes.get(&id).ok_or_else(|| session_not_found(id))?;
        let idea = session
            .last_idea
            .clone()
            .ok_or_else(|| AppError::BadRequest("No generated idea to save".to_string()))?;
        (idea, session.collector.preferences().ok())
    };

    let record = state.ideas.save(user.id(), &idea.raw, preferences).await?;
    Ok((StatusCode::CREATED, Json(SavedIdeaResponse::from(record))))
}

/// 创建问卷路由
pub fn quiz_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/quiz", post(start_quiz))
        .route("/api/quiz/:id", get(get_quiz).delete(abandon_quiz))
        .route("/api/quiz/:id/answer", post(answer_question))
        .route("/api/quiz/:id/next", post(next_question))
        .route("/api/quiz/:id/back", post(previous_question))
        .route("/api/quiz/:id/generate", post(generate_from_quiz))
        .route("/api/quiz/:id/save", post(save_quiz_idea))
}
