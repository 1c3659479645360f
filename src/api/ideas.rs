//! 创意端点：直接生成、收藏、分享、日历、提醒、清单与回忆

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use super::auth::CurrentUser;
use crate::error::{AppError, AppResult};
use crate::models::{
    AddChecklistItemRequest, CalendarRequest, DateChecklist, DateMemory, GenerateIdeaRequest,
    GenerateResponse, IdeaRecord, ReminderRequest, ReplaceChecklistRequest, SaveIdeaRequest,
    SavedIdeaResponse, ShareResponse, TipsResponse,
};
use crate::services::date_actions::{self, CalendarEvent, ReminderSchedule};
use crate::services::parse_idea;
use crate::services::storage::MemoryUpdate;
use crate::state::SharedState;

/// 由偏好直接生成创意
///
/// 偏好不完整时在发起任何网络请求之前拒绝。
async fn generate_idea(
    State(state): State<SharedState>,
    user: Option<CurrentUser>,
    Json(draft): Json<GenerateIdeaRequest>,
) -> AppResult<Json<GenerateResponse>> {
    let preferences = draft.finish()?;

    let idea = state.generator().generate(&preferences).await?;

    let mut storage_warning = None;
    if let Some(user) = user {
        if let Err(e) = state
            .ideas
            .log_generation(user.id(), &idea.raw, Some(preferences))
            .await
        {
            warn!("Failed to record generated idea: {}", e);
            storage_warning = Some("Your idea was generated but could not be recorded.".to_string());
        }
    }

    Ok(Json(GenerateResponse {
        success: true,
        idea,
        preferences,
        storage_warning,
    }))
}

async fn list_saved_ideas(
    State(state): State<SharedState>,
    user: CurrentUser,
) -> Json<Vec<SavedIdeaResponse>> {
    let records = state.ideas.list_saved(user.id()).await;
    Json(records.into_iter().map(SavedIdeaResponse::from).collect())
}

async fn save_idea(
    State(state): State<SharedState>,
    user: CurrentUser,
    Json(req): Json<SaveIdeaRequest>,
) -> AppResult<(StatusCode, Json<SavedIdeaResponse>)> {
    if req.idea.trim().is_empty() {
        return Err(AppError::BadRequest("Idea text is empty".to_string()));
    }
    let record = state.ideas.save(user.id(), &req.idea, req.preferences).await?;
    Ok((StatusCode::CREATED, Json(SavedIdeaResponse::from(record))))
}

async fn delete_idea(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.ideas.delete(user.id(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 用户自己的记录，不存在或属于他人时返回 404
async fn owned_record(state: &SharedState, user: &CurrentUser, id: Uuid) -> AppResult<IdeaRecord> {
    Ok(state.ideas.get(user.id(), id).await?)
}

async fn share_idea(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ShareResponse>> {
    let record = owned_record(&state, &user, id).await?;
    Ok(Json(ShareResponse {
        message: date_actions::share_message(&parse_idea(&record.idea)),
    }))
}

async fn idea_tips(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TipsResponse>> {
    let record = owned_record(&state, &user, id).await?;
    Ok(Json(TipsResponse {
        tips: date_actions::date_tips(&record.idea),
    }))
}

async fn calendar_event(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<CalendarRequest>,
) -> AppResult<Json<CalendarEvent>> {
    let record = owned_record(&state, &user, id).await?;
    let event = date_actions::calendar_event(&parse_idea(&record.idea), req.start, req.duration_hours)?;
    Ok(Json(event))
}

async fn schedule_reminder(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReminderRequest>,
) -> AppResult<Json<ReminderSchedule>> {
    let record = owned_record(&state, &user, id).await?;
    let idea = parse_idea(&record.idea);
    let schedule = date_actions::reminder_schedule(&idea.title, &idea.description, req.date, Utc::now())?;
    Ok(Json(schedule))
}

async fn get_checklist(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DateChecklist>> {
    owned_record(&state, &user, id).await?;
    Ok(Json(state.checklists.get_or_default(id, user.id()).await))
}

async fn replace_checklist(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<ReplaceChecklistRequest>,
) -> AppResult<Json<DateChecklist>> {
    owned_record(&state, &user, id).await?;
    let checklist = state.checklists.replace_items(id, user.id(), req.items).await?;
    Ok(Json(checklist))
}

async fn add_checklist_item(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AddChecklistItemRequest>,
) -> AppResult<Json<DateChecklist>> {
    owned_record(&state, &user, id).await?;
    let checklist = state.checklists.add_item(id, user.id(), &req.text).await?;
    Ok(Json(checklist))
}

async fn toggle_checklist_item(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path((id, item_id)): Path<(Uuid, String)>,
) -> AppResult<Json<DateChecklist>> {
    owned_record(&state, &user, id).await?;
    let checklist = state.checklists.toggle_item(id, user.id(), &item_id).await?;
    Ok(Json(checklist))
}

async fn get_memory(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Option<DateMemory>>> {
    owned_record(&state, &user, id).await?;
    Ok(Json(state.memories.get(id, user.id()).await))
}

async fn update_memory(
    State(state): State<SharedState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(update): Json<MemoryUpdate>,
) -> AppResult<Json<DateMemory>> {
    owned_record(&state, &user, id).await?;
    let memory = state.memories.upsert(id, user.id(), update).await?;
    Ok(Json(memory))
}

/// 创建创意路由
pub fn idea_routes() -> Router<SharedState> {
    Router::new()
        .route("/api/ideas/generate", post(generate_idea))
        .route("/api/ideas", get(list_saved_ideas).post(save_idea))
        .route("/api/ideas/:id", delete(delete_idea))
        .route("/api/ideas/:id/share", get(share_idea))
        .route("/api/ideas/:id/tips", get(idea_tips))
        .route("/api/ideas/:id/calendar", post(calendar_event))
        .route("/api/ideas/:id/reminders", post(schedule_reminder))
        .route(
            "/api/ideas/:id/checklist",
            get(get_checklist).put(replace_checklist),
        )
        .route("/api/ideas/:id/checklist/items", post(add_checklist_item))
        .route(
            "/api/ideas/:id/checklist/items/:item_id/toggle",
            post(toggle_checklist_item),
        )
        .route("/api/ideas/:id/memories", get(get_memory).put(update_memory))
}
