//! REST API 请求/响应模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::idea::{ChecklistItem, GeneratedIdea, IdeaRecord};
use super::preferences::{PreferenceDraft, PreferenceSet};
use crate::services::parse_idea;
use crate::services::quiz::{Answer, QuestionView, QuizSession, QuizVariant};

/// 开始问卷请求
#[derive(Debug, Default, Deserialize)]
pub struct StartQuizRequest {
    #[serde(default)]
    pub variant: QuizVariant,
}

/// 作答请求
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub index: usize,
    pub answer: Answer,
}

/// 问卷状态响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResponse {
    pub session_id: Uuid,
    pub variant: QuizVariant,
    pub complete: bool,
    pub generating: bool,
    /// 未完成时的当前题目
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    pub answers: PreferenceDraft,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idea: Option<GeneratedIdea>,
}

impl QuizResponse {
    pub fn from_session(session_id: Uuid, session: &QuizSession) -> Self {
        let collector = &session.collector;
        Self {
            session_id,
            variant: collector.variant(),
            complete: collector.is_complete(),
            generating: session.generating,
            question: (!collector.is_complete()).then(|| collector.question_view()),
            answers: *collector.answers(),
            idea: session.last_idea.clone(),
        }
    }
}

/// 直接生成请求：偏好必须完整
pub type GenerateIdeaRequest = PreferenceDraft;

/// 生成结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub idea: GeneratedIdea,
    pub preferences: PreferenceSet,
    /// 生成日志写入失败时的提示，生成结果不受影响
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_warning: Option<String>,
}

/// 收藏请求
#[derive(Debug, Deserialize)]
pub struct SaveIdeaRequest {
    /// 模型原始输出
    pub idea: String,
    #[serde(default)]
    pub preferences: Option<PreferenceSet>,
}

/// 收藏的创意
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedIdeaResponse {
    pub id: Uuid,
    pub idea: GeneratedIdea,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences: Option<PreferenceSet>,
    pub saved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<IdeaRecord> for SavedIdeaResponse {
    fn from(record: IdeaRecord) -> Self {
        Self {
            id: record.id,
            idea: parse_idea(&record.idea),
            preferences: record.preferences,
            saved: record.saved,
            created_at: record.created_at,
        }
    }
}

/// 分享文案响应
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub message: String,
}

/// 小贴士响应
#[derive(Debug, Serialize)]
pub struct TipsResponse {
    pub tips: Vec<&'static str>,
}

/// 日历事件请求
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRequest {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub duration_hours: Option<f64>,
}

/// 提醒请求
#[derive(Debug, Deserialize)]
pub struct ReminderRequest {
    pub date: DateTime<Utc>,
}

/// 添加清单条目
#[derive(Debug, Deserialize)]
pub struct AddChecklistItemRequest {
    pub text: String,
}

/// 替换清单
#[derive(Debug, Deserialize)]
pub struct ReplaceChecklistRequest {
    pub items: Vec<ChecklistItem>,
}
