//! 约会创意及其附属记录

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::preferences::PreferenceSet;

/// 解析后的约会创意
///
/// 解析是尽力而为的，未匹配到的字段为空字符串，原始文本始终保存在 `raw` 中。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedIdea {
    pub title: String,
    pub description: String,
    /// 模型给出的自由文本，不做数值解析
    pub estimated_cost: String,
    pub duration: String,
    pub special_note: String,
    pub raw: String,
}

/// 持久化的创意记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdeaRecord {
    pub id: Uuid,
    pub user_id: String,
    /// 模型原始输出
    pub idea: String,
    pub preferences: Option<PreferenceSet>,
    /// true 表示用户收藏，false 为生成日志
    pub saved: bool,
    pub created_at: DateTime<Utc>,
}

/// 清单条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub is_completed: bool,
}

impl ChecklistItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_completed: false,
        }
    }
}

/// 某个创意的准备清单，按 (创意, 用户) 唯一
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateChecklist {
    pub date_idea_id: Uuid,
    pub user_id: String,
    pub items: Vec<ChecklistItem>,
}

/// 约会回忆：照片、评分和评价，按 (创意, 用户) 唯一
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateMemory {
    pub date_idea_id: Uuid,
    pub user_id: String,
    #[serde(default)]
    pub photos: Vec<String>,
    /// 0 表示尚未评分
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub review: String,
    pub updated_at: DateTime<Utc>,
}
