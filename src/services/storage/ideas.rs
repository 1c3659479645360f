//! 创意记录存储

use chrono::Utc;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use super::{JsonCollection, StorageError};
use crate::models::{IdeaRecord, PreferenceSet};

/// 生成日志的默认保留条数
const DEFAULT_MAX_LOG_ENTRIES: usize = 1000;

/// 创意存储
///
/// `saved = true` 的记录是用户收藏，`saved = false` 的是生成日志。
/// 生成日志超过上限时丢弃最旧的，收藏不受影响。
pub struct IdeaStore {
    records: JsonCollection<IdeaRecord>,
    max_log_entries: usize,
}

impl IdeaStore {
    pub async fn open(data_dir: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            records: JsonCollection::open(data_dir.join("ideas.json")).await?,
            max_log_entries: DEFAULT_MAX_LOG_ENTRIES,
        })
    }

    /// 设置生成日志保留条数
    pub fn with_max_log_entries(mut self, max_log_entries: usize) -> Self {
        self.max_log_entries = max_log_entries;
        self
    }

    async fn insert(
        &self,
        user_id: &str,
        idea: &str,
        preferences: Option<PreferenceSet>,
        saved: bool,
    ) -> Result<IdeaRecord, StorageError> {
        if idea.trim().is_empty() {
            return Err(StorageError::Invalid("Idea text is empty".to_string()));
        }

        let record = IdeaRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            idea: idea.to_string(),
            preferences,
            saved,
            created_at: Utc::now(),
        };

        let stored = record.clone();
        let max_log_entries = self.max_log_entries;
        self.records
            .write(move |records| {
                records.push(record);
                if !saved {
                    prune_generation_log(records, max_log_entries);
                }
                Ok(())
            })
            .await?;

        Ok(stored)
    }

    /// 记录一次生成结果（未收藏）
    pub async fn log_generation(
        &self,
        user_id: &str,
        idea: &str,
        preferences: Option<PreferenceSet>,
    ) -> Result<IdeaRecord, StorageError> {
        self.insert(user_id, idea, preferences, false).await
    }

    /// 收藏一个创意
    pub async fn save(
        &self,
        user_id: &str,
        idea: &str,
        preferences: Option<PreferenceSet>,
    ) -> Result<IdeaRecord, StorageError> {
        let record = self.insert(user_id, idea, preferences, true).await?;
        info!("Idea saved: id={}, user={}", record.id, user_id);
        Ok(record)
    }

    /// 用户的收藏，新的在前
    pub async fn list_saved(&self, user_id: &str) -> Vec<IdeaRecord> {
        self.records
            .read(|records| {
                let mut saved: Vec<IdeaRecord> = records
                    .iter()
                    .filter(|r| r.saved && r.user_id == user_id)
                    .cloned()
                    .collect();
                saved.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                saved
            })
            .await
    }

    /// 获取用户自己的记录
    pub async fn get(&self, user_id: &str, id: Uuid) -> Result<IdeaRecord, StorageError> {
        self.records
            .read(|records| {
                records
                    .iter()
                    .find(|r| r.id == id && r.user_id == user_id)
                    .cloned()
            })
            .await
            .ok_or_else(|| StorageError::NotFound(format!("Idea {} not found", id)))
    }

    /// 删除用户自己的记录
    pub async fn delete(&self, user_id: &str, id: Uuid) -> Result<(), StorageError> {
        self.records
            .write(|records| {
                let before = records.len();
                records.retain(|r| !(r.id == id && r.user_id == user_id));
                if records.len() == before {
                    Err(StorageError::NotFound(format!("Idea {} not found", id)))
                } else {
                    Ok(())
                }
            })
            .await?;

        info!("Idea deleted: id={}, user={}", id, user_id);
        Ok(())
    }
}

/// 记录按插入顺序排列，超出部分从最旧的日志开始删除
fn prune_generation_log(records: &mut Vec<IdeaRecord>, max_log_entries: usize) {
    let logged = records.iter().filter(|r| !r.saved).count();
    let mut excess = logged.saturating_sub(max_log_entries);
    if excess == 0 {
        return;
    }

    records.retain(|r| {
        if excess > 0 && !r.saved {
            excess -= 1;
            false
        } else {
            true
        }
    });
    debug!("Generation log pruned to {} entries", max_log_entries);
}
