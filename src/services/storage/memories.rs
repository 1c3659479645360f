//! 约会回忆存储

use chrono::Utc;
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

use super::{JsonCollection, StorageError};
use crate::models::DateMemory;

/// 评分上限
const MAX_RATING: u8 = 5;

/// 回忆更新，未提供的字段保持不变
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryUpdate {
    #[serde(default)]
    pub photos: Option<Vec<String>>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub review: Option<String>,
    /// 追加一张照片
    #[serde(default)]
    pub add_photo: Option<String>,
}

pub struct MemoryStore {
    memories: JsonCollection<DateMemory>,
}

impl MemoryStore {
    pub async fn open(data_dir: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            memories: JsonCollection::open(data_dir.join("memories.json")).await?,
        })
    }

    pub async fn get(&self, idea_id: Uuid, user_id: &str) -> Option<DateMemory> {
        self.memories
            .read(|all| {
                all.iter()
                    .find(|m| m.date_idea_id == idea_id && m.user_id == user_id)
                    .cloned()
            })
            .await
    }

    /// 按 (创意, 用户) upsert
    pub async fn upsert(&self, idea_id: Uuid, user_id: &str, update: MemoryUpdate) -> Result<DateMemory, StorageError> {
        if let Some(rating) = update.rating {
            if rating > MAX_RATING {
                return Err(StorageError::Invalid(format!(
                    "Rating must be between 0 and {}",
                    MAX_RATING
                )));
            }
        }
        if matches!(update.add_photo.as_deref(), Some(p) if p.trim().is_empty()) {
            return Err(StorageError::Invalid("Photo reference is empty".to_string()));
        }

        self.memories
            .write(|all| {
                let index = match all
                    .iter()
                    .position(|m| m.date_idea_id == idea_id && m.user_id == user_id)
                {
                    Some(index) => index,
                    None => {
                        all.push(DateMemory {
                            date_idea_id: idea_id,
                            user_id: user_id.to_string(),
                            photos: Vec::new(),
                            rating: 0,
                            review: String::new(),
                            updated_at: Utc::now(),
                        });
                        all.len() - 1
                    }
                };

                let memory = &mut all[index];
                if let Some(photos) = update.photos {
                    memory.photos = photos;
                }
                if let Some(photo) = update.add_photo {
                    memory.photos.push(photo.trim().to_string());
                }
                if let Some(rating) = update.rating {
                    memory.rating = rating;
                }
                if let Some(review) = update.review {
                    memory.review = review;
                }
                memory.updated_at = Utc::now();
                Ok(memory.clone())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_upsert_merges_fields() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::open(dir.path()).await.unwrap();
        let idea = Uuid::new_v4();
        assert!(store.get(idea, "alice").await.is_none());

        store
            .upsert(idea, "alice", MemoryUpdate { rating: Some(4), ..Default::default() })
            .await
            .unwrap();
        let memory = store
            .upsert(
                idea,
                "alice",
                MemoryUpdate {
                    review: Some("Lovely evening".into()),
                    add_photo: Some("photos/1.jpg".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(memory.rating, 4);
        assert_eq!(memory.review, "Lovely evening");
        assert_eq!(memory.photos, vec!["photos/1.jpg".to_string()]);
        assert_eq!(store.get(idea, "alice").await.unwrap().rating, 4);
    }

    #[tokio::test]
    async fn test_rating_out_of_range() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::open(dir.path()).await.unwrap();
        let result = store
            .upsert(Uuid::new_v4(), "alice", MemoryUpdate { rating: Some(6), ..Default::default() })
            .await;
        assert!(matches!(result, Err(StorageError::Invalid(_))));
    }
}
