//! 约会准备清单存储

use std::path::Path;
use uuid::Uuid;

use super::{JsonCollection, StorageError};
use crate::models::{ChecklistItem, DateChecklist};

/// 新清单的默认条目
pub const DEFAULT_CHECKLIST_ITEMS: [&str; 3] = ["Confirm reservation", "Check weather", "Plan outfit"];

pub struct ChecklistStore {
    checklists: JsonCollection<DateChecklist>,
}

impl ChecklistStore {
    pub async fn open(data_dir: &Path) -> Result<Self, StorageError> {
        Ok(Self {
            checklists: JsonCollection::open(data_dir.join("checklists.json")).await?,
        })
    }

    fn default_checklist(idea_id: Uuid, user_id: &str) -> DateChecklist {
        DateChecklist {
            date_idea_id: idea_id,
            user_id: user_id.to_string(),
            items: DEFAULT_CHECKLIST_ITEMS
                .iter()
                .enumerate()
                .map(|(i, text)| ChecklistItem::new((i + 1).to_string(), *text))
                .collect(),
        }
    }

    /// 获取清单，不存在时返回默认清单（不写入）
    pub async fn get_or_default(&self, idea_id: Uuid, user_id: &str) -> DateChecklist {
        self.checklists
            .read(|all| {
                all.iter()
                    .find(|c| c.date_idea_id == idea_id && c.user_id == user_id)
                    .cloned()
            })
            .await
            .unwrap_or_else(|| Self::default_checklist(idea_id, user_id))
    }

    /// 对清单做修改并按 (创意, 用户) upsert
    async fn modify<F>(&self, idea_id: Uuid, user_id: &str, f: F) -> Result<DateChecklist, StorageError>
    where
        F: FnOnce(&mut DateChecklist) -> Result<(), StorageError>,
    {
        self.checklists
            .write(|all| {
                let position = all
                    .iter()
                    .position(|c| c.date_idea_id == idea_id && c.user_id == user_id);
                let checklist = match position {
                    Some(index) => &mut all[index],
                    None => {
                        all.push(Self::default_checklist(idea_id, user_id));
                        let last = all.len() - 1;
                        &mut all[last]
                    }
                };
                f(checklist)?;
                Ok(checklist.clone())
            })
            .await
    }

    /// 整体替换条目
    pub async fn replace_items(
        &self,
        idea_id: Uuid,
        user_id: &str,
        items: Vec<ChecklistItem>,
    ) -> Result<DateChecklist, StorageError> {
        if items.iter().any(|item| item.text.trim().is_empty()) {
            return Err(StorageError::Invalid("Checklist items must have text".to_string()));
        }
        self.modify(idea_id, user_id, |checklist| {
            checklist.items = items;
            Ok(())
        })
        .await
    }

    /// 添加条目
    pub async fn add_item(&self, idea_id: Uuid, user_id: &str, text: &str) -> Result<DateChecklist, StorageError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(StorageError::Invalid("Checklist item text is empty".to_string()));
        }

        let item = ChecklistItem::new(Uuid::new_v4().simple().to_string(), text);
        self.modify(idea_id, user_id, |checklist| {
            checklist.items.push(item);
            Ok(())
        })
        .await
    }

    /// 切换条目完成状态
    pub async fn toggle_item(&self, idea_id: Uuid, user_id: &str, item_id: &str) -> Result<DateChecklist, StorageError> {
        self.modify(idea_id, user_id, |checklist| {
            let item = checklist
                .items
                .iter_mut()
                .find(|item| item.id == item_id)
                .ok_or_else(|| StorageError::NotFound(format!("Checklist item {} not found", item_id)))?;
            item.is_completed = !item.is_completed;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_default_items_until_modified() {
        let dir = TempDir::new().unwrap();
        let store = ChecklistStore::open(dir.path()).await.unwrap();
        let idea = Uuid::new_v4();

        let checklist = store.get_or_default(idea, "alice").await;
        let texts: Vec<&str> = checklist.items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, DEFAULT_CHECKLIST_ITEMS.to_vec());
        assert!(checklist.items.iter().all(|i| !i.is_completed));
    }

    #[tokio::test]
    async fn test_add_and_toggle() {
        let dir = TempDir::new().unwrap();
        let store = ChecklistStore::open(dir.path()).await.unwrap();
        let idea = Uuid::new_v4();

        let checklist = store.add_item(idea, "alice", "  Buy flowers ").await.unwrap();
        assert_eq!(checklist.items.len(), 4);
        assert_eq!(checklist.items[3].text, "Buy flowers");

        let checklist = store.toggle_item(idea, "alice", "2").await.unwrap();
        assert!(checklist.items[1].is_completed);
        let checklist = store.toggle_item(idea, "alice", "2").await.unwrap();
        assert!(!checklist.items[1].is_completed);

        // 其他用户看到的是自己的默认清单
        assert_eq!(store.get_or_default(idea, "bob").await.items.len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_input() {
        let dir = TempDir::new().unwrap();
        let store = ChecklistStore::open(dir.path()).await.unwrap();
        let idea = Uuid::new_v4();

        assert!(matches!(store.add_item(idea, "alice", "   ").await, Err(StorageError::Invalid(_))));
        assert!(matches!(
            store.toggle_item(idea, "alice", "missing").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_items() {
        let dir = TempDir::new().unwrap();
        let store = ChecklistStore::open(dir.path()).await.unwrap();
        let idea = Uuid::new_v4();

        let items = vec![ChecklistItem::new("a", "Book table")];
        let checklist = store.replace_items(idea, "alice", items.clone()).await.unwrap();
        assert_eq!(checklist.items, items);
        assert_eq!(store.get_or_default(idea, "alice").await.items, items);
    }
}
