//! 持久化存储
//!
//! 每类记录保存为数据目录下的一个 JSON 文件，启动时整体加载，修改后整体写回。

mod checklists;
mod ideas;
mod memories;

pub use checklists::{ChecklistStore, DEFAULT_CHECKLIST_ITEMS};
pub use ideas::IdeaStore;
pub use memories::{MemoryStore, MemoryUpdate};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// 存储错误
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO错误 ({0}): {1}")]
    IoError(PathBuf, #[source] std::io::Error),

    #[error("解析错误: {0}")]
    ParseError(String),

    #[error("序列化错误: {0}")]
    SerializeError(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Invalid(String),
}

/// 以 JSON 文件为后端的记录集合
pub struct JsonCollection<T> {
    path: PathBuf,
    items: RwLock<Vec<T>>,
}

impl<T> JsonCollection<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// 打开集合，文件不存在时为空集合
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::IoError(parent.to_path_buf(), e))?;
        }

        let items = if path.exists() {
            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| StorageError::IoError(path.clone(), e))?;
            let items: Vec<T> = serde_json::from_str(&content)
                .map_err(|e| StorageError::ParseError(format!("{}: {}", path.display(), e)))?;
            info!("Loaded {} records from {}", items.len(), path.display());
            items
        } else {
            debug!("Collection file does not exist yet: {}", path.display());
            Vec::new()
        };

        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 只读访问
    pub async fn read<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        let items = self.items.read().await;
        f(&items)
    }

    /// 修改并写回文件
    ///
    /// 修改作用在副本上，写文件成功后才替换内存中的数据。
    pub async fn write<R>(
        &self,
        f: impl FnOnce(&mut Vec<T>) -> Result<R, StorageError>,
    ) -> Result<R, StorageError> {
        let mut items = self.items.write().await;
        let mut next = items.clone();
        let result = f(&mut next)?;
        self.persist(&next).await?;
        *items = next;
        Ok(result)
    }

    async fn persist(&self, items: &[T]) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(items)
            .map_err(|e| StorageError::SerializeError(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| StorageError::IoError(tmp_path.clone(), e))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| StorageError::IoError(self.path.clone(), e))?;

        debug!("Collection saved: {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_persists_and_reloads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("numbers.json");

        let collection: JsonCollection<u32> = JsonCollection::open(&path).await.unwrap();
        collection
            .write(|items| {
                items.extend([1, 2, 3]);
                Ok(())
            })
            .await
            .unwrap();

        let reopened: JsonCollection<u32> = JsonCollection::open(&path).await.unwrap();
        assert_eq!(reopened.read(|items| items.to_vec()).await, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_data_untouched() {
        let dir = TempDir::new().unwrap();
        let collection: JsonCollection<u32> =
            JsonCollection::open(dir.path().join("numbers.json")).await.unwrap();

        let result = collection
            .write(|items| {
                items.push(7);
                Err::<(), _>(StorageError::Invalid("nope".into()))
            })
            .await;

        assert!(result.is_err());
        assert!(collection.read(|items| items.is_empty()).await);
        assert!(!collection.path().exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();

        let result: Result<JsonCollection<u32>, _> = JsonCollection::open(&path).await;
        assert!(matches!(result, Err(StorageError::ParseError(_))));
    }
}
