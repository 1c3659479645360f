//! 应用状态管理
//!
//! 定义在请求处理器之间共享的状态，由 `main` 构造后注入路由。

use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::ConfigStore;
use crate::services::quiz::QuizSession;
use crate::services::storage::{ChecklistStore, IdeaStore, MemoryStore, StorageError};
use crate::services::IdeaGenerator;
use crate::utils::RequestLogger;

/// 问卷会话注册表
pub type QuizRegistry = DashMap<Uuid, QuizSession>;

/// 应用共享状态
///
/// 使用 Arc 包裹以便在多个处理器之间安全共享
pub struct AppState {
    /// 配置
    pub config: ConfigStore,
    /// 生成请求日志
    pub request_logger: Arc<RequestLogger>,
    /// 创意记录
    pub ideas: IdeaStore,
    /// 准备清单
    pub checklists: ChecklistStore,
    /// 约会回忆
    pub memories: MemoryStore,
    /// 进行中的问卷
    pub quizzes: QuizRegistry,
    /// 固定的生成器；为空时每次按当前配置构建
    generator: Option<Arc<IdeaGenerator>>,
}

impl AppState {
    /// 创建新的应用状态，打开数据目录下的各个存储
    pub async fn new(config: ConfigStore) -> Result<Self, StorageError> {
        let data_dir = config.get().data_dir;
        let request_logger = Arc::new(RequestLogger::new(&data_dir));

        Ok(Self {
            ideas: IdeaStore::open(&data_dir).await?,
            checklists: ChecklistStore::open(&data_dir).await?,
            memories: MemoryStore::open(&data_dir).await?,
            config,
            request_logger,
            quizzes: DashMap::new(),
            generator: None,
        })
    }

    /// 使用固定的生成器
    pub fn with_generator(mut self, generator: IdeaGenerator) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// 获取生成器
    ///
    /// 按当前配置构建，配置修改后立即生效
    pub fn generator(&self) -> Arc<IdeaGenerator> {
        match &self.generator {
            Some(generator) => Arc::clone(generator),
            None => Arc::new(IdeaGenerator::from_config(
                &self.config.get(),
                Some(Arc::clone(&self.request_logger)),
            )),
        }
    }
}

/// 可共享的应用状态
pub type SharedState = Arc<AppState>;
