//! 应用配置管理
//!
//! 提供配置的加载、保存、更新功能。配置由 `main` 构造成 [`ConfigStore`] 后注入应用状态。

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::error::AppError;
use crate::llm::GenerationOptions;

/// 环境变量中的 API 密钥
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    // 配置文件位于可执行文件同级目录
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("config.json")
}

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gemini API 密钥
    #[serde(default)]
    pub api_key: String,

    /// API 基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 模型名称
    #[serde(default = "default_model")]
    pub model: String,

    /// 温度参数 (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// top_k 采样
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// top_p 采样
    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// 最大输出 token 数
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// 生成的总尝试次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// 线性退避的步长（毫秒），第 n 次失败后等待 n 倍步长
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// 单次请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// 数据目录（创意、清单、回忆、请求日志）
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_temperature() -> f64 {
    0.9
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f64 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("storage")
}

fn default_port() -> u16 {
    8765
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            data_dir: default_data_dir(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    /// 采样参数
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            max_output_tokens: self.max_output_tokens,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// 配置文件中未设置密钥时使用环境变量
    fn apply_env_overrides(&mut self) {
        if self.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                if !key.trim().is_empty() {
                    self.api_key = key.trim().to_string();
                }
            }
        }
    }
}

/// 配置存储
///
/// 持有配置文件路径和当前配置，修改后自动写回文件。
pub struct ConfigStore {
    path: PathBuf,
    config: RwLock<AppConfig>,
}

impl ConfigStore {
    /// 从文件加载配置，文件不存在或无法解析时使用默认值
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut config = load_config_from_file(&path).unwrap_or_default();
        config.apply_env_overrides();

        Self {
            path,
            config: RwLock::new(config),
        }
    }

    /// 使用给定配置创建，不读取文件
    pub fn with_config(path: impl Into<PathBuf>, config: AppConfig) -> Self {
        Self {
            path: path.into(),
            config: RwLock::new(config),
        }
    }

    /// 获取当前配置（克隆）
    pub fn get(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// 更新配置
    ///
    /// 接收一个闭包来修改配置，修改后自动保存到文件
    pub fn update<F>(&self, updater: F) -> Result<AppConfig, AppError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write();
        let mut next = config.clone();
        updater(&mut next);
        save_config_to_file(&self.path, &next)?;
        *config = next;
        Ok(config.clone())
    }

    /// 重新从文件加载配置
    pub fn reload(&self) {
        if let Some(mut config) = load_config_from_file(&self.path) {
            config.apply_env_overrides();
            *self.config.write() = config;
            info!("Config reloaded from {}", self.path.display());
        }
    }
}

/// 从文件加载配置
fn load_config_from_file(path: &Path) -> Option<AppConfig> {
    if !path.exists() {
        return None;
    }

    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Ignoring invalid config file {}: {}", path.display(), e);
            None
        }
    }
}

/// 保存配置到文件
fn save_config_to_file(path: &Path, config: &AppConfig) -> Result<(), AppError> {
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Config(format!("序列化配置失败: {}", e)))?;
    fs::write(path, content).map_err(|e| AppError::Config(format!("写入配置文件失败: {}", e)))?;
    Ok(())
}
