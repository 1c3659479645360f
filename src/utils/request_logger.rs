//! LLM 请求日志记录器
//!
//! 记录每一次生成尝试到 JSONL 文件，便于调试和分析。原始错误只写入这里和 tracing 日志，
//! 不会返回给用户。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

/// 请求日志条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// 请求 ID（同一次生成的多次尝试共享）
    pub request_id: String,
    /// 第几次尝试，从 1 开始
    pub attempt: u32,
    /// 时间戳
    pub timestamp: DateTime<Utc>,
    /// 端点 URL
    pub endpoint: String,
    /// 模型名称
    pub model: String,
    /// 本次尝试随机到的活动类型
    pub activity_type: String,
    /// prompt 预览
    pub prompt_preview: String,
    /// 状态
    pub status: String,
    /// 持续时间（毫秒）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// 响应长度
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_length: Option<usize>,
    /// 响应预览
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
    /// 错误类型
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// HTTP 状态码
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// 请求日志记录器
pub struct RequestLogger {
    log_path: PathBuf,
    max_entries: usize,
    file: Mutex<Option<File>>,
}

impl RequestLogger {
    /// 创建新的日志记录器
    pub fn new(log_dir: &Path) -> Self {
        // 确保目录存在
        let _ = fs::create_dir_all(log_dir);

        Self {
            log_path: log_dir.join("llm_requests.jsonl"),
            max_entries: 1000,
            file: Mutex::new(None),
        }
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// 生成请求 ID
    pub fn generate_request_id() -> String {
        Uuid::new_v4().to_string()[..8].to_string()
    }

    /// 截断字符串（按字符）
    fn truncate(s: &str, max_chars: usize) -> String {
        if s.chars().count() <= max_chars {
            s.to_string()
        } else {
            let head: String = s.chars().take(max_chars).collect();
            format!("{}...", head)
        }
    }

    /// 记录请求开始
    pub fn log_request(
        &self,
        request_id: &str,
        attempt: u32,
        endpoint: &str,
        model: &str,
        activity_type: &str,
        prompt: &str,
    ) -> LogEntry {
        LogEntry {
            request_id: request_id.to_string(),
            attempt,
            timestamp: Utc::now(),
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            activity_type: activity_type.to_string(),
            prompt_preview: Self::truncate(prompt, 200),
            status: "pending".to_string(),
            duration_ms: None,
            response_length: None,
            response_preview: None,
            error_type: None,
            error_message: None,
            status_code: None,
        }
    }

    /// 记录成功
    pub fn log_success(&self, mut entry: LogEntry, start_time: Instant, response: &str) {
        entry.status = "success".to_string();
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.response_length = Some(response.len());
        entry.response_preview = Some(Self::truncate(response, 300));
        self.write_entry(&entry);
    }

    /// 记录错误
    pub fn log_error(
        &self,
        mut entry: LogEntry,
        start_time: Instant,
        error_type: &str,
        error_message: &str,
        status_code: Option<u16>,
    ) {
        entry.status = "error".to_string();
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.error_type = Some(error_type.to_string());
        entry.error_message = Some(Self::truncate(error_message, 500));
        entry.status_code = status_code;
        self.write_entry(&entry);
    }

    /// 读取最近的日志条目（新的在后）
    pub fn recent_entries(&self, limit: usize) -> Vec<LogEntry> {
        let Ok(file) = File::open(&self.log_path) else {
            return Vec::new();
        };
        let entries: Vec<LogEntry> = BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str(&line).ok())
            .collect();
        let skip = entries.len().saturating_sub(limit);
        entries.into_iter().skip(skip).collect()
    }

    /// 写入日志条目
    fn write_entry(&self, entry: &LogEntry) {
        let mut file_guard = self.file.lock();

        // 懒加载文件
        if file_guard.is_none() {
            if let Ok(f) = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.log_path)
            {
                *file_guard = Some(f);
            }
        }

        if let Some(file) = file_guard.as_mut() {
            if let Ok(json) = serde_json::to_string(entry) {
                let _ = writeln!(file, "{}", json);
                let _ = file.flush();
            }
        }

        if self.cleanup_if_needed() {
            // 文件被重写，丢弃旧句柄
            *file_guard = None;
        }
    }

    /// 清理旧日志，返回是否重写了文件
    fn cleanup_if_needed(&self) -> bool {
        let Ok(file) = File::open(&self.log_path) else {
            return false;
        };
        let lines: Vec<String> = BufReader::new(file).lines().map_while(Result::ok).collect();

        if lines.len() <= self.max_entries {
            return false;
        }

        let keep_lines = &lines[lines.len() - self.max_entries..];
        if let Ok(mut file) = File::create(&self.log_path) {
            for line in keep_lines {
                let _ = writeln!(file, "{}", line);
            }
        }
        true
    }
}
