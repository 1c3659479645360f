//! LLM 模块
//!
//! 提供 Gemini generateContent 客户端以及可替换的生成后端抽象。

mod client;
mod format;
mod types;

pub use client::{GeminiClient, GenerationBackend};
pub use format::mask_api_key;
pub use types::{GenerationOptions, LlmError};
