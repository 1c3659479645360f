//! 模型输出解析
//!
//! 逐行扫描 `Label: value` 形式的五个字段。模型输出格式没有保证，
//! 缺失的字段解析为空字符串而不是报错。

use crate::models::GeneratedIdea;

const TITLE: &str = "title";
const DESCRIPTION: &str = "description";
const ESTIMATED_COST: &str = "estimated cost";
const DURATION: &str = "duration";
const SPECIAL_NOTE: &str = "what makes it special";

/// 解析原始文本
pub fn parse_idea(raw: &str) -> GeneratedIdea {
    let mut idea = GeneratedIdea {
        raw: raw.to_string(),
        ..Default::default()
    };

    for line in raw.lines() {
        let Some((label, value)) = split_labeled_line(line) else {
            continue;
        };

        let slot = match label.as_str() {
            TITLE => &mut idea.title,
            DESCRIPTION => &mut idea.description,
            ESTIMATED_COST => &mut idea.estimated_cost,
            DURATION => &mut idea.duration,
            SPECIAL_NOTE => &mut idea.special_note,
            _ => continue,
        };

        // 同名字段只取第一次出现
        if slot.is_empty() {
            *slot = value;
        }
    }

    idea
}

/// 拆分 `Label: value`，返回小写标签与去除修饰后的值
///
/// 兼容 `**Title:** xxx`、`- Duration: xxx`、`## Title: xxx` 这类 markdown 修饰。
fn split_labeled_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '-' | '#' | '_'));
    let (label, rest) = trimmed.split_once(':')?;

    let label = label
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '*' | '_'))
        .to_ascii_lowercase();
    if label.is_empty() {
        return None;
    }

    let value = rest
        .trim_start_matches(|c: char| matches!(c, '*' | '_'))
        .trim()
        .to_string();

    Some((label, value))
}
