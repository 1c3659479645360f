//! 约会相关操作
//!
//! 分享文案、日历事件、提醒计划和约会小贴士。设备端负责真正写日历和发通知，
//! 这里只计算它们需要的内容。

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::models::GeneratedIdea;

/// 时长无法解析时的默认小时数
const DEFAULT_DURATION_HOURS: f64 = 2.0;
/// 提醒提前量（分钟）
const REMINDER_LEAD_MINUTES: i64 = 60;
/// 日历事件时长上限（一周）
const MAX_DURATION_HOURS: f64 = 24.0 * 7.0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("Please select a future date and time")]
    PastDate,

    #[error("Duration must be a positive number of hours, at most one week")]
    InvalidDuration,

    #[error("Date is out of range")]
    OutOfRange,
}

/// 日历事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub title: String,
    pub notes: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// 相对开始时间的提醒偏移（分钟，负数表示提前）
    pub alarm_offset_minutes: i64,
}

/// 一条本地通知
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledNotification {
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Utc>,
    pub channel_id: &'static str,
}

/// 提醒计划：提前一小时 + 开始时各一条
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderSchedule {
    pub reminder: ScheduledNotification,
    pub start: ScheduledNotification,
}

/// 分享文案
pub fn share_message(idea: &GeneratedIdea) -> String {
    format!(
        "Check out this date idea!\n\n{}\n\n{}\n\nEstimated Cost: {}\nDuration: {}",
        idea.title, idea.description, idea.estimated_cost, idea.duration
    )
}

/// 从 "2-3 hours"、"1.5 hrs"、"90 minutes" 这类自由文本里取出小时数
pub fn duration_hours(duration: &str) -> Option<f64> {
    let lower = duration.to_ascii_lowercase();
    let start = lower.find(|c: char| c.is_ascii_digit())?;
    let number: String = lower[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value: f64 = number.trim_end_matches('.').parse().ok()?;
    if value <= 0.0 {
        return None;
    }

    if lower.contains("min") && !lower.contains("hour") && !lower.contains("hr") {
        Some(value / 60.0)
    } else {
        Some(value)
    }
}

/// 构建日历事件
///
/// 未指定时长时使用创意中的时长，解析不出时默认 2 小时。
pub fn calendar_event(
    idea: &GeneratedIdea,
    start: DateTime<Utc>,
    hours: Option<f64>,
) -> Result<CalendarEvent, ActionError> {
    let hours = match hours {
        Some(h) if h > 0.0 && h <= MAX_DURATION_HOURS => h,
        Some(_) => return Err(ActionError::InvalidDuration),
        None => duration_hours(&idea.duration)
            .filter(|h| *h <= MAX_DURATION_HOURS)
            .unwrap_or(DEFAULT_DURATION_HOURS),
    };

    let length = Duration::try_minutes((hours * 60.0).round() as i64)
        .ok_or(ActionError::InvalidDuration)?;
    let end_date = start.checked_add_signed(length).ok_or(ActionError::OutOfRange)?;

    Ok(CalendarEvent {
        title: idea.title.clone(),
        notes: idea.description.clone(),
        start_date: start,
        end_date,
        alarm_offset_minutes: -REMINDER_LEAD_MINUTES,
    })
}

/// 构建提醒计划，提醒时间必须晚于当前时间
pub fn reminder_schedule(
    title: &str,
    description: &str,
    date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<ReminderSchedule, ActionError> {
    let reminder_time = date
        .checked_sub_signed(Duration::minutes(REMINDER_LEAD_MINUTES))
        .ok_or(ActionError::OutOfRange)?;
    if reminder_time <= now {
        return Err(ActionError::PastDate);
    }

    Ok(ReminderSchedule {
        reminder: ScheduledNotification {
            title: format!("Upcoming Date: {}", title),
            body: description.to_string(),
            fire_at: reminder_time,
            channel_id: "date-reminders",
        },
        start: ScheduledNotification {
            title: "Time for your date!".to_string(),
            body: format!("{} is starting now", title),
            fire_at: date,
            channel_id: "date-reminders",
        },
    })
}

/// 根据创意内容给出准备建议
pub fn date_tips(raw: &str) -> Vec<&'static str> {
    let lower = raw.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if mentions(&["outdoor", "park", "picnic"]) {
        vec![
            "Check the weather forecast",
            "Bring a blanket or portable chairs",
            "Pack some snacks and drinks",
            "Consider bringing outdoor games",
        ]
    } else if mentions(&["restaurant", "dining"]) {
        vec![
            "Make a reservation in advance",
            "Check the dress code",
            "Look up the menu beforehand",
            "Consider dietary restrictions",
        ]
    } else if mentions(&["movie", "theater"]) {
        vec![
            "Book tickets in advance",
            "Arrive early for good seats",
            "Check movie reviews",
            "Plan dinner before/after",
        ]
    } else {
        vec![
            "Plan your transportation",
            "Set a budget",
            "Have a backup plan",
            "Communicate expectations",
        ]
    }
}
