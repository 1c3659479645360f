//! 偏好问卷类型定义
//!
//! 问卷每个问题的答案都是封闭枚举，前端只会展示 `ALL` 中的选项。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 必填偏好缺失
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Preferences are incomplete, missing: {}", .missing.join(", "))]
pub struct IncompletePreferences {
    pub missing: Vec<&'static str>,
}

/// 约会氛围
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Romantic,
    Adventurous,
    Relaxing,
    Fun,
}

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Romantic, Mood::Adventurous, Mood::Relaxing, Mood::Fun];

    pub fn label(self) -> &'static str {
        match self {
            Mood::Romantic => "Romantic",
            Mood::Adventurous => "Adventurous",
            Mood::Relaxing => "Relaxing",
            Mood::Fun => "Fun",
        }
    }
}

/// 场地偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Indoor,
    Outdoor,
    NoPreference,
}

impl Location {
    pub const ALL: [Location; 3] = [Location::Indoor, Location::Outdoor, Location::NoPreference];

    pub fn label(self) -> &'static str {
        match self {
            Location::Indoor => "Indoor",
            Location::Outdoor => "Outdoor",
            Location::NoPreference => "No Preference",
        }
    }
}

/// 是否包含餐饮
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodPreference {
    Yes,
    No,
    SurpriseMe,
}

impl FoodPreference {
    pub const ALL: [FoodPreference; 3] =
        [FoodPreference::Yes, FoodPreference::No, FoodPreference::SurpriseMe];

    pub fn label(self) -> &'static str {
        match self {
            FoodPreference::Yes => "Yes",
            FoodPreference::No => "No",
            FoodPreference::SurpriseMe => "Surprise Me",
        }
    }
}

/// 时间段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    #[default]
    Any,
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl TimeOfDay {
    pub const ALL: [TimeOfDay; 5] = [
        TimeOfDay::Any,
        TimeOfDay::Morning,
        TimeOfDay::Afternoon,
        TimeOfDay::Evening,
        TimeOfDay::Night,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeOfDay::Any => "Any",
            TimeOfDay::Morning => "Morning",
            TimeOfDay::Afternoon => "Afternoon",
            TimeOfDay::Evening => "Evening",
            TimeOfDay::Night => "Night",
        }
    }
}

/// 活动强度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Relaxed,
    #[default]
    Moderate,
    Active,
}

impl ActivityLevel {
    pub const ALL: [ActivityLevel; 3] =
        [ActivityLevel::Relaxed, ActivityLevel::Moderate, ActivityLevel::Active];

    pub fn label(self) -> &'static str {
        match self {
            ActivityLevel::Relaxed => "Relaxed",
            ActivityLevel::Moderate => "Moderate",
            ActivityLevel::Active => "Active",
        }
    }
}

/// 约会场合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occasion {
    #[default]
    RegularDate,
    FirstDate,
    Anniversary,
    Birthday,
    SpecialCelebration,
}

impl Occasion {
    pub const ALL: [Occasion; 5] = [
        Occasion::RegularDate,
        Occasion::FirstDate,
        Occasion::Anniversary,
        Occasion::Birthday,
        Occasion::SpecialCelebration,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Occasion::RegularDate => "Regular Date",
            Occasion::FirstDate => "First Date",
            Occasion::Anniversary => "Anniversary",
            Occasion::Birthday => "Birthday",
            Occasion::SpecialCelebration => "Special Celebration",
        }
    }
}

/// 季节
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    #[default]
    Any,
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub const ALL: [Season; 5] =
        [Season::Any, Season::Spring, Season::Summer, Season::Fall, Season::Winter];

    pub fn label(self) -> &'static str {
        match self {
            Season::Any => "Any",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }
}

/// 预算（美元）
///
/// 滑块取值范围 [0, 500]，步长 10。超出范围的值会被截断，非整十的值四舍五入到最近的刻度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Budget(u32);

impl Budget {
    pub const MIN: u32 = 0;
    pub const MAX: u32 = 500;
    pub const STEP: u32 = 10;
    pub const DEFAULT: u32 = 100;

    pub fn new(value: u32) -> Self {
        let clamped = value.min(Self::MAX);
        let snapped = (clamped + Self::STEP / 2) / Self::STEP * Self::STEP;
        Self(snapped.min(Self::MAX))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<u32> for Budget {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Budget> for u32 {
    fn from(budget: Budget) -> Self {
        budget.0
    }
}

/// 完整的问卷答案
///
/// 所有必填字段都有值；扩展字段缺省时分别为 Any / Moderate / Regular Date / Any。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceSet {
    pub mood: Mood,
    pub budget: Budget,
    pub location: Location,
    pub food_preference: FoodPreference,
    #[serde(default)]
    pub time_of_day: TimeOfDay,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub occasion: Occasion,
    #[serde(default)]
    pub season: Season,
}

impl PreferenceSet {
    /// 使用默认扩展字段构建基础问卷结果
    pub fn basic(mood: Mood, budget: Budget, location: Location, food: FoodPreference) -> Self {
        Self {
            mood,
            budget,
            location,
            food_preference: food,
            time_of_day: TimeOfDay::default(),
            activity_level: ActivityLevel::default(),
            occasion: Occasion::default(),
            season: Season::default(),
        }
    }
}

/// 尚未完成的问卷答案
///
/// 同时用作 REST 请求体：客户端可以提交任意子集，必须经过 [`PreferenceDraft::finish`]
/// 校验后才能进入生成流程。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceDraft {
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub budget: Option<Budget>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub food_preference: Option<FoodPreference>,
    #[serde(default)]
    pub time_of_day: Option<TimeOfDay>,
    #[serde(default)]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default)]
    pub occasion: Option<Occasion>,
    #[serde(default)]
    pub season: Option<Season>,
}

impl PreferenceDraft {
    /// 必填字段全部存在时生成 [`PreferenceSet`]，否则返回缺失字段列表
    pub fn finish(&self) -> Result<PreferenceSet, IncompletePreferences> {
        let mut missing = Vec::new();
        if self.mood.is_none() {
            missing.push("mood");
        }
        if self.budget.is_none() {
            missing.push("budget");
        }
        if self.location.is_none() {
            missing.push("location");
        }
        if self.food_preference.is_none() {
            missing.push("foodPreference");
        }

        match (self.mood, self.budget, self.location, self.food_preference) {
            (Some(mood), Some(budget), Some(location), Some(food_preference)) => Ok(PreferenceSet {
                mood,
                budget,
                location,
                food_preference,
                time_of_day: self.time_of_day.unwrap_or_default(),
                activity_level: self.activity_level.unwrap_or_default(),
                occasion: self.occasion.unwrap_or_default(),
                season: self.season.unwrap_or_default(),
            }),
            _ => Err(IncompletePreferences { missing }),
        }
    }
}
