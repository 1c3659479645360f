//! Prompt 构建服务
//!
//! 把问卷答案拼成自然语言 prompt，并随机挑选一个活动类型让相同偏好也能得到不同创意。

use rand::seq::SliceRandom;

use crate::models::PreferenceSet;

/// 活动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityType {
    OutdoorAdventure,
    IndoorCozy,
    CreativeWorkshop,
    FoodExperience,
    Entertainment,
    LearningTogether,
    SportsAndActive,
    Relaxation,
    CulturalExperience,
    UniqueLocalSpots,
}

impl ActivityType {
    pub const ALL: [ActivityType; 10] = [
        ActivityType::OutdoorAdventure,
        ActivityType::IndoorCozy,
        ActivityType::CreativeWorkshop,
        ActivityType::FoodExperience,
        ActivityType::Entertainment,
        ActivityType::LearningTogether,
        ActivityType::SportsAndActive,
        ActivityType::Relaxation,
        ActivityType::CulturalExperience,
        ActivityType::UniqueLocalSpots,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ActivityType::OutdoorAdventure => "outdoor adventure",
            ActivityType::IndoorCozy => "indoor cozy",
            ActivityType::CreativeWorkshop => "creative workshop",
            ActivityType::FoodExperience => "food experience",
            ActivityType::Entertainment => "entertainment",
            ActivityType::LearningTogether => "learning together",
            ActivityType::SportsAndActive => "sports and active",
            ActivityType::Relaxation => "relaxation",
            ActivityType::CulturalExperience => "cultural experience",
            ActivityType::UniqueLocalSpots => "unique local spots",
        }
    }

    /// 均匀随机选择
    pub fn random() -> Self {
        *Self::ALL
            .choose(&mut rand::thread_rng())
            .unwrap_or(&ActivityType::UniqueLocalSpots)
    }
}

/// 构建生成 prompt
pub fn build_prompt(preferences: &PreferenceSet, activity: ActivityType) -> String {
    format!(
        r#"Generate a creative and unique date idea with these preferences:
- Mood: {mood}
- Budget: ${budget}
- Location: {location}
- Food Preference: {food}
- Time of Day: {time_of_day}
- Activity Level: {activity_level}
- Occasion: {occasion}
- Season: {season}
- Activity Type: {activity}

Respond with exactly these five lines and nothing else:
Title: <a short catchy title>
Description: <two or three sentences describing the date>
Estimated cost: <approximate total cost in dollars>
Duration: <how long the date takes>
What makes it special: <one sentence>"#,
        mood = preferences.mood.label(),
        budget = preferences.budget.value(),
        location = preferences.location.label(),
        food = preferences.food_preference.label(),
        time_of_day = preferences.time_of_day.label(),
        activity_level = preferences.activity_level.label(),
        occasion = preferences.occasion.label(),
        season = preferences.season.label(),
        activity = activity.label(),
    )
}
