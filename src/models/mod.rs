//! 数据模型

mod api;
mod idea;
mod preferences;

pub use api::*;
pub use idea::{ChecklistItem, DateChecklist, DateMemory, GeneratedIdea, IdeaRecord};
pub use preferences::{
    ActivityLevel, Budget, FoodPreference, IncompletePreferences, Location, Mood, Occasion,
    PreferenceDraft, PreferenceSet, Season, TimeOfDay,
};
