//! 偏好问卷
//!
//! 固定顺序的问题序列，逐题累积答案并在最后一题给出完整的 [`PreferenceSet`]。
//! 预算题是连续滑块，只能通过显式的 "Next" 前进；其它题选中即前进。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    ActivityLevel, Budget, FoodPreference, GeneratedIdea, IncompletePreferences, Location, Mood,
    Occasion, PreferenceDraft, PreferenceSet, Season, TimeOfDay,
};

/// 问卷错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error(transparent)]
    Incomplete(#[from] IncompletePreferences),

    #[error("Expected an answer for question {expected}, got question {got}")]
    OutOfOrder { expected: usize, got: usize },

    #[error("Question {index} expects a {expected:?} answer")]
    WrongAnswer { index: usize, expected: Question },

    #[error("Only the budget question advances with Next")]
    NotBudgetQuestion,

    #[error("Already at the first question")]
    AtFirstQuestion,

    #[error("The quiz is already complete")]
    AlreadyComplete,

    #[error("The quiz is not complete yet")]
    NotComplete,
}

/// 问卷版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizVariant {
    /// 4 题
    #[default]
    Basic,
    /// 8 题
    Extended,
}

impl QuizVariant {
    pub fn questions(self) -> &'static [Question] {
        match self {
            QuizVariant::Basic => &[
                Question::Mood,
                Question::Budget,
                Question::Location,
                Question::FoodPreference,
            ],
            QuizVariant::Extended => &[
                Question::Mood,
                Question::Budget,
                Question::Location,
                Question::TimeOfDay,
                Question::ActivityLevel,
                Question::Occasion,
                Question::Season,
                Question::FoodPreference,
            ],
        }
    }
}

/// 问题
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Question {
    Mood,
    Budget,
    Location,
    TimeOfDay,
    ActivityLevel,
    Occasion,
    Season,
    FoodPreference,
}

impl Question {
    pub fn prompt(self) -> &'static str {
        match self {
            Question::Mood => "What's the mood for your date?",
            Question::Budget => "What's your budget?",
            Question::Location => "Indoor or outdoor?",
            Question::TimeOfDay => "What time of day works best?",
            Question::ActivityLevel => "How active do you want to be?",
            Question::Occasion => "What's the occasion?",
            Question::Season => "What season is it?",
            Question::FoodPreference => "Should food be part of the date?",
        }
    }

    /// 可选项；预算题没有离散选项
    pub fn choices(self) -> Vec<Choice> {
        match self {
            Question::Mood => Mood::ALL.iter().map(|v| Choice::of(*v, v.label())).collect(),
            Question::Budget => Vec::new(),
            Question::Location => Location::ALL.iter().map(|v| Choice::of(*v, v.label())).collect(),
            Question::TimeOfDay => TimeOfDay::ALL.iter().map(|v| Choice::of(*v, v.label())).collect(),
            Question::ActivityLevel => {
                ActivityLevel::ALL.iter().map(|v| Choice::of(*v, v.label())).collect()
            }
            Question::Occasion => Occasion::ALL.iter().map(|v| Choice::of(*v, v.label())).collect(),
            Question::Season => Season::ALL.iter().map(|v| Choice::of(*v, v.label())).collect(),
            Question::FoodPreference => {
                FoodPreference::ALL.iter().map(|v| Choice::of(*v, v.label())).collect()
            }
        }
    }
}

/// 展示给用户的选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    /// 提交答案时使用的值
    pub value: String,
    pub label: &'static str,
}

impl Choice {
    fn of<T: Serialize>(value: T, label: &'static str) -> Self {
        let value = serde_json::to_value(value)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Self { value, label }
    }
}

/// 预算滑块
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BudgetSlider {
    pub min: u32,
    pub max: u32,
    pub step: u32,
    pub value: u32,
}

/// 一道题的答案
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "question", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Mood(Mood),
    Budget(Budget),
    Location(Location),
    TimeOfDay(TimeOfDay),
    ActivityLevel(ActivityLevel),
    Occasion(Occasion),
    Season(Season),
    FoodPreference(FoodPreference),
}

impl Answer {
    pub fn question(&self) -> Question {
        match self {
            Answer::Mood(_) => Question::Mood,
            Answer::Budget(_) => Question::Budget,
            Answer::Location(_) => Question::Location,
            Answer::TimeOfDay(_) => Question::TimeOfDay,
            Answer::ActivityLevel(_) => Question::ActivityLevel,
            Answer::Occasion(_) => Question::Occasion,
            Answer::Season(_) => Question::Season,
            Answer::FoodPreference(_) => Question::FoodPreference,
        }
    }

    fn apply(self, draft: &mut PreferenceDraft) {
        match self {
            Answer::Mood(v) => draft.mood = Some(v),
            Answer::Budget(v) => draft.budget = Some(v),
            Answer::Location(v) => draft.location = Some(v),
            Answer::TimeOfDay(v) => draft.time_of_day = Some(v),
            Answer::ActivityLevel(v) => draft.activity_level = Some(v),
            Answer::Occasion(v) => draft.occasion = Some(v),
            Answer::Season(v) => draft.season = Some(v),
            Answer::FoodPreference(v) => draft.food_preference = Some(v),
        }
    }
}

/// 作答后的状态转移结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStep {
    /// 前进到指定题号
    Advanced(usize),
    /// 停留在当前题（预算滑块调整）
    Stayed(usize),
    /// 问卷完成
    Complete(PreferenceSet),
}

/// 当前题目视图
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub index: usize,
    pub total: usize,
    pub question: Question,
    pub prompt: &'static str,
    pub choices: Vec<Choice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetSlider>,
}

/// 偏好收集器
#[derive(Debug, Clone)]
pub struct PreferenceCollector {
    variant: QuizVariant,
    current: usize,
    complete: bool,
    draft: PreferenceDraft,
}

impl PreferenceCollector {
    pub fn new(variant: QuizVariant) -> Self {
        Self {
            variant,
            current: 0,
            complete: false,
            draft: PreferenceDraft::default(),
        }
    }

    pub fn variant(&self) -> QuizVariant {
        self.variant
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Question {
        self.variant.questions()[self.current]
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn answers(&self) -> &PreferenceDraft {
        &self.draft
    }

    fn last_index(&self) -> usize {
        self.variant.questions().len() - 1
    }

    /// 完成后的答案；未完成时拒绝
    pub fn preferences(&self) -> Result<PreferenceSet, QuizError> {
        if !self.complete {
            return Err(QuizError::NotComplete);
        }
        Ok(self.draft.finish()?)
    }

    /// 记录第 `index` 题的答案
    pub fn record_answer(&mut self, index: usize, answer: Answer) -> Result<QuizStep, QuizError> {
        if self.complete {
            return Err(QuizError::AlreadyComplete);
        }
        if index != self.current {
            return Err(QuizError::OutOfOrder {
                expected: self.current,
                got: index,
            });
        }

        let expected = self.current_question();
        if answer.question() != expected {
            return Err(QuizError::WrongAnswer { index, expected });
        }

        answer.apply(&mut self.draft);

        if expected == Question::Budget {
            return Ok(QuizStep::Stayed(self.current));
        }

        if self.current == self.last_index() {
            let preferences = self.draft.finish()?;
            self.complete = true;
            return Ok(QuizStep::Complete(preferences));
        }

        self.current += 1;
        Ok(QuizStep::Advanced(self.current))
    }

    /// 预算题的 "Next"，未拖动滑块时使用默认预算
    pub fn next(&mut self) -> Result<QuizStep, QuizError> {
        if self.complete {
            return Err(QuizError::AlreadyComplete);
        }
        if self.current_question() != Question::Budget {
            return Err(QuizError::NotBudgetQuestion);
        }

        self.draft.budget.get_or_insert_with(Budget::default);
        self.current += 1;
        Ok(QuizStep::Advanced(self.current))
    }

    /// 回到上一题，已有答案保留
    pub fn back(&mut self) -> Result<usize, QuizError> {
        if self.complete {
            return Err(QuizError::AlreadyComplete);
        }
        if self.current == 0 {
            return Err(QuizError::AtFirstQuestion);
        }
        self.current -= 1;
        Ok(self.current)
    }

    /// 生成失败后回到最后一题，保留全部答案
    pub fn reopen(&mut self) {
        if self.complete {
            self.complete = false;
            self.current = self.last_index();
        }
    }

    pub fn question_view(&self) -> QuestionView {
        let question = self.current_question();
        let budget = (question == Question::Budget).then(|| BudgetSlider {
            min: Budget::MIN,
            max: Budget::MAX,
            step: Budget::STEP,
            value: self.draft.budget.unwrap_or_default().value(),
        });

        QuestionView {
            index: self.current,
            total: self.variant.questions().len(),
            question,
            prompt: question.prompt(),
            choices: question.choices(),
            budget,
        }
    }
}

/// 服务端保存的问卷会话
#[derive(Debug, Clone)]
pub struct QuizSession {
    pub collector: PreferenceCollector,
    /// 生成进行中，期间拒绝重复触发
    pub generating: bool,
    /// 最近一次生成的创意，保存失败时可以直接重试保存
    pub last_idea: Option<GeneratedIdea>,
    pub created_at: DateTime<Utc>,
}

impl QuizSession {
    pub fn new(variant: QuizVariant) -> Self {
        Self {
            collector: PreferenceCollector::new(variant),
            generating: false,
            last_idea: None,
            created_at: Utc::now(),
        }
    }
}
