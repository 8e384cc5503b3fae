use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One day's guided conversation with Inky.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReflection {
    pub id: String,
    pub date: NaiveDate,
    pub conversation: Vec<ConversationMessage>,
    pub is_completed: bool,
    /// 1-10, set once the conversation completes.
    pub growth_score: Option<u8>,
}

impl DailyReflection {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            conversation: Vec::new(),
            is_completed: false,
            growth_score: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub sender: MessageSender,
    pub content: String,
    pub message_type: MessageType,
}

impl ConversationMessage {
    pub fn new(
        sender: MessageSender,
        content: impl Into<String>,
        message_type: MessageType,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            sender,
            content: content.into(),
            message_type,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageSender::User, content, MessageType::Text)
    }

    pub fn inky(content: impl Into<String>, message_type: MessageType) -> Self {
        Self::new(MessageSender::Inky, content, message_type)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSender {
    User,
    Inky,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Text,
    Question,
    Insight,
    Celebration,
}

/// A canned observation produced by one of the pattern detectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthInsight {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: InsightCategory,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub related_entries: Vec<String>,
}

impl GrowthInsight {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: InsightCategory,
        confidence: f64,
        related_entries: Vec<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description: description.into(),
            category,
            confidence: confidence.clamp(0.0, 1.0),
            related_entries,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Sentiment,
    Productivity,
    GoalProgress,
    Patterns,
    Momentum,
}

impl InsightCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            InsightCategory::Sentiment => "sentiment",
            InsightCategory::Productivity => "productivity",
            InsightCategory::GoalProgress => "goal_progress",
            InsightCategory::Patterns => "patterns",
            InsightCategory::Momentum => "momentum",
        }
    }
}
