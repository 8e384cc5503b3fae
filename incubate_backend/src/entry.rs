use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single journal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub user_id: String,
    pub entry_type: EntryType,
    pub title: Option<String>,
    pub text: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Entry {
    /// A fresh, undeleted entry with a new id and both timestamps at `now`.
    pub fn new(
        user_id: &str,
        entry_type: EntryType,
        title: Option<String>,
        text: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            entry_type,
            title,
            text,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Raw,
    Todos,
    Goals,
    Reflection,
}

impl EntryType {
    pub const ALL: [EntryType; 4] = [
        EntryType::Reflection,
        EntryType::Goals,
        EntryType::Todos,
        EntryType::Raw,
    ];

    pub fn as_db_str(self) -> &'static str {
        match self {
            EntryType::Raw => "raw",
            EntryType::Todos => "todos",
            EntryType::Goals => "goals",
            EntryType::Reflection => "reflection",
        }
    }

    pub fn from_db(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "todos" => EntryType::Todos,
            "goals" => EntryType::Goals,
            "reflection" => EntryType::Reflection,
            _ => EntryType::Raw,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            EntryType::Reflection => "Reflection",
            EntryType::Goals => "Goals",
            EntryType::Todos => "To-Do's",
            EntryType::Raw => "Raw",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: i64,
    pub entry_id: String,
    pub position: usize,
    pub text: String,
    pub is_done: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalItem {
    pub id: i64,
    pub entry_id: String,
    pub position: usize,
    pub bullet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionQa {
    pub id: i64,
    pub entry_id: String,
    pub position: usize,
    pub question: String,
    pub answer: String,
}

/// Input row for saving or replacing a to-do list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTodo {
    pub text: String,
    pub is_done: bool,
}

impl NewTodo {
    pub fn new(text: impl Into<String>, is_done: bool) -> Self {
        Self {
            text: text.into(),
            is_done,
        }
    }
}

/// An entry together with the child collection its type owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum EntryDetail {
    Raw(Entry),
    Todos { entry: Entry, items: Vec<TodoItem> },
    Goals { entry: Entry, items: Vec<GoalItem> },
    Reflection { entry: Entry, qas: Vec<ReflectionQa> },
}

impl EntryDetail {
    pub fn entry(&self) -> &Entry {
        match self {
            EntryDetail::Raw(entry)
            | EntryDetail::Todos { entry, .. }
            | EntryDetail::Goals { entry, .. }
            | EntryDetail::Reflection { entry, .. } => entry,
        }
    }

    pub fn id(&self) -> &str {
        &self.entry().id
    }

    pub fn into_entry(self) -> Entry {
        match self {
            EntryDetail::Raw(entry)
            | EntryDetail::Todos { entry, .. }
            | EntryDetail::Goals { entry, .. }
            | EntryDetail::Reflection { entry, .. } => entry,
        }
    }
}
