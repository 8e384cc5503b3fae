//! Sample journal used when the real one is empty, and by `incubate_smoke --seed`.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::entry::{Entry, EntryType, GoalItem, NewTodo, TodoItem};
use crate::store::JournalStore;

pub const DEMO_USER_ID: &str = "demo-user";

const RAW_COUNT: i64 = 30;
const TODO_COUNT: i64 = 15;
const GOAL_COUNT: i64 = 10;
const DONE_TODO_ENTRIES: usize = 10;

const RAW_TEXTS: [&str; 10] = [
    "Today was amazing! I accomplished so much and felt really productive.",
    "Feeling grateful for the small wins today. Every step forward counts.",
    "Had some challenges but I'm learning to navigate them better.",
    "Feeling energized and motivated to tackle my goals.",
    "Reflecting on my progress and feeling proud of how far I've come.",
    "Today was a bit challenging but I'm staying positive.",
    "Celebrating another day of growth and self-improvement.",
    "Feeling overwhelmed but reminding myself that this too shall pass.",
    "Great energy today! Everything seems to be falling into place.",
    "Taking time to appreciate the journey, not just the destination.",
];

const TODO_TEXTS: [&str; 5] = [
    "Complete morning routine",
    "Review daily goals",
    "Take a short break",
    "Reflect on progress",
    "Plan tomorrow's priorities",
];

const GOAL_TEXTS: [&str; 5] = [
    "Improve daily productivity",
    "Build consistent habits",
    "Learn new skills",
    "Maintain work-life balance",
    "Grow personal relationships",
];

fn demo_entry(
    entry_type: EntryType,
    title: Option<String>,
    text: &str,
    at: DateTime<Utc>,
) -> Entry {
    let mut entry = Entry::new(DEMO_USER_ID, entry_type, title, text.to_string(), at);
    entry.tags = vec!["demo".to_string(), entry_type.as_db_str().to_string()];
    entry
}

/// 30 raw notes, 15 to-do lists and 10 goal lists, one per day counting back
/// from `now`.
pub fn demo_entries(now: DateTime<Utc>) -> Vec<Entry> {
    let mut entries = Vec::with_capacity((RAW_COUNT + TODO_COUNT + GOAL_COUNT) as usize);

    for i in 0..RAW_COUNT {
        let text = RAW_TEXTS[i as usize % RAW_TEXTS.len()];
        entries.push(demo_entry(EntryType::Raw, None, text, now - Duration::days(i)));
    }
    for i in 0..TODO_COUNT {
        entries.push(demo_entry(
            EntryType::Todos,
            Some(format!("Daily Tasks {}", i + 1)),
            "",
            now - Duration::days(i),
        ));
    }
    for i in 0..GOAL_COUNT {
        entries.push(demo_entry(
            EntryType::Goals,
            Some(format!("Weekly Goals {}", i + 1)),
            "",
            now - Duration::days(i),
        ));
    }

    entries
}

fn demo_todos_for(index: usize) -> Vec<NewTodo> {
    TODO_TEXTS
        .iter()
        .map(|text| NewTodo::new(*text, index < DONE_TODO_ENTRIES))
        .collect()
}

/// Five to-dos per entry; every item on the first ten entries is done.
pub fn demo_todo_items(entry_ids: &[String]) -> Vec<TodoItem> {
    let mut items = Vec::with_capacity(entry_ids.len() * TODO_TEXTS.len());
    for (index, entry_id) in entry_ids.iter().enumerate() {
        for (position, todo) in demo_todos_for(index).into_iter().enumerate() {
            items.push(TodoItem {
                id: items.len() as i64 + 1,
                entry_id: entry_id.clone(),
                position,
                text: todo.text,
                is_done: todo.is_done,
            });
        }
    }
    items
}

pub fn demo_goal_items(entry_ids: &[String]) -> Vec<GoalItem> {
    let mut items = Vec::with_capacity(entry_ids.len() * GOAL_TEXTS.len());
    for entry_id in entry_ids {
        for (position, bullet) in GOAL_TEXTS.iter().enumerate() {
            items.push(GoalItem {
                id: items.len() as i64 + 1,
                entry_id: entry_id.clone(),
                position,
                bullet: bullet.to_string(),
            });
        }
    }
    items
}

pub(crate) fn ids_of(entries: &[Entry], entry_type: EntryType) -> Vec<String> {
    entries
        .iter()
        .filter(|e| e.entry_type == entry_type)
        .map(|e| e.id.clone())
        .collect()
}

/// Write the demo journal into `store` under `user_id`. Returns the number of
/// entries written.
pub async fn seed(store: &JournalStore, user_id: &str, now: DateTime<Utc>) -> Result<usize> {
    let entries = demo_entries(now);
    let mut todo_index = 0usize;

    for entry in &entries {
        let mut entry = entry.clone();
        entry.user_id = user_id.to_string();
        let id = entry.id.clone();
        let entry_type = entry.entry_type;
        store.insert(entry).await?;

        let children_written = match entry_type {
            EntryType::Todos => {
                todo_index += 1;
                store
                    .replace_todo_items(&id, demo_todos_for(todo_index - 1))
                    .await?
            }
            EntryType::Goals => {
                let bullets = GOAL_TEXTS.iter().map(|b| b.to_string()).collect();
                store.replace_goal_items(&id, bullets).await?
            }
            EntryType::Raw | EntryType::Reflection => true,
        };
        if !children_written {
            tracing::warn!("Demo entry {} was not found when writing its items", id);
        }
    }

    tracing::info!("Seeded {} demo entries for {}", entries.len(), user_id);
    Ok(entries.len())
}
