use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::{
    calculate_weekly_growth_momentum, detect_momentum_shift, extract_keywords, PatternDetector,
};
use crate::config::IncubateConfig;
use crate::demo;
use crate::entry::{Entry, EntryDetail, EntryType, GoalItem, TodoItem};
use crate::reflection::GrowthInsight;
use crate::store::JournalStore;

const RECENT_KEYWORD_DAYS: i64 = 7;
const RECENT_KEYWORD_COUNT: usize = 5;

/// What Inky knows going into a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub insights: Vec<GrowthInsight>,
    pub weekly_momentum: f64,
    pub recent_keywords: Vec<String>,
    pub used_demo_data: bool,
}

pub struct InsightService {
    store: JournalStore,
    detector: PatternDetector,
    fetch_limit: usize,
    demo_fallback: bool,
}

impl InsightService {
    pub fn new(store: JournalStore, config: &IncubateConfig) -> Self {
        Self {
            store,
            detector: PatternDetector::new(config.insight_window_days),
            fetch_limit: config.fetch_limit,
            demo_fallback: config.enable_demo_fallback,
        }
    }

    pub async fn generate(&self, now: DateTime<Utc>) -> Result<InsightReport> {
        let entries = self.store.fetch_all_active(self.fetch_limit).await?;

        if entries.is_empty() && self.demo_fallback {
            tracing::info!("Journal is empty, generating insights from demo data");
            let entries = demo::demo_entries(now);
            let todos = demo::demo_todo_items(&demo::ids_of(&entries, EntryType::Todos));
            let goals = demo::demo_goal_items(&demo::ids_of(&entries, EntryType::Goals));
            let mut report = build_report(&self.detector, &entries, &todos, &goals, now);
            report.used_demo_data = true;
            return Ok(report);
        }

        let (todos, goals) = self.load_children(&entries).await;
        let report = build_report(&self.detector, &entries, &todos, &goals, now);
        tracing::debug!(
            "Generated {} insights from {} entries (momentum {:.3})",
            report.insights.len(),
            entries.len(),
            report.weekly_momentum
        );
        Ok(report)
    }

    /// Child items for every to-do and goal entry. An entry whose detail
    /// cannot be read is skipped.
    async fn load_children(&self, entries: &[Entry]) -> (Vec<TodoItem>, Vec<GoalItem>) {
        let mut todos = Vec::new();
        let mut goals = Vec::new();

        for entry in entries
            .iter()
            .filter(|e| matches!(e.entry_type, EntryType::Todos | EntryType::Goals))
        {
            match self.store.fetch_entry_detail(&entry.id).await {
                Ok(Some(EntryDetail::Todos { items, .. })) => todos.extend(items),
                Ok(Some(EntryDetail::Goals { items, .. })) => goals.extend(items),
                Ok(_) => {}
                Err(e) => tracing::warn!("Skipping children of entry {}: {}", entry.id, e),
            }
        }

        (todos, goals)
    }
}

/// Run every detector in order: productivity, sentiment trend, goal
/// correlation, momentum, recurring themes.
pub fn build_report(
    detector: &PatternDetector,
    entries: &[Entry],
    todos: &[TodoItem],
    goals: &[GoalItem],
    now: DateTime<Utc>,
) -> InsightReport {
    let weekly_momentum = calculate_weekly_growth_momentum(entries, now);

    let insights: Vec<GrowthInsight> = [
        detector.productivity(entries, todos, now),
        detector.sentiment_trend(entries, now),
        detector.goal_progress_correlation(entries, goals, now),
        detect_momentum_shift(weekly_momentum),
        detector.recurring_themes(entries, now),
    ]
    .into_iter()
    .flatten()
    .collect();

    InsightReport {
        insights,
        weekly_momentum,
        recent_keywords: recent_keywords(entries, now),
        used_demo_data: false,
    }
}

/// Most frequent keywords across the last week of written entries.
fn recent_keywords(entries: &[Entry], now: DateTime<Utc>) -> Vec<String> {
    let since = now - Duration::days(RECENT_KEYWORD_DAYS);
    let text = entries
        .iter()
        .filter(|e| e.created_at >= since)
        .filter(|e| matches!(e.entry_type, EntryType::Raw | EntryType::Reflection))
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    extract_keywords(&text, RECENT_KEYWORD_COUNT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::NewTodo;
    use crate::reflection::InsightCategory;

    fn temp_config(dir: &tempfile::TempDir) -> IncubateConfig {
        IncubateConfig {
            database_path: dir.path().join("db.sqlite").to_string_lossy().into_owned(),
            ..IncubateConfig::default()
        }
    }

    fn open_store(config: &IncubateConfig) -> JournalStore {
        JournalStore::open(&config.database_path, &config.user_id, 8).expect("store")
    }

    #[tokio::test]
    async fn empty_journal_falls_back_to_demo_data() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = temp_config(&dir);
        let service = InsightService::new(open_store(&config), &config);

        let report = service.generate(Utc::now()).await.expect("report");
        assert!(report.used_demo_data);
        // 50 of 75 demo to-dos are done, which sits between both bands.
        assert!(report
            .insights
            .iter()
            .all(|i| i.category != InsightCategory::Productivity));
        assert!(report
            .insights
            .iter()
            .any(|i| i.category == InsightCategory::Patterns));
        assert!(!report.recent_keywords.is_empty());
    }

    #[tokio::test]
    async fn empty_journal_without_fallback_has_no_insights() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = IncubateConfig {
            enable_demo_fallback: false,
            ..temp_config(&dir)
        };
        let service = InsightService::new(open_store(&config), &config);

        let report = service.generate(Utc::now()).await.expect("report");
        assert!(!report.used_demo_data);
        assert!(report.insights.is_empty());
        assert_eq!(report.weekly_momentum, 0.0);
    }

    #[tokio::test]
    async fn stored_children_feed_the_detectors() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = temp_config(&dir);
        let store = open_store(&config);
        store
            .save_new_todos(
                "Today",
                vec![
                    NewTodo::new("a", false),
                    NewTodo::new("b", false),
                    NewTodo::new("c", false),
                ],
            )
            .await
            .expect("save todos");
        store
            .save_new_raw(None, "Long walk in the garden with the dog")
            .await
            .expect("save raw");

        let service = InsightService::new(store, &config);
        let report = service.generate(Utc::now()).await.expect("report");

        assert!(!report.used_demo_data);
        assert_eq!(report.insights[0].title, "Room for Growth");
        assert!(report.recent_keywords.contains(&"garden".to_string()));
    }
}
