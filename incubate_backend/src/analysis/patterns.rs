use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

use super::keywords::extract_keywords;
use super::sentiment::analyze_sentiment;
use super::trend::{calculate_trend, mean_or};
use crate::entry::{Entry, EntryType, GoalItem, TodoItem};
use crate::reflection::{GrowthInsight, InsightCategory};

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
/// Upper bound on the window; larger configured values are clamped.
pub const MAX_WINDOW_DAYS: i64 = 36_500;

const GOAL_KEYWORDS: [&str; 6] = ["goal", "target", "achieve", "progress", "milestone", "success"];
const MOMENTUM_THRESHOLD: f64 = 0.1;
const TREND_THRESHOLD: f64 = 0.1;
const THEME_MIN_ENTRIES: usize = 3;

/// Runs the insight detectors over a trailing window ending at `now`.
#[derive(Debug, Clone, Copy)]
pub struct PatternDetector {
    window: Duration,
}

impl Default for PatternDetector {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

impl PatternDetector {
    pub fn new(window_days: i64) -> Self {
        Self {
            window: Duration::days(window_days.clamp(1, MAX_WINDOW_DAYS)),
        }
    }

    fn recent<'a>(&self, entries: &'a [Entry], now: DateTime<Utc>) -> Vec<&'a Entry> {
        let since = now - self.window;
        entries.iter().filter(|e| e.created_at >= since).collect()
    }

    /// Share of completed to-dos on recent entries.
    pub fn productivity(
        &self,
        entries: &[Entry],
        todos: &[TodoItem],
        now: DateTime<Utc>,
    ) -> Option<GrowthInsight> {
        if entries.is_empty() {
            return None;
        }

        let recent = self.recent(entries, now);
        let recent_ids: HashSet<&str> = recent.iter().map(|e| e.id.as_str()).collect();
        let recent_todos: Vec<&TodoItem> = todos
            .iter()
            .filter(|t| recent_ids.contains(t.entry_id.as_str()))
            .collect();

        let rate = if recent_todos.is_empty() {
            0.0
        } else {
            recent_todos.iter().filter(|t| t.is_done).count() as f64 / recent_todos.len() as f64
        };
        let percent = (rate * 100.0) as i64;
        let related = recent.iter().map(|e| e.id.clone()).collect();

        if rate >= 0.7 {
            Some(GrowthInsight::new(
                "High Productivity Streak!",
                format!(
                    "You've been completing {}% of your todos in the last {} days. This shows great focus and follow-through!",
                    percent,
                    self.window.num_days()
                ),
                InsightCategory::Productivity,
                rate,
                related,
            ))
        } else if rate <= 0.3 {
            Some(GrowthInsight::new(
                "Room for Growth",
                format!(
                    "You're completing {}% of your todos. Consider breaking down larger tasks or setting more achievable daily goals.",
                    percent
                ),
                InsightCategory::Productivity,
                1.0 - rate,
                related,
            ))
        } else {
            None
        }
    }

    /// Direction of keyword sentiment across recent raw entries, oldest first.
    pub fn sentiment_trend(&self, entries: &[Entry], now: DateTime<Utc>) -> Option<GrowthInsight> {
        if entries.len() < 3 {
            return None;
        }

        let mut recent: Vec<&Entry> = self
            .recent(entries, now)
            .into_iter()
            .filter(|e| e.entry_type == EntryType::Raw)
            .collect();
        if recent.len() < 3 {
            return None;
        }

        recent.sort_by_key(|e| e.created_at);
        let sentiments: Vec<f64> = recent.iter().map(|e| analyze_sentiment(&e.text)).collect();
        let slope = calculate_trend(&sentiments);
        let confidence = (slope.abs() * 2.0).min(1.0);
        let related = recent.iter().map(|e| e.id.clone()).collect();

        if slope > TREND_THRESHOLD {
            Some(GrowthInsight::new(
                "Positive Momentum Building!",
                "Your journal entries show an upward trend in positive sentiment. You're developing a more optimistic outlook!",
                InsightCategory::Sentiment,
                confidence,
                related,
            ))
        } else if slope < -TREND_THRESHOLD {
            Some(GrowthInsight::new(
                "Navigating Challenges",
                "Your recent entries suggest you're working through some difficulties. Remember, growth often comes from challenging times.",
                InsightCategory::Sentiment,
                confidence,
                related,
            ))
        } else {
            None
        }
    }

    /// Upbeat raw entries that talk about goals, as a share of all recent
    /// entries. Only the fixed goal words count as goal talk; goal items are
    /// not consulted.
    pub fn goal_progress_correlation(
        &self,
        entries: &[Entry],
        _goals: &[GoalItem],
        now: DateTime<Utc>,
    ) -> Option<GrowthInsight> {
        if entries.is_empty() {
            return None;
        }

        let recent = self.recent(entries, now);
        if recent.is_empty() {
            return None;
        }
        let mentioned: Vec<&Entry> = recent
            .iter()
            .copied()
            .filter(|e| e.entry_type == EntryType::Raw && analyze_sentiment(&e.text) > 0.6)
            .filter(|e| {
                let lowered = e.text.to_lowercase();
                GOAL_KEYWORDS.iter().any(|k| lowered.contains(k))
            })
            .collect();
        if mentioned.is_empty() {
            return None;
        }

        let correlation = mentioned.len() as f64 / recent.len() as f64;
        if correlation <= 0.3 {
            return None;
        }

        Some(GrowthInsight::new(
            "Goals Fueling Positivity!",
            format!(
                "When you focus on your goals, your mood tends to improve. {} of your {} recent entries are upbeat and mention goal-related topics.",
                mentioned.len(),
                recent.len()
            ),
            InsightCategory::GoalProgress,
            correlation,
            mentioned.iter().map(|e| e.id.clone()).collect(),
        ))
    }

    /// A keyword that keeps coming back across recent written entries.
    pub fn recurring_themes(&self, entries: &[Entry], now: DateTime<Utc>) -> Option<GrowthInsight> {
        let mut written: Vec<&Entry> = self
            .recent(entries, now)
            .into_iter()
            .filter(|e| matches!(e.entry_type, EntryType::Raw | EntryType::Reflection))
            .filter(|e| !e.text.trim().is_empty())
            .collect();
        if written.len() < THEME_MIN_ENTRIES {
            return None;
        }
        written.sort_by_key(|e| e.created_at);

        let mut order: Vec<String> = Vec::new();
        let mut hits: HashMap<String, Vec<String>> = HashMap::new();
        for entry in &written {
            for keyword in extract_keywords(&entry.text, 10) {
                let ids = hits.entry(keyword.clone()).or_insert_with(|| {
                    order.push(keyword.clone());
                    Vec::new()
                });
                ids.push(entry.id.clone());
            }
        }

        let mut best: Option<(&String, &Vec<String>)> = None;
        for keyword in &order {
            let Some(ids) = hits.get(keyword) else {
                continue;
            };
            if best.map_or(true, |(_, top)| ids.len() > top.len()) {
                best = Some((keyword, ids));
            }
        }

        let (keyword, ids) = best?;
        if ids.len() < THEME_MIN_ENTRIES {
            return None;
        }

        Some(GrowthInsight::new(
            format!("Recurring Theme: {}", keyword),
            format!(
                "\"{}\" has come up in {} of your last {} written entries. It seems to matter to you right now.",
                keyword,
                ids.len(),
                written.len()
            ),
            InsightCategory::Patterns,
            ids.len() as f64 / written.len() as f64,
            ids.clone(),
        ))
    }
}

pub fn detect_productivity_patterns(
    entries: &[Entry],
    todos: &[TodoItem],
    now: DateTime<Utc>,
) -> Option<GrowthInsight> {
    PatternDetector::default().productivity(entries, todos, now)
}

pub fn detect_sentiment_trends(entries: &[Entry], now: DateTime<Utc>) -> Option<GrowthInsight> {
    PatternDetector::default().sentiment_trend(entries, now)
}

pub fn detect_goal_progress_correlation(
    entries: &[Entry],
    goals: &[GoalItem],
    now: DateTime<Utc>,
) -> Option<GrowthInsight> {
    PatternDetector::default().goal_progress_correlation(entries, goals, now)
}

pub fn detect_recurring_themes(entries: &[Entry], now: DateTime<Utc>) -> Option<GrowthInsight> {
    PatternDetector::default().recurring_themes(entries, now)
}

/// Momentum insight when the week-over-week change is meaningful.
pub fn detect_momentum_shift(momentum: f64) -> Option<GrowthInsight> {
    if !momentum.is_finite() {
        return None;
    }
    let confidence = (momentum.abs() * 2.0).min(1.0);
    if momentum > MOMENTUM_THRESHOLD {
        Some(GrowthInsight::new(
            "Momentum Is Rising",
            "This week's entries feel brighter than last week's. Whatever you're doing, it's working.",
            InsightCategory::Momentum,
            confidence,
            Vec::new(),
        ))
    } else if momentum < -MOMENTUM_THRESHOLD {
        Some(GrowthInsight::new(
            "A Slower Week",
            "This week has felt heavier than last week. Be gentle with yourself and focus on small steps.",
            InsightCategory::Momentum,
            confidence,
            Vec::new(),
        ))
    } else {
        None
    }
}

/// Mean keyword sentiment of the last 7 days minus that of the 7 days before.
pub fn calculate_weekly_growth_momentum(entries: &[Entry], now: DateTime<Utc>) -> f64 {
    let last_7 = now - Duration::days(7);
    let last_14 = now - Duration::days(14);

    let recent: Vec<f64> = entries
        .iter()
        .filter(|e| e.created_at >= last_7)
        .map(|e| analyze_sentiment(&e.text))
        .collect();
    let previous: Vec<f64> = entries
        .iter()
        .filter(|e| e.created_at >= last_14 && e.created_at < last_7)
        .map(|e| analyze_sentiment(&e.text))
        .collect();

    mean_or(&recent, 0.5) - mean_or(&previous, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).single().expect("valid time")
    }

    fn entry(entry_type: EntryType, text: &str, days_ago: i64) -> Entry {
        Entry::new(
            "local-user",
            entry_type,
            None,
            text.to_string(),
            now() - Duration::days(days_ago),
        )
    }

    fn todos_for(entry: &Entry, done: usize, total: usize) -> Vec<TodoItem> {
        (0..total)
            .map(|i| TodoItem {
                id: i as i64 + 1,
                entry_id: entry.id.clone(),
                position: i,
                text: format!("task {}", i),
                is_done: i < done,
            })
            .collect()
    }

    #[test]
    fn productivity_bands() {
        let list = entry(EntryType::Todos, "", 1);
        let entries = vec![list.clone()];

        let high = detect_productivity_patterns(&entries, &todos_for(&list, 4, 5), now())
            .expect("high insight");
        assert_eq!(high.title, "High Productivity Streak!");
        assert!((high.confidence - 0.8).abs() < 1e-9);

        let low = detect_productivity_patterns(&entries, &todos_for(&list, 1, 5), now())
            .expect("low insight");
        assert_eq!(low.title, "Room for Growth");
        assert!((low.confidence - 0.8).abs() < 1e-9);

        assert!(detect_productivity_patterns(&entries, &todos_for(&list, 1, 2), now()).is_none());
        assert!(detect_productivity_patterns(&[], &[], now()).is_none());
    }

    #[test]
    fn productivity_ignores_todos_outside_the_window() {
        let old = entry(EntryType::Todos, "", 45);
        let fresh = entry(EntryType::Todos, "", 2);
        let mut todos = todos_for(&old, 5, 5);
        todos.extend(todos_for(&fresh, 0, 5));

        let insight = detect_productivity_patterns(&[old, fresh], &todos, now()).expect("insight");
        assert_eq!(insight.title, "Room for Growth");
        assert_eq!(insight.confidence, 1.0);
    }

    #[test]
    fn sentiment_trend_detects_improvement_and_decline() {
        let improving = vec![
            entry(EntryType::Raw, "sad and tired", 3),
            entry(EntryType::Raw, "happy but tired", 2),
            entry(EntryType::Raw, "happy and proud", 1),
        ];
        let insight = detect_sentiment_trends(&improving, now()).expect("insight");
        assert_eq!(insight.title, "Positive Momentum Building!");
        assert_eq!(insight.category, InsightCategory::Sentiment);
        assert_eq!(insight.confidence, 1.0);

        let declining = vec![
            entry(EntryType::Raw, "happy and proud", 3),
            entry(EntryType::Raw, "happy but tired", 2),
            entry(EntryType::Raw, "sad and tired", 1),
        ];
        let insight = detect_sentiment_trends(&declining, now()).expect("insight");
        assert_eq!(insight.title, "Navigating Challenges");
    }

    #[test]
    fn sentiment_trend_needs_three_recent_raw_entries() {
        let entries = vec![
            entry(EntryType::Raw, "sad", 3),
            entry(EntryType::Raw, "happy", 1),
            entry(EntryType::Todos, "", 1),
        ];
        assert!(detect_sentiment_trends(&entries, now()).is_none());

        let flat = vec![
            entry(EntryType::Raw, "happy", 3),
            entry(EntryType::Raw, "happy", 2),
            entry(EntryType::Raw, "happy", 1),
        ];
        assert!(detect_sentiment_trends(&flat, now()).is_none());
    }

    #[test]
    fn goal_correlation_requires_upbeat_goal_talk() {
        let entries = vec![
            entry(EntryType::Raw, "Made great progress on my goal today", 1),
            entry(EntryType::Raw, "Feeling proud of this milestone", 2),
            entry(EntryType::Raw, "Nothing much happened", 3),
        ];
        let insight = detect_goal_progress_correlation(&entries, &[], now()).expect("insight");
        assert_eq!(insight.category, InsightCategory::GoalProgress);
        assert_eq!(insight.related_entries.len(), 2);
        assert!((insight.confidence - 2.0 / 3.0).abs() < 1e-9);

        let gloomy = vec![entry(EntryType::Raw, "my goal feels hopeless", 1)];
        assert!(detect_goal_progress_correlation(&gloomy, &[], now()).is_none());
    }

    #[test]
    fn goal_bullets_do_not_widen_goal_talk() {
        let goals_entry = entry(EntryType::Goals, "", 1);
        let dinner = entry(EntryType::Raw, "Great dinner, I knew everyone there and felt happy", 1);
        let entries = vec![goals_entry.clone(), dinner];

        let bullets = vec![GoalItem {
            id: 1,
            entry_id: goals_entry.id.clone(),
            position: 0,
            bullet: "Learn new skills".to_string(),
        }];
        assert!(detect_goal_progress_correlation(&entries, &bullets, now()).is_none());
        assert!(detect_goal_progress_correlation(&entries, &[], now()).is_none());
    }

    #[test]
    fn huge_window_is_clamped_instead_of_overflowing() {
        let detector = PatternDetector::new(i64::MAX);
        let entries = vec![entry(EntryType::Raw, "ancient note", 3650)];
        assert_eq!(detector.recent(&entries, now()).len(), 1);

        let tiny = PatternDetector::new(-5);
        assert!(tiny.recent(&entries, now()).is_empty());
    }

    #[test]
    fn recurring_theme_needs_three_entries() {
        let entries = vec![
            entry(EntryType::Raw, "Long walk in the garden", 1),
            entry(EntryType::Raw, "Planted tomatoes in the garden", 2),
            entry(EntryType::Reflection, "The garden keeps me grounded", 3),
            entry(EntryType::Raw, "Work was busy", 4),
        ];
        let insight = detect_recurring_themes(&entries, now()).expect("insight");
        assert_eq!(insight.title, "Recurring Theme: garden");
        assert_eq!(insight.related_entries.len(), 3);
        assert_eq!(insight.category, InsightCategory::Patterns);

        assert!(detect_recurring_themes(&entries[..2], now()).is_none());
    }

    #[test]
    fn momentum_compares_this_week_with_last() {
        let entries = vec![
            entry(EntryType::Raw, "happy", 1),
            entry(EntryType::Raw, "sad", 10),
        ];
        assert_eq!(calculate_weekly_growth_momentum(&entries, now()), 1.0);
        assert_eq!(calculate_weekly_growth_momentum(&[], now()), 0.0);

        let insight = detect_momentum_shift(1.0).expect("rising");
        assert_eq!(insight.category, InsightCategory::Momentum);
        assert!(detect_momentum_shift(-0.5).is_some());
        assert!(detect_momentum_shift(0.05).is_none());
        assert!(detect_momentum_shift(f64::NAN).is_none());
    }
}
