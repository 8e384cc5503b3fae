use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::keywords::extract_keywords;
use super::sentiment::SentimentAnalyzer;
use super::trend::mean_or;
use crate::entry::{Entry, EntryType};

const POSITIVE_DAY_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySentiment {
    pub date: NaiveDate,
    pub entry_count: usize,
    /// Mean enhanced sentiment; 0.5 for a day with no entries.
    pub average: f64,
    pub is_positive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyScore {
    /// Short month label, e.g. "Jan".
    pub month: String,
    /// 0-100
    pub score: u8,
}

fn is_written(entry: &Entry) -> bool {
    matches!(entry.entry_type, EntryType::Raw | EntryType::Reflection)
        && !entry.text.trim().is_empty()
}

/// One row per day for the last `days` days, oldest first, ending on `now`'s
/// UTC date.
pub fn daily_sentiment(
    entries: &[Entry],
    analyzer: &SentimentAnalyzer,
    now: DateTime<Utc>,
    days: u32,
) -> Vec<DailySentiment> {
    let today = now.date_naive();
    (0..days as i64)
        .rev()
        .map(|offset| {
            let date = today - Duration::days(offset);
            let scores: Vec<f64> = entries
                .iter()
                .filter(|e| is_written(e) && e.created_at.date_naive() == date)
                .map(|e| analyzer.enhanced_sentiment(&e.text))
                .collect();
            let average = mean_or(&scores, 0.5);
            DailySentiment {
                date,
                entry_count: scores.len(),
                average,
                is_positive: !scores.is_empty() && average > POSITIVE_DAY_THRESHOLD,
            }
        })
        .collect()
}

/// Average enhanced sentiment per calendar month as a 0-100 score, for the
/// last `months` months ending with the current one. Empty months score 0.
pub fn monthly_high_moments(
    entries: &[Entry],
    analyzer: &SentimentAnalyzer,
    now: DateTime<Utc>,
    months: u32,
) -> Vec<MonthlyScore> {
    let today = now.date_naive();
    let Some(this_month) = today.with_day(1) else {
        return Vec::new();
    };

    (0..months)
        .rev()
        .filter_map(|back| {
            let start = this_month.checked_sub_months(Months::new(back))?;
            let end = start.checked_add_months(Months::new(1))?;
            let scores: Vec<f64> = entries
                .iter()
                .filter(|e| is_written(e))
                .filter(|e| {
                    let day = e.created_at.date_naive();
                    day >= start && day < end
                })
                .map(|e| analyzer.enhanced_sentiment(&e.text))
                .collect();
            let score = if scores.is_empty() {
                0
            } else {
                (mean_or(&scores, 0.0) * 100.0).round().clamp(0.0, 100.0) as u8
            };
            Some(MonthlyScore {
                month: start.format("%b").to_string(),
                score,
            })
        })
        .collect()
}

/// Keywords appearing in the most written entries, capitalized for display.
pub fn top_themes(entries: &[Entry], max: usize) -> Vec<String> {
    let mut written: Vec<&Entry> = entries.iter().filter(|e| is_written(e)).collect();
    written.sort_by_key(|e| e.created_at);

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for entry in written {
        for keyword in extract_keywords(&entry.text, 10) {
            let count = counts.entry(keyword.clone()).or_insert_with(|| {
                order.push(keyword.clone());
                0
            });
            *count += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|k| {
            let count = counts.get(&k).copied().unwrap_or(0);
            (k, count)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(max)
        .map(|(keyword, _)| capitalize(&keyword))
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Consecutive days with at least one active entry, ending today or
/// yesterday.
pub fn journaling_streak(entries: &[Entry], today: NaiveDate) -> u32 {
    let days: HashSet<NaiveDate> = entries
        .iter()
        .filter(|e| e.is_active())
        .map(|e| e.created_at.date_naive())
        .collect();

    let mut cursor = if days.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if days.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(prev) => cursor = prev,
            None => break,
        }
    }
    streak
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).single().expect("valid time")
    }

    fn raw(text: &str, at: DateTime<Utc>) -> Entry {
        Entry::new("local-user", EntryType::Raw, None, text.to_string(), at)
    }

    #[test]
    fn daily_rows_cover_every_day_oldest_first() {
        let analyzer = SentimentAnalyzer::default();
        let entries = vec![
            raw("I'm grateful for everything", now()),
            raw("Feeling lonely and disconnected today", now() - Duration::days(2)),
        ];
        let rows = daily_sentiment(&entries, &analyzer, now(), 3);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].date, now().date_naive());
        assert!(rows[2].is_positive);
        assert_eq!(rows[1].entry_count, 0);
        assert_eq!(rows[1].average, 0.5);
        assert!(!rows[1].is_positive);
        assert!(!rows[0].is_positive);
    }

    #[test]
    fn monthly_scores_label_months_and_zero_empty_ones() {
        let analyzer = SentimentAnalyzer::default();
        let january = Utc.with_ymd_and_hms(2024, 1, 20, 9, 0, 0).single().expect("valid time");
        let entries = vec![raw("I'm grateful for everything", january)];
        let months = monthly_high_moments(&entries, &analyzer, now(), 3);

        let labels: Vec<&str> = months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(labels, vec!["Jan", "Feb", "Mar"]);
        assert_eq!(months[0].score, 100);
        assert_eq!(months[1].score, 0);
    }

    #[test]
    fn themes_count_entries_not_repetitions() {
        let entries = vec![
            raw("garden garden garden", now() - Duration::days(3)),
            raw("Quiet novel before bed", now() - Duration::days(2)),
            raw("Another novel tonight", now() - Duration::days(1)),
        ];
        assert_eq!(top_themes(&entries, 2), vec!["Novel", "Garden"]);
    }

    #[test]
    fn streak_counts_back_from_today_or_yesterday() {
        let today = now().date_naive();
        let at = |days: i64| raw("note", now() - Duration::days(days));

        assert_eq!(journaling_streak(&[at(0), at(1), at(2), at(4)], today), 3);
        assert_eq!(journaling_streak(&[at(1), at(2)], today), 2);
        assert_eq!(journaling_streak(&[at(2), at(3)], today), 0);
        assert_eq!(journaling_streak(&[], today), 0);

        let mut deleted = at(0);
        deleted.deleted_at = Some(now());
        assert_eq!(journaling_streak(&[deleted], today), 0);
    }
}
