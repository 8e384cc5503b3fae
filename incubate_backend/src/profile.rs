use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analysis::journaling_streak;
use crate::store::JournalStore;

pub const FIRST_NAME_KEY: &str = "first_name";
pub const BIOMETRICS_ENABLED_KEY: &str = "biometrics_enabled";
pub const DEFAULT_FIRST_NAME: &str = "friend";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub first_name: String,
    pub streak_count: u32,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            first_name: DEFAULT_FIRST_NAME.to_string(),
            streak_count: 0,
        }
    }
}

pub async fn load_profile(
    store: &JournalStore,
    fetch_limit: usize,
    today: NaiveDate,
) -> Result<UserProfile> {
    let first_name = store
        .get_state(FIRST_NAME_KEY)
        .await?
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FIRST_NAME.to_string());

    let entries = store.fetch_all_active(fetch_limit).await?;
    Ok(UserProfile {
        first_name,
        streak_count: journaling_streak(&entries, today),
    })
}

/// A blank name clears the preference so the default greeting name is used.
pub async fn save_first_name(store: &JournalStore, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        store.delete_state(FIRST_NAME_KEY).await
    } else {
        store.set_state(FIRST_NAME_KEY, name).await
    }
}

pub async fn biometrics_enabled(store: &JournalStore) -> Result<bool> {
    Ok(store
        .get_state(BIOMETRICS_ENABLED_KEY)
        .await?
        .is_some_and(|v| v == "true"))
}

pub async fn set_biometrics_enabled(store: &JournalStore, enabled: bool) -> Result<()> {
    store
        .set_state(BIOMETRICS_ENABLED_KEY, if enabled { "true" } else { "false" })
        .await
}
