//! PIN app lock. The salt and digest live in `app_state`; attempt counting and
//! lockout are kept in memory for the life of the process.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::store::JournalStore;

pub const PIN_SALT_KEY: &str = "pin_salt";
pub const PIN_HASH_KEY: &str = "pin_hash";

const MAX_FAILED_ATTEMPTS: u32 = 5;
const LOCKOUT_SECONDS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    Unlocked,
    Rejected { attempts_left: u32 },
    LockedOut { remaining_secs: i64 },
}

pub struct AppLock {
    store: JournalStore,
    failed_attempts: u32,
    locked_until: Option<DateTime<Utc>>,
    unlocked: bool,
}

fn hash_pin(pin: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(pin.as_bytes());
    hasher.update(salt.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl AppLock {
    pub fn new(store: JournalStore) -> Self {
        Self {
            store,
            failed_attempts: 0,
            locked_until: None,
            unlocked: false,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub async fn has_pin(&self) -> Result<bool> {
        Ok(self.store.get_state(PIN_HASH_KEY).await?.is_some())
    }

    /// Replace the PIN with a fresh salt.
    pub async fn set_pin(&mut self, pin: &str) -> Result<()> {
        let salt = generate_salt();
        let digest = hash_pin(pin, &salt);
        self.store.set_state(PIN_SALT_KEY, &salt).await?;
        self.store.set_state(PIN_HASH_KEY, &digest).await?;
        tracing::info!("App lock PIN updated");
        Ok(())
    }

    /// Seconds left in the current lockout, clearing it once it has expired.
    pub fn lockout_remaining(&mut self, now: DateTime<Utc>) -> Option<i64> {
        let until = self.locked_until?;
        if now >= until {
            self.locked_until = None;
            self.failed_attempts = 0;
            return None;
        }
        Some((until - now).num_seconds().max(1))
    }

    /// With no PIN set any input unlocks. Five misses in a row lock
    /// verification out for a minute.
    pub async fn verify_pin(&mut self, pin: &str, now: DateTime<Utc>) -> Result<UnlockOutcome> {
        if let Some(remaining_secs) = self.lockout_remaining(now) {
            return Ok(UnlockOutcome::LockedOut { remaining_secs });
        }

        let salt = self.store.get_state(PIN_SALT_KEY).await?;
        let stored = self.store.get_state(PIN_HASH_KEY).await?;
        let (Some(salt), Some(stored)) = (salt, stored) else {
            self.unlocked = true;
            return Ok(UnlockOutcome::Unlocked);
        };

        if hash_pin(pin, &salt) == stored {
            self.failed_attempts = 0;
            self.unlocked = true;
            return Ok(UnlockOutcome::Unlocked);
        }

        self.failed_attempts += 1;
        tracing::warn!("Incorrect PIN ({} failed attempt(s))", self.failed_attempts);
        if self.failed_attempts >= MAX_FAILED_ATTEMPTS {
            self.locked_until = Some(now + Duration::seconds(LOCKOUT_SECONDS));
            return Ok(UnlockOutcome::LockedOut {
                remaining_secs: LOCKOUT_SECONDS,
            });
        }
        Ok(UnlockOutcome::Rejected {
            attempts_left: MAX_FAILED_ATTEMPTS - self.failed_attempts,
        })
    }
}
