use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::analysis::{LexiconTagger, SentimentAnalyzer, SentimentTagger};
use crate::config::IncubateConfig;
use crate::inky::InsightService;
use crate::lock::AppLock;
use crate::session::ReflectionSession;
use crate::store::JournalStore;

/// Services built once at startup and shared by reference or clone.
pub struct IncubateRuntime {
    pub config: IncubateConfig,
    pub store: JournalStore,
    pub analyzer: Arc<SentimentAnalyzer>,
    pub insights: Arc<InsightService>,
}

pub struct IncubateRuntimeBuilder {
    config: IncubateConfig,
    tagger: Option<Box<dyn SentimentTagger>>,
}

impl IncubateRuntimeBuilder {
    pub fn new(config: IncubateConfig) -> Self {
        Self {
            config,
            tagger: None,
        }
    }

    /// Swap the sentiment tagger behind the analyzer.
    pub fn with_tagger(mut self, tagger: Box<dyn SentimentTagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    /// Opens the journal; failure here is fatal for the caller.
    pub fn build(self) -> Result<IncubateRuntime> {
        let config = self.config;

        let store = JournalStore::open(
            &config.database_path,
            &config.user_id,
            config.store_queue_capacity,
        )
        .with_context(|| format!("Failed to open journal at {}", config.database_path))?;

        let tagger = self
            .tagger
            .unwrap_or_else(|| Box::new(LexiconTagger::new()) as Box<dyn SentimentTagger>);
        let analyzer = Arc::new(SentimentAnalyzer::new(tagger));
        let insights = Arc::new(InsightService::new(store.clone(), &config));

        tracing::info!(
            "Journal ready at {} (user {}, queue capacity {})",
            config.database_path,
            config.user_id,
            config.store_queue_capacity
        );

        Ok(IncubateRuntime {
            config,
            store,
            analyzer,
            insights,
        })
    }
}

impl IncubateRuntime {
    pub fn bootstrap(config: IncubateConfig) -> Result<Self> {
        IncubateRuntimeBuilder::new(config).build()
    }

    pub fn new_session(&self, date: NaiveDate) -> ReflectionSession {
        ReflectionSession::new(date, self.analyzer.clone())
    }

    pub fn app_lock(&self) -> AppLock {
        AppLock::new(self.store.clone())
    }

    /// Seeded from config when `rng_seed` is set, otherwise from entropy.
    pub fn rng(&self) -> StdRng {
        match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
