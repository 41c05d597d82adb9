//! # Mood Engine
//! Cache check → (on miss: collect, score, commit) → aggregate.
//!
//! The miss path runs under an async mutex and re-checks the cache once the
//! lock is held, so concurrent misses in one process collect only once. The
//! hit path never takes the lock.

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Clock, FreshnessCache, HeadlineStore, JsonFileStore, MemoryStore, SystemClock};
use crate::config::MoodConfig;
use crate::ingest::HeadlineSource;
use crate::mood::{self, MoodResult};
use crate::sentiment::{ScoredHeadline, SentimentScorer};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("mood_cache_hits_total", "Reads served from the cached batch.");
        describe_counter!(
            "mood_cache_misses_total",
            "Reads that triggered a collection cycle."
        );
        describe_counter!(
            "mood_cache_evicted_total",
            "Stored rows deleted by the eviction window."
        );
        describe_gauge!("mood_score", "Most recently served mood score.");
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Collected {
    pub headlines: Vec<ScoredHeadline>,
    pub cache: CacheStatus,
}

#[derive(Debug, Clone)]
pub struct MoodReport {
    pub headlines: Vec<ScoredHeadline>,
    pub mood: MoodResult,
    pub cache: CacheStatus,
}

pub struct MoodEngine {
    cache: FreshnessCache,
    source: HeadlineSource,
    scorer: SentimentScorer,
    refresh: tokio::sync::Mutex<()>,
}

impl MoodEngine {
    pub fn new(cache: FreshnessCache, source: HeadlineSource, scorer: SentimentScorer) -> Self {
        Self {
            cache,
            source,
            scorer,
            refresh: tokio::sync::Mutex::new(()),
        }
    }

    /// Production wiring: HTML providers, system clock, memory or JSON store.
    pub fn from_config(cfg: &MoodConfig) -> Result<Self> {
        let store: Arc<dyn HeadlineStore> = match &cfg.store_path {
            Some(p) => Arc::new(JsonFileStore::new(p)),
            None => Arc::new(MemoryStore::new()),
        };
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = FreshnessCache::new(
            store,
            clock,
            Duration::from_secs(cfg.validity_window_secs),
            Duration::from_secs(cfg.eviction_window_secs),
        );
        let source = HeadlineSource::from_config(cfg).context("building headline source")?;
        tracing::info!(
            providers = source.provider_count(),
            validity_secs = cfg.validity_window_secs,
            persisted = cfg.store_path.is_some(),
            "mood engine ready"
        );
        Ok(Self::new(cache, source, SentimentScorer::new()))
    }

    /// Return the current batch, collecting and scoring a fresh one on a miss.
    pub async fn fetch_and_analyze(&self) -> Result<Collected> {
        ensure_metrics_described();

        if let Some(headlines) = self.cache.get_current_batch().await? {
            return Ok(self.hit(headlines));
        }

        let _guard = self.refresh.lock().await;
        // another request may have refreshed while we waited
        if let Some(headlines) = self.cache.get_current_batch().await? {
            return Ok(self.hit(headlines));
        }

        tracing::info!(target: "cache", "cache miss; fetching fresh headlines");
        counter!("mood_cache_misses_total").increment(1);

        let raw = self.source.fetch_raw_headlines().await;
        let scored: Vec<ScoredHeadline> = raw
            .into_iter()
            .map(|h| self.scorer.score_headline(h))
            .collect();

        self.cache
            .commit_batch(&scored)
            .await
            .context("committing scored batch")?;

        Ok(Collected {
            headlines: scored,
            cache: CacheStatus::Miss,
        })
    }

    /// `fetch_and_analyze` followed by aggregation.
    pub async fn current_mood(&self) -> Result<MoodReport> {
        let Collected { headlines, cache } = self.fetch_and_analyze().await?;
        let mood = mood::aggregate(&headlines);
        gauge!("mood_score").set(mood.mood_score);
        Ok(MoodReport {
            headlines,
            mood,
            cache,
        })
    }

    fn hit(&self, headlines: Vec<ScoredHeadline>) -> Collected {
        tracing::info!(target: "cache", count = headlines.len(), "using cached headlines");
        counter!("mood_cache_hits_total").increment(1);
        Collected {
            headlines,
            cache: CacheStatus::Hit,
        }
    }
}
