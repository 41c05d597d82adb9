//! # Freshness Cache
//! Serves the most recent scored batch while it is younger than the validity
//! window; evicts rows older than the eviction window on every commit.
//!
//! Only one batch is ever "current": rows sharing the newest timestamp. Older
//! batches still inside the window are never mixed in.

pub mod clock;
pub mod store;

use anyhow::Result;
use chrono::{DateTime, TimeDelta, Utc};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{HeadlineStore, JsonFileStore, MemoryStore, StoredHeadline};

use crate::sentiment::ScoredHeadline;

pub struct FreshnessCache {
    store: Arc<dyn HeadlineStore>,
    clock: Arc<dyn Clock>,
    validity: TimeDelta,
    eviction: TimeDelta,
}

fn to_delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)
}

fn cutoff(now: DateTime<Utc>, window: TimeDelta) -> DateTime<Utc> {
    now.checked_sub_signed(window)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl FreshnessCache {
    pub fn new(
        store: Arc<dyn HeadlineStore>,
        clock: Arc<dyn Clock>,
        validity: Duration,
        eviction: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            validity: to_delta(validity),
            eviction: to_delta(eviction),
        }
    }

    /// 30 min validity, 1 h eviction.
    pub fn with_default_windows(store: Arc<dyn HeadlineStore>, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            store,
            clock,
            Duration::from_secs(30 * 60),
            Duration::from_secs(60 * 60),
        )
    }

    /// Newest batch if its timestamp is within the validity window.
    pub async fn get_current_batch(&self) -> Result<Option<Vec<ScoredHeadline>>> {
        let now = self.clock.now();
        let rows = self.store.rows_since(cutoff(now, self.validity)).await?;

        let Some(latest) = rows.iter().map(|r| r.timestamp).max() else {
            return Ok(None);
        };

        let mut current: Vec<StoredHeadline> =
            rows.into_iter().filter(|r| r.timestamp == latest).collect();
        current.sort_by_key(|r| r.id);

        Ok(Some(current.into_iter().map(|r| r.headline).collect()))
    }

    /// Evict stale rows, then store `batch` under one shared timestamp.
    /// Returns that timestamp.
    pub async fn commit_batch(&self, batch: &[ScoredHeadline]) -> Result<DateTime<Utc>> {
        let now = self.clock.now();

        let evicted = self
            .store
            .delete_older_than(cutoff(now, self.eviction))
            .await?;
        if evicted > 0 {
            counter!("mood_cache_evicted_total").increment(evicted as u64);
        }

        self.store.insert_batch(batch, now).await?;
        tracing::info!(
            target: "cache",
            inserted = batch.len(),
            evicted,
            "committed headline batch"
        );
        Ok(now)
    }
}
