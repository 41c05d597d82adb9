//! Headline table: one row per scored headline, auto-incrementing id,
//! creation timestamp. Two backends: in-memory and a JSON document on disk.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::sentiment::ScoredHeadline;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredHeadline {
    pub id: u64,
    #[serde(flatten)]
    pub headline: ScoredHeadline,
    pub timestamp: DateTime<Utc>,
}

#[async_trait]
pub trait HeadlineStore: Send + Sync {
    /// Append every row of `batch` with the same `timestamp`.
    async fn insert_batch(&self, batch: &[ScoredHeadline], timestamp: DateTime<Utc>)
        -> Result<()>;
    /// Delete rows with `timestamp < cutoff`; returns how many went.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize>;
    /// Rows with `timestamp > cutoff`, in insertion order.
    async fn rows_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<StoredHeadline>>;
    async fn all_rows(&self) -> Result<Vec<StoredHeadline>>;
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct Table {
    next_id: u64,
    rows: Vec<StoredHeadline>,
}

impl Table {
    fn insert(&mut self, batch: &[ScoredHeadline], timestamp: DateTime<Utc>) {
        for h in batch {
            self.next_id += 1;
            self.rows.push(StoredHeadline {
                id: self.next_id,
                headline: h.clone(),
                timestamp,
            });
        }
    }

    fn delete_older_than(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| r.timestamp >= cutoff);
        before - self.rows.len()
    }

    fn rows_since(&self, cutoff: DateTime<Utc>) -> Vec<StoredHeadline> {
        self.rows
            .iter()
            .filter(|r| r.timestamp > cutoff)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HeadlineStore for MemoryStore {
    async fn insert_batch(
        &self,
        batch: &[ScoredHeadline],
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        self.inner
            .lock()
            .expect("headline store mutex poisoned")
            .insert(batch, timestamp);
        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        Ok(self
            .inner
            .lock()
            .expect("headline store mutex poisoned")
            .delete_older_than(cutoff))
    }

    async fn rows_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<StoredHeadline>> {
        Ok(self
            .inner
            .lock()
            .expect("headline store mutex poisoned")
            .rows_since(cutoff))
    }

    async fn all_rows(&self) -> Result<Vec<StoredHeadline>> {
        Ok(self
            .inner
            .lock()
            .expect("headline store mutex poisoned")
            .rows
            .clone())
    }
}

/// Whole table kept as one JSON document. Writes go to a temp file and are
/// renamed into place; the file is created on first write.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Sibling temp file: `<file name>.tmp`, never the store path itself.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn load(&self) -> Result<Table> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(s) => serde_json::from_str(&s)
                .with_context(|| format!("parsing headline store {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Table::default()),
            Err(e) => Err(e)
                .with_context(|| format!("reading headline store {}", self.path.display())),
        }
    }

    async fn save(&self, table: &Table) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let body = serde_json::to_vec_pretty(table).context("serializing headline store")?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl HeadlineStore for JsonFileStore {
    async fn insert_batch(
        &self,
        batch: &[ScoredHeadline],
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let _g = self.lock.lock().await;
        let mut table = self.load().await?;
        table.insert(batch, timestamp);
        self.save(&table).await
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<usize> {
        let _g = self.lock.lock().await;
        let mut table = self.load().await?;
        let n = table.delete_older_than(cutoff);
        if n > 0 {
            self.save(&table).await?;
        }
        Ok(n)
    }

    async fn rows_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<StoredHeadline>> {
        let _g = self.lock.lock().await;
        Ok(self.load().await?.rows_since(cutoff))
    }

    async fn all_rows(&self) -> Result<Vec<StoredHeadline>> {
        let _g = self.lock.lock().await;
        Ok(self.load().await?.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::SentimentLabel;
    use chrono::TimeZone;

    fn h(title: &str) -> ScoredHeadline {
        ScoredHeadline {
            title: title.into(),
            url: Some(format!("https://x.test/{title}")),
            source: "Test".into(),
            sentiment_score: 0.25,
            sentiment_label: SentimentLabel::Bullish,
        }
    }

    fn t(min: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap() + chrono::TimeDelta::minutes(min)
    }

    async fn exercise(store: &dyn HeadlineStore) {
        store.insert_batch(&[h("a"), h("b")], t(0)).await.unwrap();
        store.insert_batch(&[h("c")], t(10)).await.unwrap();

        let all = store.all_rows().await.unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        // strictly newer than cutoff
        let since = store.rows_since(t(0)).await.unwrap();
        assert_eq!(since.len(), 1);
        assert_eq!(since[0].headline.title, "c");

        // strictly older than cutoff
        assert_eq!(store.delete_older_than(t(0)).await.unwrap(), 0);
        assert_eq!(store.delete_older_than(t(5)).await.unwrap(), 2);

        store.insert_batch(&[h("d")], t(20)).await.unwrap();
        let ids: Vec<u64> = store.all_rows().await.unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 4]); // ids never reused
    }

    #[tokio::test]
    async fn memory_store_semantics() {
        exercise(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn json_file_store_semantics_and_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("headlines.json");
        let store = JsonFileStore::new(&path);
        assert!(store.all_rows().await.unwrap().is_empty());

        exercise(&store).await;
        assert!(path.exists());

        let reopened = JsonFileStore::new(&path);
        let rows = reopened.all_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].headline, h("d"));
        assert_eq!(rows[1].timestamp, t(20));
    }

    #[tokio::test]
    async fn json_file_store_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headlines.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = JsonFileStore::new(&path).all_rows().await.unwrap_err();
        assert!(format!("{err:#}").contains("parsing headline store"));
    }

    #[test]
    fn temp_file_is_appended_to_file_name() {
        let store = JsonFileStore::new("data/headlines.json");
        assert_eq!(store.tmp_path(), PathBuf::from("data/headlines.json.tmp"));

        let store = JsonFileStore::new("data/headlines.tmp");
        assert_eq!(store.tmp_path(), PathBuf::from("data/headlines.tmp.tmp"));
    }

    #[tokio::test]
    async fn json_file_store_with_tmp_extension_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headlines.tmp");
        let store = JsonFileStore::new(&path);
        store.insert_batch(&[h("a")], t(0)).await.unwrap();
        store.insert_batch(&[h("b")], t(1)).await.unwrap();

        let rows = JsonFileStore::new(&path).all_rows().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!dir.path().join("headlines.tmp.tmp").exists());
    }
}
