// src/ingest/types.rs
use anyhow::Result;

/// Raw headline as produced by a provider, already cleaned.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct Headline {
    pub title: String,       // cleaned, 11..=200 chars
    pub url: Option<String>, // absolute when present
    pub source: String,      // e.g. "Economic Times", "Sample"
}

impl Headline {
    pub fn new(title: impl Into<String>, url: Option<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url,
            source: source.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait HeadlineProvider: Send + Sync {
    async fn fetch_headlines(&self) -> Result<Vec<Headline>>;
    fn name(&self) -> &str;
}
