// src/ingest/mod.rs
//! Headline Source: runs every provider once, cleans titles and falls back to
//! a fixed sample set when nothing usable comes back.

pub mod providers;
pub mod types;

use crate::config::MoodConfig;
use crate::ingest::providers::html_page::HtmlPageProvider;
use crate::ingest::types::{Headline, HeadlineProvider};
use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;
use std::time::Duration;
use url::Url;

/// Titles must be strictly longer than this (in chars) to be kept.
pub const MIN_TITLE_LEN: usize = 10;
pub const MAX_TITLE_LEN: usize = 200;

pub const SAMPLE_SOURCE: &str = "Sample";

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_headlines_total",
            "Headlines kept from providers after cleaning."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors."
        );
        describe_counter!(
            "ingest_fallback_total",
            "Collection cycles that fell back to sample headlines."
        );
        describe_histogram!("ingest_fetch_ms", "Provider fetch time in milliseconds.");
    });
}

/// Clean a scraped title: decode entities, drop chars outside the safe set,
/// collapse whitespace, cap at 200 chars.
pub fn clean_headline(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s);

    static RE_UNSAFE: OnceCell<regex::Regex> = OnceCell::new();
    let re_unsafe =
        RE_UNSAFE.get_or_init(|| regex::Regex::new(r"[^\w\s\-.,!?%$]").unwrap());
    let out = re_unsafe.replace_all(&decoded, "");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    let out = re_ws.replace_all(&out, " ");

    out.trim().chars().take(MAX_TITLE_LEN).collect()
}

pub fn is_usable_title(title: &str) -> bool {
    title.chars().count() > MIN_TITLE_LEN
}

/// Resolve a link against its page. Empty hrefs yield `None`; anything
/// already starting with `http` is kept as-is.
pub fn absolutize_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    if href.starts_with("http") {
        return Some(href.to_string());
    }
    base.join(href).ok().map(String::from)
}

/// Fixed fallback set used when every provider fails or returns nothing.
pub fn sample_headlines() -> Vec<Headline> {
    [
        "Sensex rises 200 points on strong quarterly earnings",
        "Nifty touches new all-time high amid positive sentiment",
        "Banking stocks fall on RBI policy concerns",
    ]
    .into_iter()
    .map(|t| Headline::new(t, None, SAMPLE_SOURCE))
    .collect()
}

pub struct HeadlineSource {
    providers: Vec<Box<dyn HeadlineProvider>>,
    per_provider_limit: usize,
    max_headlines: usize,
}

impl HeadlineSource {
    pub fn new(
        providers: Vec<Box<dyn HeadlineProvider>>,
        per_provider_limit: usize,
        max_headlines: usize,
    ) -> Self {
        Self {
            providers,
            per_provider_limit,
            max_headlines,
        }
    }

    /// Build HTML providers for every configured page, sharing one HTTP client
    /// with the configured timeout and user agent.
    pub fn from_config(cfg: &MoodConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("building headline http client")?;

        let mut providers: Vec<Box<dyn HeadlineProvider>> = Vec::with_capacity(cfg.sources.len());
        for src in &cfg.sources {
            let p = HtmlPageProvider::new(
                &src.name,
                &src.url,
                &src.selector,
                cfg.per_provider_limit,
                client.clone(),
            )
            .with_context(|| format!("configuring provider {}", src.name))?;
            providers.push(Box::new(p));
        }

        Ok(Self::new(
            providers,
            cfg.per_provider_limit,
            cfg.max_headlines,
        ))
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Collect from every provider in order. A failing provider is logged and
    /// skipped. Never returns an empty list.
    pub async fn fetch_raw_headlines(&self) -> Vec<Headline> {
        ensure_metrics_described();

        let mut all = Vec::new();
        for p in &self.providers {
            tracing::info!(target: "ingest", provider = p.name(), "scraping provider");
            let t0 = std::time::Instant::now();
            match p.fetch_headlines().await {
                Ok(v) => {
                    let kept: Vec<Headline> = v
                        .into_iter()
                        .filter(|h| is_usable_title(&h.title))
                        .take(self.per_provider_limit)
                        .collect();
                    tracing::info!(
                        target: "ingest",
                        provider = p.name(),
                        count = kept.len(),
                        "provider headlines"
                    );
                    counter!("ingest_headlines_total").increment(kept.len() as u64);
                    all.extend(kept);
                }
                Err(e) => {
                    tracing::warn!(target: "ingest", error = ?e, provider = p.name(), "provider error");
                    counter!("ingest_provider_errors_total").increment(1);
                }
            }
            histogram!("ingest_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        }

        if all.is_empty() {
            tracing::warn!(target: "ingest", "no provider headlines; using samples");
            counter!("ingest_fallback_total").increment(1);
            all = sample_headlines();
        }

        all.truncate(self.max_headlines);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[test]
    fn clean_headline_strips_unsafe_chars_and_collapses_ws() {
        let s = "  Sensex\n\t gains 2%  — “record” close &amp; more!  ";
        assert_eq!(clean_headline(s), "Sensex gains 2% record close more!");
    }

    #[test]
    fn clean_headline_keeps_safe_punctuation_and_caps_length() {
        assert_eq!(clean_headline("Q3: $5bn, up 4.5%?"), "Q3 $5bn, up 4.5%?");
        let long = "a".repeat(300);
        assert_eq!(clean_headline(&long).chars().count(), MAX_TITLE_LEN);
    }

    #[test]
    fn short_titles_are_unusable() {
        assert!(!is_usable_title("Ten chars!"));
        assert!(is_usable_title("Eleven char"));
    }

    #[test]
    fn absolutize_handles_relative_and_absolute() {
        let base = Url::parse("https://www.moneycontrol.com/news/business/markets/").unwrap();
        assert_eq!(
            absolutize_url(&base, "/news/a.html").as_deref(),
            Some("https://www.moneycontrol.com/news/a.html")
        );
        assert_eq!(
            absolutize_url(&base, "b.html").as_deref(),
            Some("https://www.moneycontrol.com/news/business/markets/b.html")
        );
        assert_eq!(
            absolutize_url(&base, "https://x.test/y").as_deref(),
            Some("https://x.test/y")
        );
        assert_eq!(absolutize_url(&base, "  "), None);
    }

    struct Fixed(&'static str, usize);

    #[async_trait]
    impl HeadlineProvider for Fixed {
        async fn fetch_headlines(&self) -> Result<Vec<Headline>> {
            Ok((0..self.1)
                .map(|i| Headline::new(format!("{} headline number {i}", self.0), None, self.0))
                .collect())
        }
        fn name(&self) -> &str {
            self.0
        }
    }

    struct Broken;

    #[async_trait]
    impl HeadlineProvider for Broken {
        async fn fetch_headlines(&self) -> Result<Vec<Headline>> {
            anyhow::bail!("connection refused")
        }
        fn name(&self) -> &str {
            "Broken"
        }
    }

    #[tokio::test]
    async fn caps_per_provider_and_total() {
        let src = HeadlineSource::new(
            vec![
                Box::new(Fixed("A", 10)),
                Box::new(Broken),
                Box::new(Fixed("B", 10)),
            ],
            8,
            15,
        );
        let out = src.fetch_raw_headlines().await;
        assert_eq!(out.len(), 15);
        assert_eq!(out.iter().filter(|h| h.source == "A").count(), 8);
        assert_eq!(out.iter().filter(|h| h.source == "B").count(), 7);
    }

    #[tokio::test]
    async fn all_failing_falls_back_to_samples() {
        let src = HeadlineSource::new(vec![Box::new(Broken), Box::new(Fixed("Empty", 0))], 8, 15);
        let out = src.fetch_raw_headlines().await;
        assert_eq!(out, sample_headlines());
        assert!(out.iter().all(|h| h.source == SAMPLE_SOURCE && h.url.is_none()));
    }
}
