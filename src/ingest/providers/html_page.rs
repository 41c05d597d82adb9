// src/ingest/providers/html_page.rs
//! Provider that scrapes headline links from a market news page via a CSS selector.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

use crate::ingest::types::{Headline, HeadlineProvider};
use crate::ingest::{absolutize_url, clean_headline, is_usable_title};

pub struct HtmlPageProvider {
    name: String,
    page_url: Url,
    selector: Selector,
    limit: usize,
    client: reqwest::Client,
}

impl HtmlPageProvider {
    pub fn new(
        name: &str,
        page_url: &str,
        selector: &str,
        limit: usize,
        client: reqwest::Client,
    ) -> Result<Self> {
        let page_url = Url::parse(page_url).with_context(|| format!("parsing page url {page_url}"))?;
        let selector =
            Selector::parse(selector).map_err(|e| anyhow!("invalid selector {selector:?}: {e}"))?;
        Ok(Self {
            name: name.to_string(),
            page_url,
            selector,
            limit,
            client,
        })
    }

    /// Extract headlines from a page body. Only the first `limit` matched
    /// elements are considered; titles that are too short after cleaning are
    /// dropped.
    pub fn parse_page(&self, html: &str) -> Vec<Headline> {
        let document = Html::parse_document(html);
        let mut out = Vec::new();

        for element in document.select(&self.selector).take(self.limit) {
            let raw = element.text().collect::<Vec<_>>().join(" ");
            let title = clean_headline(&raw);
            if !is_usable_title(&title) {
                continue;
            }
            let url = element
                .value()
                .attr("href")
                .and_then(|href| absolutize_url(&self.page_url, href));
            out.push(Headline {
                title,
                url,
                source: self.name.clone(),
            });
        }
        out
    }
}

#[async_trait]
impl HeadlineProvider for HtmlPageProvider {
    async fn fetch_headlines(&self) -> Result<Vec<Headline>> {
        let body = self
            .client
            .get(self.page_url.clone())
            .send()
            .await
            .with_context(|| format!("{} http get()", self.name))?
            .error_for_status()
            .with_context(|| format!("{} http status", self.name))?
            .text()
            .await
            .with_context(|| format!("{} http .text()", self.name))?;

        Ok(self.parse_page(&body))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
