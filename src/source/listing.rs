//! Paginated list scraping

use crate::fetch::{FetchOptions, Fetcher};
use crate::pipeline::{PipelineStage, StageTracker};
use crate::scrape::{extract_identifiers, extract_page_count};
use crate::source::{merge_unique, FilmSource, SourceEntry};
use crate::ReelError;
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;

/// Films of a public list, identified by owner and list slug
#[derive(Debug, Clone)]
pub struct ListingSource {
    fetcher: Fetcher,
    base_url: String,
    username: String,
    list_slug: String,
    page_delay_ms: (u64, u64),
    max_pages: u32,
}

impl ListingSource {
    pub fn new(fetcher: Fetcher, base_url: &str, username: &str, list_slug: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            list_slug: list_slug.to_string(),
            page_delay_ms: (0, 0),
            max_pages: u32::MAX,
        }
    }

    /// Caps how many pages are walked, whatever the pagination says
    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    /// Randomized pause between sequential page fetches
    pub fn with_page_delay(mut self, min_ms: u64, max_ms: u64) -> Self {
        self.page_delay_ms = (min_ms.min(max_ms), max_ms.max(min_ms));
        self
    }

    /// URL of a 1-based page of the list
    pub fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            format!("{}/{}/list/{}/", self.base_url, self.username, self.list_slug)
        } else {
            format!(
                "{}/{}/list/{}/page/{}/",
                self.base_url, self.username, self.list_slug, page
            )
        }
    }

    async fn polite_pause(&self) {
        let (min, max) = self.page_delay_ms;
        if max == 0 {
            return;
        }
        let millis = rand::thread_rng().gen_range(min..=max);
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

#[async_trait]
impl FilmSource for ListingSource {
    fn describe(&self) -> String {
        format!("list {}/{}", self.username, self.list_slug)
    }

    async fn collect(&self, tracker: &mut StageTracker) -> Result<Vec<SourceEntry>, ReelError> {
        let options = FetchOptions::default();
        let first_url = self.page_url(1);

        let first = self
            .fetcher
            .fetch(&first_url, &options)
            .await
            .map_err(|source| ReelError::FirstPage {
                url: first_url.clone(),
                source,
            })?;

        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        merge_unique(
            &mut entries,
            &mut seen,
            extract_identifiers(&first.body)
                .into_iter()
                .map(SourceEntry::new),
        );

        tracker.advance(PipelineStage::CountingPages)?;
        let advertised = extract_page_count(&first.body);
        let pages = advertised.min(self.max_pages);
        if pages < advertised {
            tracing::warn!(
                "{} claims {} pages; only the first {} will be fetched",
                self.describe(),
                advertised,
                pages
            );
        }
        tracing::info!(
            "{} has {} page(s), {} films on page 1",
            self.describe(),
            pages,
            entries.len()
        );

        tracker.advance(PipelineStage::FetchingRemainingPages)?;
        for page in 2..=pages {
            self.polite_pause().await;

            let url = self.page_url(page);
            match self.fetcher.fetch(&url, &options).await {
                Ok(fetched) => {
                    let added = merge_unique(
                        &mut entries,
                        &mut seen,
                        extract_identifiers(&fetched.body)
                            .into_iter()
                            .map(SourceEntry::new),
                    );
                    tracing::debug!("Page {}/{}: {} new films", page, pages, added);
                }
                Err(e) => {
                    tracing::warn!("Skipping page {}/{} of {}: {}", page, pages, self.describe(), e);
                }
            }
        }

        tracing::info!("Collected {} unique films from {}", entries.len(), self.describe());
        Ok(entries)
    }
}
