//! Release pipeline orchestration
//!
//! Sequences one request end to end:
//! - Collecting unique films from the requested source
//! - Resolving every film through the bounded executor
//! - Sorting the finished rows
//!
//! Only failing to read the first document of the source (or an invalid
//! request) fails the whole run. Everything else is recorded on the affected
//! row and the run continues.

use crate::catalogue::{extract_release_dates, CatalogueClient};
use crate::config::{Config, PipelineConfig};
use crate::error_chain;
use crate::fetch::{FetchOptions, Fetcher};
use crate::pipeline::executor::run_with_concurrency;
use crate::pipeline::sort::sort_results;
use crate::pipeline::stage::{PipelineStage, StageTracker};
use crate::pipeline::types::{
    FilmResult, ReleaseRequest, ReleaseResponse, SourceSpec, ValidatedRequest,
};
use crate::scrape::parse_detail_page;
use crate::source::{FilmSource, ListingSource, SourceEntry, SpreadsheetSource};
use std::time::Duration;

/// Turns release requests into sorted release-date tables
///
/// Built once at startup from the configuration and shared by every request.
#[derive(Debug, Clone)]
pub struct ReleasePipeline {
    fetcher: Fetcher,
    listing_base_url: String,
    catalogue: Option<CatalogueClient>,
    settings: PipelineConfig,
}

impl ReleasePipeline {
    /// Builds the pipeline and its clients from the configuration
    ///
    /// Without a catalogue token the pipeline still runs, but every row
    /// records that release dates were skipped.
    pub fn new(config: &Config) -> crate::Result<Self> {
        let fetcher = Fetcher::from_config(&config.fetcher)?;
        let catalogue = CatalogueClient::from_config(fetcher.clone(), &config.catalogue);
        if catalogue.is_none() {
            tracing::warn!("No catalogue token configured; release dates will be skipped");
        }

        Ok(Self::from_parts(
            fetcher,
            &config.listing.base_url,
            catalogue,
            config.pipeline.clone(),
        ))
    }

    pub fn from_parts(
        fetcher: Fetcher,
        listing_base_url: &str,
        catalogue: Option<CatalogueClient>,
        settings: PipelineConfig,
    ) -> Self {
        Self {
            fetcher,
            listing_base_url: listing_base_url.trim_end_matches('/').to_string(),
            catalogue,
            settings,
        }
    }

    /// Detail page URL of a film identifier
    ///
    /// Absolute URLs are used unchanged; anything else is treated as a slug.
    pub fn detail_url(&self, query: &str) -> String {
        let query = query.trim();
        if query.starts_with("http://") || query.starts_with("https://") {
            query.to_string()
        } else {
            format!(
                "{}/film/{}/",
                self.listing_base_url,
                query.trim_matches('/')
            )
        }
    }

    /// Runs a request and wraps the outcome in a response
    pub async fn handle(&self, request: &ReleaseRequest) -> ReleaseResponse {
        match self.run(request).await {
            Ok(results) => ReleaseResponse::success(results),
            Err(e) => {
                tracing::error!("Request failed: {}", error_chain(&e));
                ReleaseResponse::failure(&e)
            }
        }
    }

    /// Runs a request and returns the sorted rows
    pub async fn run(&self, request: &ReleaseRequest) -> crate::Result<Vec<FilmResult>> {
        let mut tracker = StageTracker::new();
        self.run_tracked(request, &mut tracker).await
    }

    /// Like `run`, recording every stage in `tracker`
    pub async fn run_tracked(
        &self,
        request: &ReleaseRequest,
        tracker: &mut StageTracker,
    ) -> crate::Result<Vec<FilmResult>> {
        let validated = request.validate()?;
        let source = self.source_for(&validated.source);
        tracing::info!(
            "Collecting films from {} (country {})",
            source.describe(),
            validated.country
        );

        let entries = match source.collect(tracker).await {
            Ok(entries) => entries,
            Err(e) => {
                tracker.fail();
                return Err(e);
            }
        };

        tracker.advance(PipelineStage::ResolvingItems)?;
        let mut results = self.resolve_all(entries, &validated).await;

        tracker.advance(PipelineStage::Sorting)?;
        sort_results(&mut results);

        tracker.advance(PipelineStage::Done)?;
        let with_errors = results.iter().filter(|r| !r.error.is_empty()).count();
        tracing::info!(
            "Resolved {} films ({} with errors)",
            results.len(),
            with_errors
        );

        Ok(results)
    }

    fn source_for(&self, spec: &SourceSpec) -> Box<dyn FilmSource> {
        match spec {
            SourceSpec::Listing {
                username,
                list_slug,
            } => Box::new(
                ListingSource::new(
                    self.fetcher.clone(),
                    &self.listing_base_url,
                    username,
                    list_slug,
                )
                .with_page_delay(
                    self.settings.page_delay_min_ms,
                    self.settings.page_delay_max_ms,
                )
                .with_max_pages(self.settings.max_pages),
            ),
            SourceSpec::Spreadsheet { url } => {
                Box::new(SpreadsheetSource::new(self.fetcher.clone(), url))
            }
        }
    }

    /// Resolves every entry under the concurrency limit
    ///
    /// The output has one row per entry, in entry order.
    async fn resolve_all(
        &self,
        entries: Vec<SourceEntry>,
        validated: &ValidatedRequest,
    ) -> Vec<FilmResult> {
        let country = validated.country.as_str();
        let allowed_types = validated.allowed_types.as_deref();
        let item_delay = Duration::from_millis(self.settings.item_delay_ms);
        let queries: Vec<String> = entries.iter().map(|e| e.query.clone()).collect();

        let outcomes = run_with_concurrency(
            entries,
            self.settings.concurrency,
            move |entry: SourceEntry| async move {
                let outcome = self
                    .resolve_entry(entry, country, allowed_types)
                    .await
                    .map_err(|e| error_chain(&e));
                if !item_delay.is_zero() {
                    tokio::time::sleep(item_delay).await;
                }
                outcome
            },
        )
        .await;

        outcomes
            .into_iter()
            .zip(queries)
            .map(|(outcome, query)| {
                outcome.unwrap_or_else(|failure| {
                    tracing::warn!("Film {} failed: {}", query, failure);
                    FilmResult::failed(query, format!("Film page lookup failed: {}", failure))
                })
            })
            .collect()
    }

    /// Builds the row of one film
    ///
    /// Returns an error only when the detail page cannot be fetched. Missing
    /// identifiers, a missing token and catalogue failures are recorded on
    /// the row instead.
    async fn resolve_entry(
        &self,
        entry: SourceEntry,
        country: &str,
        allowed_types: Option<&[u32]>,
    ) -> crate::Result<FilmResult> {
        let mut result = FilmResult::new(entry.query.as_str());
        result.film_name = entry.known_name.clone();

        let catalogue_id = match entry.known_catalogue_id {
            Some(id) => {
                if result.film_name.is_none() {
                    result.film_name = Some(entry.query.clone());
                }
                Some(id)
            }
            None => {
                let url = self.detail_url(&entry.query);
                let page = self.fetcher.fetch(&url, &FetchOptions::default()).await?;
                let details = parse_detail_page(&page.body);
                result.film_name = result.film_name.take().or(details.title);
                details.catalogue_id
            }
        };
        result.tmdb_id = catalogue_id;

        let Some(catalogue_id) = catalogue_id else {
            tracing::debug!("No catalogue id for {}", entry.query);
            result.push_error("No TMDB id found on the film page");
            return Ok(result);
        };

        let Some(catalogue) = &self.catalogue else {
            result.push_error("TMDB token not configured; release dates skipped");
            return Ok(result);
        };

        match catalogue.fetch_release_dates(catalogue_id).await {
            Ok(response) => {
                let summary = extract_release_dates(&response, country, allowed_types);
                result.apply_summary(&summary);
                if summary.country.is_none() {
                    result.push_error(format!("No release date found for {}", country));
                }
                if summary.digital.is_none() {
                    result.push_error("No digital release date found");
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Release dates for {} (id {}) unavailable: {}",
                    entry.query,
                    catalogue_id,
                    e
                );
                result.push_error(format!("TMDB lookup failed: {}", error_chain(&e)));
            }
        }

        tracing::debug!(
            "Resolved {}: country {:?}, digital {:?}",
            entry.query,
            result.country_release,
            result.digital_release
        );
        Ok(result)
    }
}
