//! Concurrent fan-out over every registered scraper.
//!
//! All scrapers run at once against the same `SearchParams` and are joined
//! with settle-all semantics: one source timing out or failing never cancels
//! or delays the others beyond its own timeout. Failures are logged with
//! their reason and contribute no listings.

use crate::config::ScoutConfig;
use crate::error::{Result, ScrapeError};
use crate::models::{Listing, Source};
use crate::scrapers::{ScraperTrait, SearchParams};
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How one scraper's run ended
#[derive(Debug)]
pub struct SourceReport {
    pub source: Source,
    pub elapsed: Duration,
    pub outcome: Result<Vec<Listing>>,
}

impl SourceReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }

    /// Listings on success, nothing on failure
    pub fn into_listings(self) -> Vec<Listing> {
        self.outcome.unwrap_or_default()
    }
}

/// Run one scraper under its own timeout and log how it ended
pub async fn settle<S>(scraper: &S, params: &SearchParams) -> SourceReport
where
    S: ScraperTrait + ?Sized,
{
    let source = scraper.source();
    let timeout = scraper.timeout();
    let started = Instant::now();

    let outcome = match tokio::time::timeout(timeout, scraper.scrape(params)).await {
        Ok(result) => result,
        Err(_) => Err(ScrapeError::Timeout { after: timeout }),
    };
    let elapsed = started.elapsed();

    match &outcome {
        Ok(listings) => info!(
            source = %source,
            count = listings.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Source finished"
        ),
        Err(e) => warn!(
            source = %source,
            kind = e.kind().as_str(),
            error = %e,
            elapsed_ms = elapsed.as_millis() as u64,
            "Source failed, contributing no listings"
        ),
    }

    SourceReport {
        source,
        elapsed,
        outcome,
    }
}

/// Holds the registered scrapers, in registration order
#[derive(Default)]
pub struct Aggregator {
    scrapers: Vec<Arc<dyn ScraperTrait>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregator over the scrapers enabled in `config`
    pub fn from_config(config: &ScoutConfig) -> Result<Self> {
        Ok(Self {
            scrapers: config.build_scrapers()?,
        })
    }

    pub fn register(&mut self, scraper: Arc<dyn ScraperTrait>) {
        self.scrapers.push(scraper);
    }

    #[must_use]
    pub fn with_scraper(mut self, scraper: Arc<dyn ScraperTrait>) -> Self {
        self.register(scraper);
        self
    }

    pub fn sources(&self) -> Vec<Source> {
        self.scrapers.iter().map(|s| s.source()).collect()
    }

    pub fn len(&self) -> usize {
        self.scrapers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapers.is_empty()
    }

    /// Run every scraper concurrently and report each outcome, in
    /// registration order
    pub async fn run(&self, params: &SearchParams) -> Vec<SourceReport> {
        let runs = self
            .scrapers
            .iter()
            .map(|scraper| settle(scraper.as_ref(), params));
        join_all(runs).await
    }

    /// All listings from the sources that succeeded, flattened in
    /// registration order with each source's own order kept
    pub async fn aggregate(&self, params: &SearchParams) -> Vec<Listing> {
        info!(
            "Scraping valuations for {} {} {} with {} miles",
            params.make, params.model, params.year, params.mileage
        );

        let reports = self.run(params).await;
        let failed = reports.iter().filter(|r| !r.succeeded()).count();
        let listings: Vec<Listing> = reports
            .into_iter()
            .flat_map(SourceReport::into_listings)
            .collect();

        info!(
            sources = self.scrapers.len(),
            failed,
            "Total listings scraped: {}",
            listings.len()
        );
        listings
    }
}
