use crate::aggregator::settle;
use crate::error::Result;
use crate::models::{Listing, Source};
use crate::scrapers::profile::PriceBand;
use crate::scrapers::types::SearchParams;
use async_trait::async_trait;
use std::time::Duration;

/// Common trait for all listing sources.
/// New marketplaces only need a type implementing this to be aggregated.
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Scrape listings for `params`, reporting why if it fails
    async fn scrape(&self, params: &SearchParams) -> Result<Vec<Listing>>;

    /// Marketplace this scraper reads
    fn source(&self) -> Source;

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str {
        self.source().as_str()
    }

    /// Upper bound on one scrape, fetch and parse included
    fn timeout(&self) -> Duration;

    fn price_band(&self) -> PriceBand;

    /// Listings or nothing. Failures and timeouts are logged, never returned.
    async fn fetch(&self, params: &SearchParams) -> Vec<Listing> {
        settle(self, params).await.into_listings()
    }
}
