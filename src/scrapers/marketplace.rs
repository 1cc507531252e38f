use crate::error::Result;
use crate::models::{Listing, Source};
use crate::scrapers::fetcher::{PageFetcher, PageRequest};
use crate::scrapers::parser::ListingParser;
use crate::scrapers::profile::{PriceBand, SourceProfile};
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::SearchParams;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Scraper for one marketplace: a profile, a way to get the page, and the
/// parser built from the profile
pub struct MarketplaceScraper {
    parser: ListingParser,
    fetcher: Arc<dyn PageFetcher>,
}

impl MarketplaceScraper {
    pub fn new(profile: SourceProfile, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        Ok(Self {
            parser: ListingParser::new(profile)?,
            fetcher,
        })
    }

    pub fn profile(&self) -> &SourceProfile {
        self.parser.profile()
    }
}

#[async_trait]
impl ScraperTrait for MarketplaceScraper {
    async fn scrape(&self, params: &SearchParams) -> Result<Vec<Listing>> {
        let profile = self.profile();
        let search_url = Url::parse(&profile.search_url(params))?;

        info!(
            source = %profile.source,
            strategy = self.fetcher.strategy(),
            "Scraping {}", search_url
        );

        let request = PageRequest {
            url: search_url.to_string(),
            timeout: profile.timeout,
            referer: profile.referer.clone(),
            ready_selector: profile.ready_selector.clone(),
        };
        let html = self.fetcher.fetch_page(&request).await?;

        let listings = self.parser.parse(&html, params, &search_url);
        info!("{}: Found {} listings", profile.source, listings.len());
        Ok(listings)
    }

    fn source(&self) -> Source {
        self.profile().source
    }

    fn timeout(&self) -> Duration {
        self.profile().timeout
    }

    fn price_band(&self) -> PriceBand {
        self.profile().price_band
    }
}
