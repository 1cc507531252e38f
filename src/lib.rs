//! Vehicle Scout - used-car valuation from live marketplace listings.
//!
//! Searches several UK marketplaces at once for vehicles like the one being
//! valued, extracts listings from their (unstable) results markup, and
//! reduces the combined listings to a low/average/high price range.
//!
//! Sources that are blocked, slow or redesigned simply contribute nothing;
//! a lookup always produces a result, possibly empty.
//!
//! ```rust,ignore
//! use vehicle_scout::{Aggregator, ScoutConfig, SearchParams, ValuationService};
//!
//! let service = ValuationService::new(Aggregator::from_config(&ScoutConfig::default())?);
//! let result = service.value(&SearchParams::new("Vauxhall", "Astra", 2019, 80_000)).await;
//! println!("{} listings, average £{}", result.listings.len(), result.summary.average);
//! ```

pub mod aggregator;
pub mod config;
pub mod error;
pub mod models;
pub mod scrapers;
pub mod summary;
pub mod valuation;

pub use aggregator::{Aggregator, SourceReport};
pub use config::{ScoutConfig, SourceSettings};
pub use error::{FailureKind, Result, ScrapeError};
pub use models::{AggregationResult, Listing, PriceSummary, SellerType, Source};
pub use scrapers::{ScraperTrait, SearchParams};
pub use summary::summarize;
pub use valuation::{ValuationReport, ValuationService};
