pub mod browser;
pub mod extract;
pub mod fetcher;
pub mod marketplace;
pub mod parser;
pub mod profile;
pub mod traits;
pub mod types;

pub use browser::BrowserFetcher;
pub use fetcher::{HttpFetcher, PageFetcher, PageRequest};
pub use marketplace::MarketplaceScraper;
pub use parser::ListingParser;
pub use profile::{PriceBand, SourceProfile};
pub use traits::ScraperTrait;
pub use types::SearchParams;
