//! Per-source scraping configuration.
//!
//! Markup on the marketplaces is not stable, so every locator is an ordered
//! fallback chain kept here as data. Supporting a redesign or a new source
//! means adding selectors, not branches.

use crate::models::{SellerType, Source};
use crate::scrapers::types::SearchParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::form_urlencoded;

const PLACEHOLDER_BASE: &str = "https://via.placeholder.com/300x200";

/// Search field that can be joined into a free-text keyword query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryField {
    Make,
    Model,
    Year,
    Mileage,
}

impl QueryField {
    fn value(&self, params: &SearchParams) -> String {
        match self {
            QueryField::Make => params.make.clone(),
            QueryField::Model => params.model.clone(),
            QueryField::Year => params.year.to_string(),
            QueryField::Mileage => params.mileage.to_string(),
        }
    }
}

/// Plausible price range for a source. Anything outside is treated as a
/// parse artifact (finance banners, "£1 reserve" auctions, corrupted text).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBand {
    pub min: u32,
    pub max: u32,
}

impl PriceBand {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, price: u32) -> bool {
        price >= self.min && price <= self.max
    }
}

impl Default for PriceBand {
    fn default() -> Self {
        Self::new(500, 100_000)
    }
}

/// Ordered selector chains for one source's results page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorChains {
    /// One listing per match; the first selector with any match wins
    pub fragment: Vec<String>,
    pub link: Vec<String>,
    pub title: Vec<String>,
    pub price: Vec<String>,
    pub mileage: Vec<String>,
    pub location: Vec<String>,
    pub image: Vec<String>,
    pub seller: Vec<String>,
}

/// Everything a `MarketplaceScraper` needs to know about one source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceProfile {
    pub source: Source,
    /// Base for resolving relative links and images
    pub base_url: String,
    /// Search URL with `{make}`, `{model}`, `{year}`, `{mileage}` and
    /// `{keywords}` placeholders. Values are URL-encoded on substitution.
    pub search_template: String,
    /// Fields joined with spaces to fill `{keywords}`
    pub keywords: Vec<QueryField>,
    pub locators: LocatorChains,
    pub price_band: PriceBand,
    pub max_listings: usize,
    pub timeout: Duration,
    pub default_seller: SellerType,
    pub min_title_chars: usize,
    /// Lowercase markers for promotional items that are not listings
    pub non_listing_markers: Vec<String>,
    /// Use "{year} {make} {model}" when no title locator matches
    pub title_from_params: bool,
    /// Look for a "£" amount in the fragment text when the price chain misses
    pub price_from_text: bool,
    /// Read mileage from the fragment's non-location text when the mileage
    /// chain misses
    pub mileage_from_text: bool,
    /// Drop fragments with no link of their own instead of pointing them at
    /// the search page
    pub require_detail_link: bool,
    /// Image URLs containing any of these are ignored
    pub image_reject: Vec<String>,
    pub placeholder_image: String,
    pub referer: Option<String>,
    /// Selector a rendered page waits for before being captured
    pub ready_selector: Option<String>,
}

fn chain(selectors: &[&str]) -> Vec<String> {
    selectors.iter().map(|s| s.to_string()).collect()
}

fn placeholder(colour: &str, label: &str) -> String {
    format!("{PLACEHOLDER_BASE}/{colour}/ffffff?text={label}")
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

impl SourceProfile {
    /// Build the source-specific search URL for `params`
    pub fn search_url(&self, params: &SearchParams) -> String {
        let keywords = self
            .keywords
            .iter()
            .map(|field| field.value(params))
            .collect::<Vec<_>>()
            .join(" ");

        self.search_template
            .replace("{keywords}", &encode(&keywords))
            .replace("{make}", &encode(&params.make))
            .replace("{model}", &encode(&params.model))
            .replace("{year}", &params.year.to_string())
            .replace("{mileage}", &params.mileage.to_string())
    }

    /// AutoTrader UK. Dealer dominated, so listings default to Dealer.
    pub fn autotrader() -> Self {
        Self {
            source: Source::AutoTrader,
            base_url: "https://www.autotrader.co.uk".to_string(),
            search_template: "https://www.autotrader.co.uk/car-search?make={make}&model={model}&year-from={year}&postcode=SW1A1AA&radius=1500".to_string(),
            keywords: Vec::new(),
            locators: LocatorChains {
                fragment: chain(&[
                    r#"article[data-testid*="search-result"]"#,
                    r#"li[data-testid*="search-result"]"#,
                    r#"[data-testid*="advertCard"]"#,
                    "article",
                ]),
                link: chain(&[r#"a[href*="/car-details/"]"#, "a"]),
                title: chain(&["h3", "h2", r#"[data-testid*="title"]"#]),
                price: chain(&[
                    r#"[data-testid="search-listing-price"]"#,
                    r#"[data-testid*="price"]"#,
                    r#"[class*="price"]"#,
                ]),
                mileage: chain(&[r#"[data-testid*="mileage"]"#, "li"]),
                location: chain(&[r#"[data-testid*="location"]"#, r#"[class*="location"]"#]),
                image: chain(&["img"]),
                seller: chain(&[r#"[data-testid*="seller"]"#]),
            },
            price_band: PriceBand::default(),
            max_listings: 6,
            timeout: Duration::from_secs(10),
            default_seller: SellerType::Dealer,
            min_title_chars: 1,
            non_listing_markers: Vec::new(),
            title_from_params: true,
            price_from_text: false,
            mileage_from_text: false,
            require_detail_link: false,
            image_reject: Vec::new(),
            placeholder_image: placeholder("4CAF50", "AutoTrader"),
            referer: None,
            ready_selector: None,
        }
    }

    /// eBay Motors UK, cars category sorted by newly listed
    pub fn ebay_motors() -> Self {
        Self {
            source: Source::EbayMotors,
            base_url: "https://www.ebay.co.uk".to_string(),
            search_template: "https://www.ebay.co.uk/sch/Cars/9801/i.html?_nkw={keywords}&_sop=15".to_string(),
            keywords: vec![QueryField::Make, QueryField::Model, QueryField::Year],
            locators: LocatorChains {
                fragment: chain(&[".srp-results li.s-item", ".srp-results .s-item", "li.s-item", "li.s-card"]),
                link: chain(&[".s-item__link", ".s-card__link", "a"]),
                title: chain(&["h3.s-item__title", ".s-item__title", ".s-card__title", "h3"]),
                price: chain(&["span.s-item__price", ".s-item__price", ".s-card__price"]),
                mileage: chain(&[".s-item__subtitle", ".s-card__subtitle"]),
                location: chain(&[".s-item__location", ".s-item__itemLocation", ".s-card__location"]),
                image: chain(&[".s-item__image-img", "img"]),
                seller: chain(&[".s-item__subtitle", ".s-card__subtitle"]),
            },
            price_band: PriceBand::default(),
            max_listings: 5,
            timeout: Duration::from_secs(15),
            default_seller: SellerType::PrivateSeller,
            min_title_chars: 1,
            non_listing_markers: vec!["shop on ebay".to_string()],
            title_from_params: false,
            price_from_text: false,
            mileage_from_text: true,
            require_detail_link: false,
            image_reject: Vec::new(),
            placeholder_image: placeholder("2196F3", "eBay"),
            referer: None,
            ready_selector: None,
        }
    }

    /// Gumtree classifieds, fetched as plain HTML
    pub fn gumtree() -> Self {
        Self {
            source: Source::Gumtree,
            base_url: "https://www.gumtree.com".to_string(),
            search_template: "https://www.gumtree.com/search?search_category=cars&q={keywords}".to_string(),
            keywords: vec![QueryField::Make, QueryField::Model],
            locators: LocatorChains {
                fragment: chain(&["article.listing-maxi", ".listing-maxi", "li.listing-maxi", r#"[class*="listing"]"#]),
                link: chain(&[r#"a[href*="/p/"]"#, "a"]),
                title: chain(&["h2.listing-title", ".listing-title", "h2", r#"[class*="title"]"#]),
                price: chain(&[".listing-price", ".ad-price", r#"[class*="price"]"#]),
                mileage: chain(&[".listing-description", ".description", r#"[class*="attribute"]"#]),
                location: chain(&[".listing-location", ".location-name", r#"[class*="location"]"#]),
                image: chain(&["img"]),
                seller: chain(&[".listing-description", ".description"]),
            },
            price_band: PriceBand::default(),
            max_listings: 5,
            timeout: Duration::from_secs(15),
            default_seller: SellerType::PrivateSeller,
            min_title_chars: 5,
            non_listing_markers: Vec::new(),
            title_from_params: false,
            price_from_text: true,
            mileage_from_text: true,
            require_detail_link: false,
            image_reject: vec!["placeholder".to_string()],
            placeholder_image: placeholder("FF9800", "Gumtree"),
            referer: Some("https://www.gumtree.com/".to_string()),
            ready_selector: None,
        }
    }

    /// Gumtree through a rendered DOM snapshot, for when listings are filled
    /// in client-side
    pub fn gumtree_rendered() -> Self {
        let mut profile = Self::gumtree();
        profile.locators.fragment = chain(&["article", r#"[class*="listing"]"#]);
        profile.locators.link = chain(&[r#"a[href*="/p/"]"#]);
        profile.locators.title = chain(&["h3", "h2", r#"[class*="title"]"#]);
        profile.locators.price = chain(&[r#"[class*="price"]"#]);
        profile.locators.location = chain(&[r#"[class*="location"]"#]);
        profile.require_detail_link = true;
        profile.timeout = Duration::from_secs(30);
        profile.ready_selector = Some(r#"article, [class*="listing"]"#.to_string());
        profile
    }
}
