use serde::{Deserialize, Serialize};
use std::fmt;

/// Marketplace a listing was scraped from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Source {
    AutoTrader,
    #[serde(rename = "eBay Motors")]
    EbayMotors,
    Gumtree,
}

impl Source {
    /// Identity string used for tagging listings and in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::AutoTrader => "AutoTrader",
            Source::EbayMotors => "eBay Motors",
            Source::Gumtree => "Gumtree",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is selling the vehicle
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SellerType {
    #[default]
    Dealer,
    #[serde(rename = "Private Seller")]
    PrivateSeller,
}

impl fmt::Display for SellerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SellerType::Dealer => f.write_str("Dealer"),
            SellerType::PrivateSeller => f.write_str("Private Seller"),
        }
    }
}

/// One vehicle-for-sale record extracted from a search results page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub source: Source,
    /// At most 100 characters
    pub title: String,
    /// Whole pounds, always greater than zero
    pub price: u32,
    /// 0 means the mileage could not be recovered, not a zero-mile vehicle
    pub mileage: u32,
    /// At most 50 characters, "UK" when unknown
    pub location: String,
    pub image: String,
    /// Absolute URL
    pub link: String,
    pub seller: SellerType,
}

impl Listing {
    /// Mileage if the source actually stated one
    pub fn known_mileage(&self) -> Option<u32> {
        (self.mileage > 0).then_some(self.mileage)
    }
}

/// Low/average/high over the prices of a listing sequence
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceSummary {
    #[serde(rename = "low_price")]
    pub low: u32,
    #[serde(rename = "avg_price")]
    pub average: u32,
    #[serde(rename = "high_price")]
    pub high: u32,
}

/// Everything one aggregation run produced
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregationResult {
    pub listings: Vec<Listing>,
    pub summary: PriceSummary,
}
