use crate::aggregator::Aggregator;
use crate::models::{AggregationResult, Listing, PriceSummary};
use crate::scrapers::SearchParams;
use crate::summary::summarize;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Valuation payload handed back to whatever serves the lookup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationReport {
    pub make: String,
    pub model: String,
    pub year: u16,
    pub mileage: u32,
    #[serde(flatten)]
    pub summary: PriceSummary,
    pub listings: Vec<Listing>,
    pub generated_at: DateTime<Utc>,
}

/// Entry point for a lookup: aggregate, then summarize.
///
/// Never fails. With every source down the result has no listings and a zero
/// summary.
pub struct ValuationService {
    aggregator: Aggregator,
}

impl ValuationService {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub async fn value(&self, params: &SearchParams) -> AggregationResult {
        let listings = self.aggregator.aggregate(params).await;
        let summary = summarize(&listings);
        info!(
            low = summary.low,
            average = summary.average,
            high = summary.high,
            "Price range over {} listings",
            listings.len()
        );
        AggregationResult { listings, summary }
    }

    pub async fn report(&self, params: &SearchParams) -> ValuationReport {
        let AggregationResult { listings, summary } = self.value(params).await;
        ValuationReport {
            make: params.make.clone(),
            model: params.model.clone(),
            year: params.year,
            mileage: params.mileage,
            summary,
            listings,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_sources_gives_zero_report() {
        let service = ValuationService::new(Aggregator::new());
        let params = SearchParams::new("Vauxhall", "Astra", 2019, 80_000);

        let report = service.report(&params).await;
        assert!(report.listings.is_empty());
        assert_eq!(report.summary, PriceSummary::default());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["make"], "Vauxhall");
        assert_eq!(json["mileage"], 80_000);
        assert_eq!(json["low_price"], 0);
        assert_eq!(json["avg_price"], 0);
        assert_eq!(json["high_price"], 0);
        assert!(json["listings"].as_array().unwrap().is_empty());
    }
}
