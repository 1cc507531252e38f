use serde::{Deserialize, Serialize};

/// Search parameters for one aggregation run.
///
/// Callers validate raw input (registration format, numeric mileage) before
/// building this; the scrapers take it as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub make: String,
    pub model: String,
    pub year: u16,
    /// Current mileage of the vehicle being valued. Advisory only, most
    /// sources ignore it.
    pub mileage: u32,
}

impl SearchParams {
    pub fn new(make: impl Into<String>, model: impl Into<String>, year: u16, mileage: u32) -> Self {
        Self {
            make: make.into(),
            model: model.into(),
            year,
            mileage,
        }
    }

    /// Fallback title when a source renders none: "2019 Vauxhall Astra"
    pub fn default_title(&self) -> String {
        format!("{} {} {}", self.year, self.make, self.model)
    }
}
