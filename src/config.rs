//! Scout configuration.
//!
//! Read from an optional TOML file. Every field has a default, so an empty
//! file (or no file) gives the stock three-source setup:
//!
//! ```toml
//! user_agent = "Mozilla/5.0 ..."
//! accept_language = "en-GB,en;q=0.9"
//! render_timeout_secs = 30
//!
//! [autotrader]
//! timeout_secs = 10
//! max_listings = 6
//!
//! [ebay_motors]
//! enabled = false
//!
//! [gumtree]
//! render = true
//! min_price = 750
//! ```

use crate::error::Result;
use crate::scrapers::browser::BrowserFetcher;
use crate::scrapers::fetcher::{HttpFetcher, PageFetcher, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_USER_AGENT};
use crate::scrapers::{MarketplaceScraper, ScraperTrait, SourceProfile};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Overrides for one source. Unset fields keep the profile's values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub enabled: bool,
    pub timeout_secs: Option<u64>,
    pub max_listings: Option<usize>,
    pub min_price: Option<u32>,
    pub max_price: Option<u32>,
    /// Render with headless Chrome instead of plain HTTP. Gumtree only.
    pub render: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_secs: None,
            max_listings: None,
            min_price: None,
            max_price: None,
            render: false,
        }
    }
}

impl SourceSettings {
    fn apply(&self, profile: &mut SourceProfile) {
        if let Some(secs) = self.timeout_secs {
            profile.timeout = Duration::from_secs(secs);
        }
        if let Some(max) = self.max_listings {
            profile.max_listings = max;
        }
        if let Some(min) = self.min_price {
            profile.price_band.min = min;
        }
        if let Some(max) = self.max_price {
            profile.price_band.max = max;
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoutConfig {
    pub user_agent: String,
    pub accept_language: String,
    /// Timeout for rendered sources unless their section sets one
    pub render_timeout_secs: u64,
    pub autotrader: SourceSettings,
    pub ebay_motors: SourceSettings,
    pub gumtree: SourceSettings,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            render_timeout_secs: 30,
            autotrader: SourceSettings::default(),
            ebay_motors: SourceSettings::default(),
            gumtree: SourceSettings::default(),
        }
    }
}

impl ScoutConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    /// Defaults when `path` is `None`
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Source profiles after overrides, with whether each is rendered.
    /// Order is fixed: AutoTrader, eBay Motors, Gumtree.
    pub fn profiles(&self) -> Vec<(SourceProfile, bool)> {
        let gumtree = if self.gumtree.render {
            let mut profile = SourceProfile::gumtree_rendered();
            profile.timeout = Duration::from_secs(self.render_timeout_secs);
            profile
        } else {
            SourceProfile::gumtree()
        };

        [
            (SourceProfile::autotrader(), &self.autotrader, false),
            (SourceProfile::ebay_motors(), &self.ebay_motors, false),
            (gumtree, &self.gumtree, self.gumtree.render),
        ]
        .into_iter()
        .filter(|(profile, settings, _)| {
            if !settings.enabled {
                debug!("{} disabled in config", profile.source);
            }
            settings.enabled
        })
        .map(|(mut profile, settings, rendered)| {
            settings.apply(&mut profile);
            (profile, rendered)
        })
        .collect()
    }

    /// Build the enabled scrapers. The HTTP client is shared between them.
    pub fn build_scrapers(&self) -> Result<Vec<Arc<dyn ScraperTrait>>> {
        let http: Arc<dyn PageFetcher> = Arc::new(HttpFetcher::with_identity(
            &self.user_agent,
            &self.accept_language,
        )?);
        let browser: Arc<dyn PageFetcher> =
            Arc::new(BrowserFetcher::with_identity(&self.user_agent, &self.accept_language));

        self.profiles()
            .into_iter()
            .map(|(profile, rendered)| {
                let fetcher = if rendered { browser.clone() } else { http.clone() };
                let scraper = MarketplaceScraper::new(profile, fetcher)?;
                Ok(Arc::new(scraper) as Arc<dyn ScraperTrait>)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScrapeError;
    use crate::models::Source;
    use std::io::Write;

    #[test]
    fn empty_config_enables_all_sources() {
        let config = ScoutConfig::from_toml("").unwrap();
        let sources: Vec<Source> = config.profiles().iter().map(|(p, _)| p.source).collect();
        assert_eq!(sources, vec![Source::AutoTrader, Source::EbayMotors, Source::Gumtree]);
        assert!(config.profiles().iter().all(|(_, rendered)| !rendered));
        assert_eq!(config.accept_language, "en-GB,en;q=0.9");
    }

    #[test]
    fn overrides_apply_to_profiles() {
        let config = ScoutConfig::from_toml(
            r#"
            render_timeout_secs = 45

            [autotrader]
            timeout_secs = 12
            max_listings = 10
            max_price = 150000

            [ebay_motors]
            enabled = false

            [gumtree]
            render = true
            min_price = 750
            "#,
        )
        .unwrap();

        let profiles = config.profiles();
        assert_eq!(profiles.len(), 2);

        let (autotrader, rendered) = &profiles[0];
        assert!(!rendered);
        assert_eq!(autotrader.timeout, Duration::from_secs(12));
        assert_eq!(autotrader.max_listings, 10);
        assert_eq!(autotrader.price_band.max, 150_000);
        assert_eq!(autotrader.price_band.min, 500);

        let (gumtree, rendered) = &profiles[1];
        assert!(rendered);
        assert!(gumtree.require_detail_link);
        assert_eq!(gumtree.timeout, Duration::from_secs(45));
        assert_eq!(gumtree.price_band.min, 750);
    }

    #[test]
    fn section_timeout_beats_render_timeout() {
        let config = ScoutConfig::from_toml("[gumtree]\nrender = true\ntimeout_secs = 20\n").unwrap();
        let profiles = config.profiles();
        assert_eq!(profiles[2].0.timeout, Duration::from_secs(20));
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = ScoutConfig::from_toml("[autotrader]\nenabled = \"yes please\"").unwrap_err();
        assert!(matches!(err, ScrapeError::Config(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gumtree]\nenabled = false").unwrap();

        let config = ScoutConfig::load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.profiles().len(), 2);
        assert_eq!(config.build_scrapers().unwrap().len(), 2);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ScoutConfig::load(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ScrapeError::Io(_)));
    }
}
