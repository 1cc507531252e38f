use crate::error::{Result, ScrapeError};
use crate::models::Listing;
use crate::scrapers::extract::{self, MAX_TITLE_CHARS};
use crate::scrapers::profile::SourceProfile;
use crate::scrapers::types::SearchParams;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

/// Compiled selector chains for one profile
struct CompiledChains {
    fragment: Vec<(String, Selector)>,
    link: Vec<Selector>,
    title: Vec<Selector>,
    price: Vec<Selector>,
    mileage: Vec<Selector>,
    location: Vec<Selector>,
    image: Vec<Selector>,
    seller: Vec<Selector>,
}

/// Turns a results page into listings for one source
pub struct ListingParser {
    profile: SourceProfile,
    base_url: Url,
    chains: CompiledChains,
}

/// Compile a chain, skipping selectors that do not parse. An empty chain is
/// fine for optional fields but not for fragments.
fn compile(field: &'static str, selectors: &[String]) -> Vec<Selector> {
    selectors
        .iter()
        .filter_map(|s| match Selector::parse(s) {
            Ok(selector) => Some(selector),
            Err(e) => {
                warn!(field, selector = %s, "Skipping invalid selector: {}", e);
                None
            }
        })
        .collect()
}

impl ListingParser {
    pub fn new(profile: SourceProfile) -> Result<Self> {
        let base_url = Url::parse(&profile.base_url)?;

        let mut fragment = Vec::new();
        for s in &profile.locators.fragment {
            match Selector::parse(s) {
                Ok(selector) => fragment.push((s.clone(), selector)),
                Err(e) => warn!(selector = %s, "Skipping invalid fragment selector: {}", e),
            }
        }
        if fragment.is_empty() {
            return Err(ScrapeError::NoUsableLocators { field: "fragment" });
        }

        let locators = &profile.locators;
        let chains = CompiledChains {
            fragment,
            link: compile("link", &locators.link),
            title: compile("title", &locators.title),
            price: compile("price", &locators.price),
            mileage: compile("mileage", &locators.mileage),
            location: compile("location", &locators.location),
            image: compile("image", &locators.image),
            seller: compile("seller", &locators.seller),
        };

        Ok(Self {
            profile,
            base_url,
            chains,
        })
    }

    pub fn profile(&self) -> &SourceProfile {
        &self.profile
    }

    /// Fragments from the first locator in the chain that matches anything
    fn locate_fragments<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        for (raw, selector) in &self.chains.fragment {
            let fragments: Vec<_> = document.select(selector).collect();
            if !fragments.is_empty() {
                debug!(
                    source = %self.profile.source,
                    locator = %raw,
                    count = fragments.len(),
                    "Located listing fragments"
                );
                return fragments;
            }
        }
        Vec::new()
    }

    /// Extract up to `max_listings` listings, in document order.
    ///
    /// Never fails: fragments that cannot yield a usable listing are skipped.
    pub fn parse(&self, html: &str, params: &SearchParams, search_url: &Url) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let fragments = self.locate_fragments(&document);
        if fragments.is_empty() {
            debug!(source = %self.profile.source, "No locator matched any fragment");
            return Vec::new();
        }

        let mut seen_links = HashSet::new();
        let mut listings = Vec::new();

        for (idx, fragment) in fragments.iter().enumerate() {
            if listings.len() >= self.profile.max_listings {
                break;
            }
            if let Some(listing) = self.parse_fragment(fragment, params, search_url, &mut seen_links) {
                listings.push(listing);
            } else {
                debug!(source = %self.profile.source, idx, "Skipped fragment");
            }
        }

        listings
    }

    fn parse_fragment(
        &self,
        fragment: &ElementRef,
        params: &SearchParams,
        search_url: &Url,
        seen_links: &mut HashSet<String>,
    ) -> Option<Listing> {
        let profile = &self.profile;
        let chains = &self.chains;

        let link = extract::extract_link(fragment, &chains.link, &self.base_url, search_url);
        if !link.from_fragment && profile.require_detail_link {
            return None;
        }
        let link = link.url.to_string();
        if !seen_links.insert(link.clone()) {
            return None;
        }

        let title = match extract::extract_title(fragment, &chains.title) {
            Some(title) => title,
            None if profile.title_from_params => params.default_title(),
            None => return None,
        };
        if title.chars().count() < profile.min_title_chars {
            return None;
        }
        let lowered = title.to_lowercase();
        if profile
            .non_listing_markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
        {
            return None;
        }

        let price = extract::extract_price(fragment, &chains.price, profile.price_from_text);
        if price == 0 || !profile.price_band.contains(price) {
            debug!(source = %profile.source, price, "Price outside plausible band");
            return None;
        }

        // Location lines carry distances ("12 miles away"), never mileage
        let remaining = extract::text_outside(fragment, &chains.location);
        let mileage_fallback = profile.mileage_from_text.then_some(remaining.as_str());
        let mileage = extract::extract_mileage(fragment, &chains.mileage, mileage_fallback)
            .map(|m| m.miles)
            .unwrap_or(0);
        let location = extract::extract_location(fragment, &chains.location);
        let image = extract::extract_image(
            fragment,
            &chains.image,
            &self.base_url,
            &profile.image_reject,
            &profile.placeholder_image,
        );
        let seller =
            extract::extract_seller(fragment, &chains.seller, &remaining, profile.default_seller);

        Some(Listing {
            source: profile.source,
            title: extract::truncate_chars(&title, MAX_TITLE_CHARS),
            price,
            mileage,
            location,
            image,
            link,
            seller,
        })
    }
}
