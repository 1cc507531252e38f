//! Field extractors.
//!
//! Each extractor walks an ordered chain of compiled selectors inside one
//! listing fragment and returns the first usable value, or the field's
//! default once the chain is exhausted. The free-text heuristics (price,
//! mileage, seller type) are plain string functions so they can be tested
//! without a document.
//!
//! When a chain misses, mileage and seller fall back to the fragment's
//! remaining text, which leaves out the location nodes. Location lines like
//! "Croydon (12 miles)" are distances, not odometer readings.

use crate::models::SellerType;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::collections::HashSet;
use url::Url;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_LOCATION_CHARS: usize = 50;
pub const DEFAULT_LOCATION: &str = "UK";

static LEADING_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d[\d,]*").expect("static regex"));

static POUND_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"£\s*(\d[\d,]*)").expect("static regex"));

static MILEAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?)\s*(k|thousand)?\s*(?:miles?|mi)\b")
        .expect("static regex")
});

static DEALER_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:dealer(?:ship)?s?|trade|warranted|part[\s-]?exchange)\b")
        .expect("static regex")
});

static PRIVATE_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bprivate\s+(?:seller|sale|advert(?:iser)?)\b").expect("static regex")
});

/// A mileage figure recovered from free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MileageMatch {
    pub miles: u32,
    /// The text the value was read from, e.g. "45k miles"
    pub pattern: String,
}

/// Link for a fragment, and whether it came from the fragment itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub url: Url,
    pub from_fragment: bool,
}

/// Collapse runs of whitespace and trim
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate on a char boundary
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Leading whole-pound amount in a price string, 0 when there is none.
///
/// "£3,000 to £3,500" reads as 3000, "£1,250.50" as 1250.
pub fn parse_price(text: &str) -> u32 {
    LEADING_AMOUNT
        .find(text)
        .and_then(|m| m.as_str().replace(',', "").parse::<u32>().ok())
        .unwrap_or(0)
}

/// First "£"-prefixed amount anywhere in running text
pub fn find_price_in_text(text: &str) -> u32 {
    POUND_AMOUNT
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| parse_price(m.as_str()))
        .unwrap_or(0)
}

/// Mileage stated in free text: "12,345 miles", "45k miles", "60 thousand mi"
pub fn parse_mileage(text: &str) -> Option<MileageMatch> {
    for caps in MILEAGE.captures_iter(text) {
        let Some(number) = caps.get(1) else { continue };
        let Ok(mut value) = number.as_str().replace(',', "").parse::<f64>() else {
            continue;
        };
        if caps.get(2).is_some() {
            value *= 1000.0;
        }
        let value = value.round();
        if value <= 0.0 || value > f64::from(u32::MAX) {
            continue;
        }
        return Some(MileageMatch {
            miles: value as u32,
            pattern: caps[0].to_string(),
        });
    }
    None
}

/// Seller type from free text; `None` when the text says nothing either way.
/// Dealer vocabulary wins if both appear. "Private" alone ("private plate")
/// is not a seller phrase.
pub fn classify_seller(text: &str) -> Option<SellerType> {
    if DEALER_WORDS.is_match(text) {
        Some(SellerType::Dealer)
    } else if PRIVATE_WORDS.is_match(text) {
        Some(SellerType::PrivateSeller)
    } else {
        None
    }
}

/// Resolve an href against `base`, rejecting anchors and non-http schemes
pub fn resolve_href(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }
    let url = base.join(href).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Whitespace-normalised text of an element
pub fn element_text(element: &ElementRef) -> String {
    normalize_text(&element.text().collect::<String>())
}

/// Fragment text with every node matched by `exclude` left out
pub fn text_outside(fragment: &ElementRef, exclude: &[Selector]) -> String {
    let excluded: HashSet<_> = exclude
        .iter()
        .flat_map(|selector| fragment.select(selector))
        .map(|el| el.id())
        .collect();

    let parts: Vec<&str> = fragment
        .descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| !node.ancestors().any(|a| excluded.contains(&a.id())))
        .map(|(_, text)| &**text)
        .collect();
    normalize_text(&parts.join(" "))
}

/// Texts of every element matched by the chain, in chain order
fn chain_texts<'a>(
    fragment: &'a ElementRef<'a>,
    chain: &'a [Selector],
) -> impl Iterator<Item = String> + 'a {
    chain
        .iter()
        .flat_map(move |selector| fragment.select(selector))
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
}

/// First non-empty text in the chain
pub fn first_text(fragment: &ElementRef, chain: &[Selector]) -> Option<String> {
    chain_texts(fragment, chain).next()
}

pub fn extract_title(fragment: &ElementRef, chain: &[Selector]) -> Option<String> {
    first_text(fragment, chain)
}

/// Price from the chain, then optionally from a "£" amount in the fragment text
pub fn extract_price(fragment: &ElementRef, chain: &[Selector], scan_text: bool) -> u32 {
    if let Some(price) = chain_texts(fragment, chain)
        .map(|text| parse_price(&text))
        .find(|price| *price > 0)
    {
        return price;
    }
    if scan_text {
        return find_price_in_text(&element_text(fragment));
    }
    0
}

/// Mileage from the chain's texts, then from `fallback` when the source
/// allows it
pub fn extract_mileage(
    fragment: &ElementRef,
    chain: &[Selector],
    fallback: Option<&str>,
) -> Option<MileageMatch> {
    chain_texts(fragment, chain)
        .find_map(|text| parse_mileage(&text))
        .or_else(|| fallback.and_then(parse_mileage))
}

pub fn extract_location(fragment: &ElementRef, chain: &[Selector]) -> String {
    let location = first_text(fragment, chain).unwrap_or_else(|| DEFAULT_LOCATION.to_string());
    truncate_chars(&location, MAX_LOCATION_CHARS)
}

/// Seller from the chain's texts, then `fallback`, then `default`
pub fn extract_seller(
    fragment: &ElementRef,
    chain: &[Selector],
    fallback: &str,
    default: SellerType,
) -> SellerType {
    chain_texts(fragment, chain)
        .find_map(|text| classify_seller(&text))
        .or_else(|| classify_seller(fallback))
        .unwrap_or(default)
}

const IMAGE_ATTRS: [&str; 3] = ["src", "data-src", "srcset"];

/// First real image URL in the chain. Inline data URIs and URLs containing
/// any of `reject` are skipped.
pub fn extract_image(
    fragment: &ElementRef,
    chain: &[Selector],
    base: &Url,
    reject: &[String],
    placeholder: &str,
) -> String {
    for selector in chain {
        for el in fragment.select(selector) {
            for attr in IMAGE_ATTRS {
                let Some(value) = el.value().attr(attr) else { continue };
                // srcset lists "url width" pairs; the first url is enough
                let candidate = value.split_whitespace().next().unwrap_or("");
                if candidate.is_empty()
                    || reject.iter().any(|marker| candidate.contains(marker.as_str()))
                {
                    continue;
                }
                if let Some(url) = resolve_href(candidate, base) {
                    return url.to_string();
                }
            }
        }
    }
    placeholder.to_string()
}

/// Listing link from the chain, then the fragment's own href, else the
/// search URL so every listing points somewhere.
pub fn extract_link(
    fragment: &ElementRef,
    chain: &[Selector],
    base: &Url,
    search_url: &Url,
) -> ResolvedLink {
    let from_chain = chain
        .iter()
        .flat_map(|selector| fragment.select(selector))
        .filter_map(|el| el.value().attr("href"))
        .find_map(|href| resolve_href(href, base));
    let from_self = || {
        fragment
            .value()
            .attr("href")
            .and_then(|href| resolve_href(href, base))
    };

    match from_chain.or_else(from_self) {
        Some(url) => ResolvedLink {
            url,
            from_fragment: true,
        },
        None => ResolvedLink {
            url: search_url.clone(),
            from_fragment: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn sel(chain: &[&str]) -> Vec<Selector> {
        chain.iter().map(|s| Selector::parse(s).unwrap()).collect()
    }

    fn base() -> Url {
        Url::parse("https://www.gumtree.com").unwrap()
    }

    #[test]
    fn price_takes_leading_token() {
        assert_eq!(parse_price("£3,000 to £3,500"), 3000);
        assert_eq!(parse_price("£12,995"), 12995);
        assert_eq!(parse_price("£1,250.50"), 1250);
        assert_eq!(parse_price("Price: £4,200 ono"), 4200);
    }

    #[test]
    fn price_without_digits_is_zero() {
        assert_eq!(parse_price("POA"), 0);
        assert_eq!(parse_price(""), 0);
        assert_eq!(parse_price("£99999999999999"), 0);
    }

    #[test]
    fn price_found_in_running_text() {
        assert_eq!(find_price_in_text("Lovely car, £4,750, 1 owner"), 4750);
        assert_eq!(find_price_in_text("2019, 45,000 miles"), 0);
    }

    #[test]
    fn mileage_with_separators() {
        let m = parse_mileage("12,345 miles").unwrap();
        assert_eq!(m.miles, 12345);
        assert_eq!(m.pattern, "12,345 miles");
    }

    #[test]
    fn mileage_with_thousand_marker() {
        assert_eq!(parse_mileage("45k miles").unwrap().miles, 45000);
        assert_eq!(parse_mileage("45K Miles").unwrap().miles, 45000);
        assert_eq!(parse_mileage("62.5k mi").unwrap().miles, 62500);
        assert_eq!(parse_mileage("60 thousand miles").unwrap().miles, 60000);
    }

    #[test]
    fn mileage_k_elsewhere_does_not_scale() {
        let m = parse_mileage("Diesel, 1.6 litre, 52,000 miles, black").unwrap();
        assert_eq!(m.miles, 52000);
        let m = parse_mileage("keyless entry, 30000 miles").unwrap();
        assert_eq!(m.miles, 30000);
    }

    #[test]
    fn mileage_absent() {
        assert_eq!(parse_mileage("2019 Vauxhall Astra 1.4T SRi"), None);
        assert_eq!(parse_mileage("Ready in 45 minutes"), None);
        assert_eq!(parse_mileage("0 miles"), None);
    }

    #[test]
    fn mileage_skips_year_before_figure() {
        assert_eq!(parse_mileage("2019 45000 miles").unwrap().miles, 45000);
    }

    #[test]
    fn seller_classification() {
        assert_eq!(classify_seller("Trade seller"), Some(SellerType::Dealer));
        assert_eq!(classify_seller("Main dealer, warranted"), Some(SellerType::Dealer));
        assert_eq!(classify_seller("Private seller"), Some(SellerType::PrivateSeller));
        assert_eq!(classify_seller("Private sale, trade enquiries welcome"), Some(SellerType::Dealer));
        assert_eq!(classify_seller("Seen on AutoTrader"), None);
        assert_eq!(classify_seller("One owner"), None);
    }

    #[test]
    fn private_plate_is_not_a_private_seller() {
        assert_eq!(classify_seller("Vauxhall Astra SRi with private plate"), None);
        assert_eq!(classify_seller("Private advertiser"), Some(SellerType::PrivateSeller));
        assert_eq!(classify_seller("PRIVATE  SALE"), Some(SellerType::PrivateSeller));
    }

    #[test]
    fn truncation_is_char_based() {
        assert_eq!(truncate_chars("Södermalm", 2), "Sö");
        assert_eq!(truncate_chars("short", 50), "short");
    }

    #[test]
    fn href_resolution() {
        let base = base();
        assert_eq!(
            resolve_href("/p/cars/astra/123", &base).unwrap().as_str(),
            "https://www.gumtree.com/p/cars/astra/123"
        );
        assert_eq!(
            resolve_href("//i.ebayimg.com/a.jpg", &base).unwrap().as_str(),
            "https://i.ebayimg.com/a.jpg"
        );
        assert!(resolve_href("#", &base).is_none());
        assert!(resolve_href("javascript:void(0)", &base).is_none());
        assert!(resolve_href("", &base).is_none());
    }

    #[test]
    fn fragment_extractors_walk_the_chain() {
        let html = Html::parse_fragment(
            r#"<div class="card">
                 <a href="javascript:void(0)">Save</a>
                 <a class="detail" href="/p/cars/123">View</a>
                 <h2> 2019   Vauxhall Astra </h2>
                 <span class="price">£3,995</span>
                 <p class="desc">45k miles, private sale</p>
                 <img src="data:image/gif;base64,AAAA" data-src="/img/1.jpg">
               </div>"#,
        );
        let card = html.select(&Selector::parse("div.card").unwrap()).next().unwrap();
        let search = Url::parse("https://www.gumtree.com/search?q=astra").unwrap();

        assert_eq!(
            extract_title(&card, &sel(&["h3", "h2"])).as_deref(),
            Some("2019 Vauxhall Astra")
        );
        assert_eq!(extract_price(&card, &sel(&[".listing-price", ".price"]), false), 3995);
        assert_eq!(extract_mileage(&card, &sel(&[".desc"]), None).unwrap().miles, 45000);
        assert_eq!(extract_location(&card, &sel(&[".location"])), "UK");
        assert_eq!(
            extract_seller(&card, &sel(&[".desc"]), "", SellerType::Dealer),
            SellerType::PrivateSeller
        );
        assert_eq!(
            extract_image(&card, &sel(&["img"]), &base(), &[], "placeholder"),
            "https://www.gumtree.com/img/1.jpg"
        );

        let link = extract_link(&card, &sel(&["a"]), &base(), &search);
        assert!(link.from_fragment);
        assert_eq!(link.url.as_str(), "https://www.gumtree.com/p/cars/123");
    }

    #[test]
    fn remaining_text_leaves_out_location() {
        let html = Html::parse_fragment(
            r#"<div class="card">
                 <h2>Vauxhall Astra SRi</h2>
                 <span class="location">Croydon <b>(12 miles)</b></span>
                 <p>One owner</p>
               </div>"#,
        );
        let card = html.select(&Selector::parse("div.card").unwrap()).next().unwrap();

        let rest = text_outside(&card, &sel(&[".location"]));
        assert_eq!(rest, "Vauxhall Astra SRi One owner");
        assert_eq!(extract_mileage(&card, &sel(&[".mileage"]), Some(rest.as_str())), None);
        assert_eq!(
            extract_mileage(&card, &sel(&[".mileage"]), Some(element_text(&card).as_str()))
                .unwrap()
                .miles,
            12
        );
    }

    #[test]
    fn mileage_fallback_is_opt_in() {
        let html = Html::parse_fragment(r#"<div class="card"><h2>Astra, 52k miles</h2></div>"#);
        let card = html.select(&Selector::parse("div.card").unwrap()).next().unwrap();
        let rest = text_outside(&card, &[]);
        assert_eq!(extract_mileage(&card, &[], None), None);
        assert_eq!(extract_mileage(&card, &[], Some(rest.as_str())).unwrap().miles, 52000);
    }

    #[test]
    fn link_falls_back_to_search_url() {
        let html = Html::parse_fragment(r#"<div class="card"><h2>No link here</h2></div>"#);
        let card = html.select(&Selector::parse("div.card").unwrap()).next().unwrap();
        let search = Url::parse("https://www.gumtree.com/search?q=astra").unwrap();

        let link = extract_link(&card, &sel(&["a"]), &base(), &search);
        assert!(!link.from_fragment);
        assert_eq!(link.url, search);
    }

    #[test]
    fn image_rejects_marked_urls() {
        let html = Html::parse_fragment(
            r#"<div class="card"><img src="https://img.gumtree.com/placeholder.png"></div>"#,
        );
        let card = html.select(&Selector::parse("div.card").unwrap()).next().unwrap();
        let image = extract_image(
            &card,
            &sel(&["img"]),
            &base(),
            &["placeholder".to_string()],
            "https://via.placeholder.com/300x200",
        );
        assert_eq!(image, "https://via.placeholder.com/300x200");
    }

    #[test]
    fn price_scans_fragment_text_when_enabled() {
        let html = Html::parse_fragment(
            r#"<div class="card"><p>Astra SRi, £5,250, MOT till May</p></div>"#,
        );
        let card = html.select(&Selector::parse("div.card").unwrap()).next().unwrap();
        assert_eq!(extract_price(&card, &sel(&[".price"]), false), 0);
        assert_eq!(extract_price(&card, &sel(&[".price"]), true), 5250);
    }
}
