use crate::models::{Listing, PriceSummary};

/// Low/average/high price over `listings`; all zero when there are none.
/// The average is rounded half up to the nearest pound.
pub fn summarize(listings: &[Listing]) -> PriceSummary {
    let mut prices = listings.iter().map(|l| l.price);
    let Some(first) = prices.next() else {
        return PriceSummary::default();
    };

    let (mut low, mut high, mut sum) = (first, first, u64::from(first));
    for price in prices {
        low = low.min(price);
        high = high.max(price);
        sum += u64::from(price);
    }
    let count = listings.len() as u64;
    let average = (sum + count / 2) / count;

    PriceSummary {
        low,
        // The mean of u32 values always fits in u32
        average: average as u32,
        high,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SellerType, Source};

    fn priced(prices: &[u32]) -> Vec<Listing> {
        prices
            .iter()
            .enumerate()
            .map(|(i, price)| Listing {
                source: Source::Gumtree,
                title: format!("Vauxhall Astra {i}"),
                price: *price,
                mileage: 0,
                location: "UK".to_string(),
                image: String::new(),
                link: format!("https://www.gumtree.com/p/{i}"),
                seller: SellerType::PrivateSeller,
            })
            .collect()
    }

    #[test]
    fn empty_is_all_zero() {
        assert_eq!(summarize(&[]), PriceSummary { low: 0, average: 0, high: 0 });
    }

    #[test]
    fn three_listing_example() {
        let summary = summarize(&priced(&[3000, 3500, 4200]));
        assert_eq!(summary, PriceSummary { low: 3000, average: 3567, high: 4200 });
    }

    #[test]
    fn rounds_half_up() {
        assert_eq!(summarize(&priced(&[1000, 1001])).average, 1001);
        assert_eq!(summarize(&priced(&[1000, 1000, 1001])).average, 1000);
    }

    #[test]
    fn single_listing() {
        let summary = summarize(&priced(&[7495]));
        assert_eq!(summary, PriceSummary { low: 7495, average: 7495, high: 7495 });
    }

    #[test]
    fn ordering_holds_for_varied_inputs() {
        let cases: [&[u32]; 5] = [
            &[500, 100_000],
            &[4200, 3000, 3500],
            &[999, 999, 999, 1000],
            &[u32::MAX, u32::MAX - 1, 1],
            &[12_345, 67_890, 500, 99_999, 2_500, 8_000],
        ];
        for prices in cases {
            let s = summarize(&priced(prices));
            assert!(s.low <= s.average && s.average <= s.high, "{prices:?} -> {s:?}");
            assert_eq!(s.low, *prices.iter().min().unwrap());
            assert_eq!(s.high, *prices.iter().max().unwrap());
        }
    }
}
