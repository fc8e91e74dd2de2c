use crate::domain::signal::ProductSignal;

use super::{mean_present, piecewise};

/// Competitor count -> score. Fewer competitors score higher.
const COMPETITOR_COUNT: &[(f64, f64)] =
    &[(0.0, 100.0), (5.0, 75.0), (20.0, 45.0), (50.0, 15.0), (200.0, 0.0)];

/// Listings per active competitor, used to estimate a count from listing totals.
const LISTINGS_PER_COMPETITOR: f64 = 50.0;

/// Saturation index (0-100, higher is more saturated) -> score.
const SATURATION: &[(f64, f64)] = &[(20.0, 100.0), (50.0, 55.0), (80.0, 10.0), (100.0, 0.0)];

/// Barrier index (0-100) -> score. Moderate barriers score highest: low barriers
/// invite copycats, high barriers keep a newcomer out.
const BARRIERS: &[(f64, f64)] = &[(0.0, 50.0), (40.0, 100.0), (60.0, 100.0), (100.0, 40.0)];

pub fn score_competitor_count(data: &ProductSignal) -> Option<f64> {
    let count = data
        .number("marketplace", "competitor_count")
        .or_else(|| {
            data.number("marketplace", "total_listings")
                .map(|listings| (listings / LISTINGS_PER_COMPETITOR).ceil())
        })?;
    Some(piecewise(count.max(0.0), COMPETITOR_COUNT))
}

pub fn score_market_saturation(data: &ProductSignal) -> Option<f64> {
    let saturation = data
        .number("marketplace", "market_saturation")
        .or_else(|| data.number("seo", "keyword_difficulty"))?;
    Some(piecewise(saturation, SATURATION))
}

/// Uses an explicit barrier index when present, otherwise estimates one from
/// keyword difficulty, minimum order quantity and incumbent review counts.
pub fn score_barriers_to_entry(data: &ProductSignal) -> Option<f64> {
    let barrier = data.number("market", "barriers_to_entry").or_else(|| {
        mean_present(&[
            data.number("seo", "keyword_difficulty"),
            data.number("supplier", "minimum_order_quantity").map(|moq| (moq / 10.0).min(100.0)),
            data.number("marketplace", "average_review_count")
                .map(|reviews| (reviews / 20.0).min(100.0)),
        ])
    })?;
    Some(piecewise(barrier.clamp(0.0, 100.0), BARRIERS))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn signal(value: serde_json::Value) -> ProductSignal {
        ProductSignal::from_value(value).expect("valid signal")
    }

    #[test]
    fn fewer_competitors_score_higher() {
        let score = |count: u32| {
            score_competitor_count(&signal(json!({"marketplace": {"competitor_count": count}})))
        };
        assert_eq!(score(0), Some(100.0));
        assert_eq!(score(3), Some(85.0));
        assert_eq!(score(20), Some(45.0));
        assert!(score(3) > score(10));
        assert!(score(10) > score(60));
    }

    #[test]
    fn competitor_count_estimated_from_listings() {
        let data = signal(json!({"marketplace": {"total_listings": 240}}));
        // ceil(240 / 50) = 5 competitors
        assert_eq!(score_competitor_count(&data), Some(75.0));
    }

    #[test]
    fn saturation_is_inverted() {
        let saturation = |value: u32| {
            score_market_saturation(&signal(json!({"marketplace": {"market_saturation": value}})))
        };
        let low = saturation(10);
        let high = saturation(90);
        assert_eq!(low, Some(100.0));
        assert_eq!(high, Some(5.0));
    }

    #[test]
    fn barriers_favor_the_middle_band() {
        let score = |barrier: f64| {
            score_barriers_to_entry(&signal(json!({"market": {"barriers_to_entry": barrier}})))
        };
        let low = score(5.0).expect("score");
        let mid = score(50.0).expect("score");
        let high = score(95.0).expect("score");

        assert_eq!(mid, 100.0);
        assert!(mid > low);
        assert!(mid > high);
    }

    #[test]
    fn barriers_estimated_from_available_proxies() {
        let data = signal(json!({
            "seo": {"keyword_difficulty": 40},
            "supplier": {"minimum_order_quantity": 600},
        }));
        // mean(40, 60) = 50 -> middle band
        assert_eq!(score_barriers_to_entry(&data), Some(100.0));
        assert_eq!(score_barriers_to_entry(&ProductSignal::new()), None);
    }
}
