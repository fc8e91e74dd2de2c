use crate::domain::signal::ProductSignal;

use super::{log_piecewise, piecewise};

/// log10(monthly searches) -> score. 100 -> 10, 1k -> 40, 10k -> 70, 100k+ -> 100.
const SEARCH_VOLUME: &[(f64, f64)] =
    &[(0.0, 0.0), (2.0, 10.0), (3.0, 40.0), (4.0, 70.0), (5.0, 100.0)];

/// Searches implied by one point of trend interest when no SEO data exists.
const SEARCHES_PER_INTEREST_POINT: f64 = 500.0;

/// log10(market size in USD) -> score. 1M -> 40, 10M -> 60, 100M -> 80, 1B+ -> 100.
const MARKET_SIZE: &[(f64, f64)] =
    &[(5.0, 0.0), (6.0, 40.0), (7.0, 60.0), (8.0, 80.0), (9.0, 100.0)];

/// Yearly market growth % -> score.
const MARKET_GROWTH: &[(f64, f64)] = &[(-20.0, 0.0), (0.0, 40.0), (20.0, 70.0), (50.0, 100.0)];

/// Social engagement rate % -> score.
const ENGAGEMENT_RATE: &[(f64, f64)] = &[(0.0, 0.0), (1.0, 30.0), (5.0, 70.0), (10.0, 100.0)];

/// log10(social mentions) -> score.
const MENTIONS: &[(f64, f64)] = &[(1.0, 0.0), (2.0, 30.0), (3.0, 55.0), (4.0, 80.0), (5.0, 100.0)];

pub fn score_search_volume(data: &ProductSignal) -> Option<f64> {
    let volume = data
        .number("seo", "search_volume")
        .or_else(|| data.number("seo", "monthly_searches"))
        .or_else(|| data.number("market", "search_volume"))
        .or_else(|| {
            data.trend_metric_mean("average_interest")
                .or_else(|| data.number("trends", "average_interest"))
                .map(|interest| interest.max(0.0) * SEARCHES_PER_INTEREST_POINT)
        })?;
    Some(log_piecewise(volume, SEARCH_VOLUME))
}

pub fn score_market_size(data: &ProductSignal) -> Option<f64> {
    let size = data
        .number("market", "market_size")
        .or_else(|| data.number("market", "total_addressable_market"))?;
    Some(log_piecewise(size, MARKET_SIZE))
}

pub fn score_market_growth(data: &ProductSignal) -> Option<f64> {
    let growth =
        data.number("market", "growth_rate").or_else(|| data.number("market", "cagr"))?;
    Some(piecewise(growth, MARKET_GROWTH))
}

/// Engagement rate when available, otherwise the raw mention volume.
pub fn score_audience_reach(data: &ProductSignal) -> Option<f64> {
    if let Some(rate) = data.number("social", "engagement_rate") {
        return Some(piecewise(rate, ENGAGEMENT_RATE));
    }
    let mentions = data.number("social", "mentions")?;
    Some(log_piecewise(mentions, MENTIONS))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn signal(value: serde_json::Value) -> ProductSignal {
        ProductSignal::from_value(value).expect("valid signal")
    }

    fn assert_close(actual: Option<f64>, expected: f64) {
        let actual = actual.expect("criterion should produce a score");
        assert!((actual - expected).abs() < 1e-6, "expected {expected}, got {actual}");
    }

    #[test]
    fn search_volume_breakpoints() {
        let score =
            |volume: f64| score_search_volume(&signal(json!({"seo": {"search_volume": volume}})));
        assert_close(score(100_000.0), 100.0);
        assert_close(score(10_000.0), 70.0);
        assert_close(score(1_000.0), 40.0);
        assert_close(score(0.0), 0.0);
    }

    #[test]
    fn search_volume_falls_back_to_trend_interest() {
        let data = signal(json!({"trends": {"trend_metrics": {"lamp": {"average_interest": 20}}}}));
        // 20 * 500 = 10k searches
        assert_close(score_search_volume(&data), 70.0);
    }

    #[test]
    fn market_criteria_absent_without_sources() {
        let data = ProductSignal::new();
        assert_eq!(score_search_volume(&data), None);
        assert_eq!(score_market_size(&data), None);
        assert_eq!(score_market_growth(&data), None);
        assert_eq!(score_audience_reach(&data), None);
    }

    #[test]
    fn market_growth_is_linear_between_breakpoints() {
        let data = signal(json!({"market": {"growth_rate": 10}}));
        assert_eq!(score_market_growth(&data), Some(55.0));
    }

    #[test]
    fn engagement_rate_wins_over_mentions() {
        let data = signal(json!({"social": {"engagement_rate": 5, "mentions": 100_000}}));
        assert_eq!(score_audience_reach(&data), Some(70.0));

        let mentions_only = signal(json!({"social": {"mentions": 100}}));
        assert_close(score_audience_reach(&mentions_only), 30.0);
    }
}
