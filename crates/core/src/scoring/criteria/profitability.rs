use crate::domain::signal::ProductSignal;

use super::piecewise;

/// Margin % -> score: 70+ -> 100, 50-70 -> 80 + (m - 50), 30-50 -> 50 + 1.5 (m - 30),
/// 10-30 -> 2.5 (m - 10), below 10 -> 0.
const MARGIN: &[(f64, f64)] = &[(10.0, 0.0), (30.0, 50.0), (50.0, 80.0), (70.0, 100.0)];

/// Retail price -> score. 20-100 is the sweet spot for impulse-friendly online sales.
const PRICE_POINT: &[(f64, f64)] = &[
    (0.0, 0.0),
    (10.0, 60.0),
    (20.0, 100.0),
    (100.0, 100.0),
    (200.0, 70.0),
    (500.0, 40.0),
    (2500.0, 20.0),
];

/// Price volatility % -> score. Lower volatility scores higher.
const PRICE_VOLATILITY: &[(f64, f64)] = &[(5.0, 100.0), (15.0, 70.0), (30.0, 40.0), (70.0, 0.0)];

pub fn score_profit_margin(data: &ProductSignal) -> Option<f64> {
    let margin = data.number("marketplace", "margin_percentage").or_else(|| {
        let price = data.number("marketplace", "average_price")?;
        let cost = data.number("supplier", "unit_cost")?;
        (price > 0.0).then(|| (price - cost) / price * 100.0)
    })?;
    Some(piecewise(margin, MARGIN))
}

pub fn score_price_point(data: &ProductSignal) -> Option<f64> {
    let price = data
        .number("marketplace", "average_price")
        .or_else(|| data.number("basic_info", "price"))?;
    Some(piecewise(price, PRICE_POINT))
}

/// Volatility when reported, otherwise the relative spread between the lowest
/// and highest observed prices.
pub fn score_price_stability(data: &ProductSignal) -> Option<f64> {
    let volatility = data.number("marketplace", "price_volatility").or_else(|| {
        let low = data.number("marketplace", "min_price")?;
        let high = data.number("marketplace", "max_price")?;
        let total = low + high;
        (total > 0.0).then(|| (high - low).abs() * 100.0 / total)
    })?;
    Some(piecewise(volatility, PRICE_VOLATILITY))
}
