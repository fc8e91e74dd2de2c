//! Criterion functions
//!
//! Each criterion maps a partial product signal to an optional 0-100 score.
//! `None` means neither the primary field nor any fallback source is present.
//! Breakpoint tables are fixed business policy; keep them stable.

mod competition;
mod market;
mod operational;
mod profitability;
mod trend;

use std::collections::HashMap;

use crate::domain::signal::ProductSignal;

use super::types::Category;

pub use competition::{score_barriers_to_entry, score_competitor_count, score_market_saturation};
pub use market::{score_audience_reach, score_market_growth, score_market_size, score_search_volume};
pub use operational::{score_return_rate, score_shipping_complexity, score_supplier_reliability};
pub use profitability::{score_price_point, score_price_stability, score_profit_margin};
pub use trend::{score_seasonality, score_trend_growth, score_trend_momentum, score_trend_stability};

pub type CriterionFn = fn(&ProductSignal) -> Option<f64>;

/// Name to function table, built once per scorer.
pub type CriterionRegistry = HashMap<&'static str, CriterionFn>;

#[derive(Debug, Clone, Copy)]
pub struct CriterionSpec {
    pub name: &'static str,
    pub category: Category,
    pub function: CriterionFn,
}

pub const CRITERIA: &[CriterionSpec] = &[
    CriterionSpec {
        name: "search_volume",
        category: Category::MarketPotential,
        function: score_search_volume,
    },
    CriterionSpec {
        name: "market_size",
        category: Category::MarketPotential,
        function: score_market_size,
    },
    CriterionSpec {
        name: "market_growth",
        category: Category::MarketPotential,
        function: score_market_growth,
    },
    CriterionSpec {
        name: "audience_reach",
        category: Category::MarketPotential,
        function: score_audience_reach,
    },
    CriterionSpec {
        name: "competitor_count",
        category: Category::Competition,
        function: score_competitor_count,
    },
    CriterionSpec {
        name: "market_saturation",
        category: Category::Competition,
        function: score_market_saturation,
    },
    CriterionSpec {
        name: "barriers_to_entry",
        category: Category::Competition,
        function: score_barriers_to_entry,
    },
    CriterionSpec {
        name: "profit_margin",
        category: Category::Profitability,
        function: score_profit_margin,
    },
    CriterionSpec {
        name: "price_point",
        category: Category::Profitability,
        function: score_price_point,
    },
    CriterionSpec {
        name: "price_stability",
        category: Category::Profitability,
        function: score_price_stability,
    },
    CriterionSpec {
        name: "shipping_complexity",
        category: Category::Operational,
        function: score_shipping_complexity,
    },
    CriterionSpec {
        name: "return_rate",
        category: Category::Operational,
        function: score_return_rate,
    },
    CriterionSpec {
        name: "supplier_reliability",
        category: Category::Operational,
        function: score_supplier_reliability,
    },
    CriterionSpec {
        name: "trend_growth",
        category: Category::Trend,
        function: score_trend_growth,
    },
    CriterionSpec {
        name: "trend_stability",
        category: Category::Trend,
        function: score_trend_stability,
    },
    CriterionSpec {
        name: "trend_momentum",
        category: Category::Trend,
        function: score_trend_momentum,
    },
    CriterionSpec {
        name: "seasonality",
        category: Category::Trend,
        function: score_seasonality,
    },
];

pub fn registry() -> CriterionRegistry {
    CRITERIA.iter().map(|spec| (spec.name, spec.function)).collect()
}

pub fn lookup(name: &str) -> Option<CriterionFn> {
    CRITERIA.iter().find(|spec| spec.name == name).map(|spec| spec.function)
}

/// Runs a registered criterion and clamps its output to [0, 100].
pub fn evaluate(registry: &CriterionRegistry, name: &str, signal: &ProductSignal) -> Option<f64> {
    registry.get(name).and_then(|function| function(signal)).map(clamp_score)
}

pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}

/// Piecewise-linear interpolation over ascending `(input, score)` breakpoints.
/// Inputs outside the table take the score of the nearest end.
pub(crate) fn piecewise(value: f64, points: &[(f64, f64)]) -> f64 {
    let Some(&(first_x, first_y)) = points.first() else {
        return 0.0;
    };
    if value <= first_x {
        return clamp_score(first_y);
    }

    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if value <= x1 {
            if x1 == x0 {
                return clamp_score(y1);
            }
            return clamp_score(y0 + (y1 - y0) * (value - x0) / (x1 - x0));
        }
    }

    points.last().map(|&(_, y)| clamp_score(y)).unwrap_or(0.0)
}

/// Same as [`piecewise`] but breakpoints are expressed in log10 of the input.
/// Non-positive inputs score as the first breakpoint.
pub(crate) fn log_piecewise(value: f64, points: &[(f64, f64)]) -> f64 {
    if value <= 0.0 {
        return points.first().map(|&(_, y)| clamp_score(y)).unwrap_or(0.0);
    }
    piecewise(value.log10(), points)
}

/// Mean of whichever values are present.
pub(crate) fn mean_present(values: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        None
    } else {
        Some(present.iter().sum::<f64>() / present.len() as f64)
    }
}
