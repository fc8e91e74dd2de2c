use crate::domain::signal::{as_number, ProductSignal};

use super::piecewise;

/// Growth % over the trend window -> score.
const GROWTH: &[(f64, f64)] =
    &[(-50.0, 0.0), (0.0, 50.0), (20.0, 65.0), (50.0, 85.0), (100.0, 100.0)];

/// Interest volatility % -> score. Steadier interest scores higher.
const VOLATILITY: &[(f64, f64)] = &[(10.0, 100.0), (25.0, 70.0), (50.0, 30.0), (100.0, 0.0)];

/// Current interest relative to the period average -> score.
const MOMENTUM: &[(f64, f64)] = &[(0.0, 0.0), (0.5, 20.0), (1.0, 60.0), (1.5, 100.0)];

/// Seasonality strength (0-100) -> score. Evergreen products score higher.
const SEASONALITY: &[(f64, f64)] = &[(20.0, 100.0), (60.0, 60.0), (100.0, 20.0)];

/// Average keyword growth, falling back to the overall trend growth.
pub fn score_trend_growth(data: &ProductSignal) -> Option<f64> {
    let growth = data
        .trend_metric_mean("growth_rate")
        .or_else(|| data.number("trends", "growth_rate"))?;
    Some(piecewise(growth, GROWTH))
}

pub fn score_trend_stability(data: &ProductSignal) -> Option<f64> {
    let volatility = data
        .trend_metric_mean("volatility")
        .or_else(|| data.number("trends", "volatility"))?;
    Some(piecewise(volatility, VOLATILITY))
}

pub fn score_trend_momentum(data: &ProductSignal) -> Option<f64> {
    let ratios: Vec<f64> = data
        .trend_metrics()
        .into_iter()
        .filter_map(|metrics| {
            let current = metrics.get("current_interest").and_then(as_number)?;
            let average = metrics.get("average_interest").and_then(as_number)?;
            (average > 0.0).then(|| current / average)
        })
        .collect();

    let ratio = if ratios.is_empty() {
        let current = data.number("trends", "current_interest")?;
        let average = data.number("trends", "average_interest")?;
        if average <= 0.0 {
            return None;
        }
        current / average
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    };

    Some(piecewise(ratio, MOMENTUM))
}

pub fn score_seasonality(data: &ProductSignal) -> Option<f64> {
    let strength = data
        .number("trends", "seasonality_index")
        .or_else(|| data.trend_metric_mean("seasonality"))?;
    Some(piecewise(strength, SEASONALITY))
}
