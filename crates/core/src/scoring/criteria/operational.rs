use serde_json::Value;

use crate::domain::signal::ProductSignal;

use super::{mean_present, piecewise};

/// Package weight in kg -> score. Lighter parcels score higher.
const WEIGHT_KG: &[(f64, f64)] = &[(0.5, 100.0), (2.0, 85.0), (10.0, 45.0), (32.5, 0.0)];

const FRAGILE_PENALTY: f64 = 15.0;

/// Return rate % -> score. Fewer returns score higher.
const RETURN_RATE: &[(f64, f64)] =
    &[(2.0, 100.0), (5.0, 85.0), (10.0, 55.0), (20.0, 15.0), (35.0, 0.0)];

/// Supplier fulfilment time in days -> score.
const FULFILLMENT_DAYS: &[(f64, f64)] =
    &[(3.0, 100.0), (7.0, 80.0), (14.0, 55.0), (30.0, 20.0), (60.0, 0.0)];

/// Explicit complexity index (0-100, higher is harder) when present, otherwise
/// derived from the parcel weight with a penalty for fragile goods.
pub fn score_shipping_complexity(data: &ProductSignal) -> Option<f64> {
    if let Some(complexity) = data.number("logistics", "shipping_complexity") {
        return Some((100.0 - complexity).clamp(0.0, 100.0));
    }

    let weight = data
        .number("logistics", "weight_kg")
        .or_else(|| data.number("basic_info", "weight_kg"))?;
    let fragile = data
        .section("logistics")
        .and_then(|logistics| logistics.get("fragile"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let score = piecewise(weight, WEIGHT_KG);
    Some(if fragile { (score - FRAGILE_PENALTY).max(0.0) } else { score })
}

pub fn score_return_rate(data: &ProductSignal) -> Option<f64> {
    let rate = data
        .number("performance", "return_rate")
        .or_else(|| data.number("marketplace", "return_rate"))?;
    Some(piecewise(rate, RETURN_RATE))
}

/// Blends the supplier rating (0-5) with the on-time delivery rate; falls back
/// to fulfilment time when neither is reported.
pub fn score_supplier_reliability(data: &ProductSignal) -> Option<f64> {
    let rating = data.number("supplier", "rating").map(|rating| rating.clamp(0.0, 5.0) * 20.0);
    let on_time =
        data.number("supplier", "on_time_delivery_rate").map(|rate| rate.clamp(0.0, 100.0));

    mean_present(&[rating, on_time]).or_else(|| {
        data.number("supplier", "fulfillment_days").map(|days| piecewise(days, FULFILLMENT_DAYS))
    })
}
