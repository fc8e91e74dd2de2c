//! Product signal: the nested market/product data record handed to the scorer.
//!
//! Collectors populate any subset of the known sections. Missing sections and
//! missing fields are normal; a known section that is present but is not an
//! object is a contract violation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::DomainError;

/// Sections a collector may populate.
pub const KNOWN_SECTIONS: [&str; 9] = [
    "seo",
    "marketplace",
    "trends",
    "social",
    "supplier",
    "market",
    "basic_info",
    "logistics",
    "performance",
];

/// External data sources counted towards data completeness.
pub const DATA_SOURCES: [&str; 5] = ["seo", "marketplace", "trends", "social", "supplier"];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductSignal {
    fields: Map<String, Value>,
}

impl ProductSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a signal from arbitrary JSON. Fails when `value` is not an object
    /// or when a known section is neither an object nor null.
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        match value {
            Value::Object(fields) => {
                let signal = Self { fields };
                signal.validate()?;
                Ok(signal)
            }
            other => Err(DomainError::InvalidInput(format!(
                "product data must be a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        for section in KNOWN_SECTIONS {
            match self.fields.get(section) {
                None | Some(Value::Null) | Some(Value::Object(_)) => {}
                Some(_) => {
                    return Err(DomainError::MalformedSection {
                        section: section.to_owned(),
                        expected: "an object",
                    })
                }
            }
        }

        let trend_metrics = self.section("trends").and_then(|trends| trends.get("trend_metrics"));
        if let Some(metrics) = trend_metrics {
            if !matches!(metrics, Value::Object(_) | Value::Null) {
                return Err(DomainError::MalformedSection {
                    section: "trends.trend_metrics".to_owned(),
                    expected: "an object keyed by keyword",
                });
            }
        }

        Ok(())
    }

    pub fn with_section(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.fields.get(name).and_then(Value::as_object)
    }

    pub fn number(&self, section: &str, field: &str) -> Option<f64> {
        self.section(section).and_then(|fields| fields.get(field)).and_then(as_number)
    }

    pub fn text(&self, section: &str, field: &str) -> Option<&str> {
        self.section(section)
            .and_then(|fields| fields.get(field))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// True when the source section is present and not flagged with an error.
    pub fn has_source(&self, name: &str) -> bool {
        match self.section(name) {
            Some(fields) => !fields.get("error").map(is_truthy).unwrap_or(false),
            None => false,
        }
    }

    /// Per-keyword metric records under `trends.trend_metrics`, in key order.
    pub fn trend_metrics(&self) -> Vec<&Map<String, Value>> {
        self.section("trends")
            .and_then(|trends| trends.get("trend_metrics"))
            .and_then(Value::as_object)
            .map(|metrics| metrics.values().filter_map(Value::as_object).collect())
            .unwrap_or_default()
    }

    /// Mean of a numeric field across all trend keywords that report it.
    pub fn trend_metric_mean(&self, field: &str) -> Option<f64> {
        let values: Vec<f64> = self
            .trend_metrics()
            .into_iter()
            .filter_map(|metrics| metrics.get(field).and_then(as_number))
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }

    pub fn product_id(&self) -> Option<String> {
        self.text("basic_info", "id")
            .map(str::to_owned)
            .or_else(|| self.fields.get("product_id").and_then(scalar_to_string))
            .or_else(|| self.fields.get("id").and_then(scalar_to_string))
    }

    pub fn product_name(&self) -> Option<String> {
        self.text("basic_info", "name")
            .map(str::to_owned)
            .or_else(|| self.fields.get("name").and_then(scalar_to_string))
    }

    /// Niche tag used to pick a weighting profile.
    pub fn niche(&self) -> Option<&str> {
        self.text("basic_info", "niche").or_else(|| self.text("basic_info", "category"))
    }
}

impl TryFrom<Value> for ProductSignal {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Reads a JSON number, accepting numeric strings. Non-finite values are dropped.
pub fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Best-effort identity lookup for records that failed validation.
pub fn identity_of(value: &Value) -> (Option<String>, Option<String>) {
    let Some(fields) = value.as_object() else {
        return (None, None);
    };
    let basic = fields.get("basic_info").and_then(Value::as_object);
    let id = basic
        .and_then(|basic| basic.get("id"))
        .and_then(scalar_to_string)
        .or_else(|| fields.get("product_id").and_then(scalar_to_string))
        .or_else(|| fields.get("id").and_then(scalar_to_string));
    let name = basic
        .and_then(|basic| basic.get("name"))
        .and_then(scalar_to_string)
        .or_else(|| fields.get("name").and_then(scalar_to_string));
    (id, name)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
