use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ProductId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Static catalog facts used for price and category reasoning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price: Decimal,
    /// Average customer rating on a 0-5 scale.
    #[serde(default)]
    pub rating: f64,
    /// Relative popularity on a 0-100 scale.
    #[serde(default)]
    pub popularity: f64,
}

impl ProductMetadata {
    pub fn new(
        id: impl Into<ProductId>,
        name: impl Into<String>,
        category: impl Into<String>,
        price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            price,
            rating: 0.0,
            popularity: 0.0,
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = rating;
        self
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = popularity;
        self
    }

    /// Blend of rating and popularity on a 0-100 scale.
    pub fn quality_score(&self) -> f64 {
        let rating = (self.rating.clamp(0.0, 5.0) / 5.0) * 100.0;
        let popularity = self.popularity.clamp(0.0, 100.0);
        0.5 * rating + 0.5 * popularity
    }
}
