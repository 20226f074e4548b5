//! Rating values and the aggregate kept on every article

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ValidationError;

/// Lowest accepted rating
pub const MIN_RATING: u8 = 1;

/// Highest accepted rating
pub const MAX_RATING: u8 = 5;

/// Opaque user identifier, as forwarded by the upstream auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Validated star rating in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RatingValue(u8);

impl RatingValue {
    /// Create a rating from an integer.
    ///
    /// # Example
    /// ```
    /// use newsdesk_server::models::RatingValue;
    ///
    /// assert!(RatingValue::new(5).is_ok());
    /// assert!(RatingValue::new(0).is_err());
    /// assert!(RatingValue::new(6).is_err());
    /// ```
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < MIN_RATING as i64 || value > MAX_RATING as i64 {
            return Err(out_of_range());
        }
        Ok(Self(value as u8))
    }

    /// Create a rating from a raw JSON value.
    ///
    /// Accepts integral numbers (`4`, `4.0`) and numeric strings (`"4"`).
    /// Fractions, booleans and anything else are rejected.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ValidationError> {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Self::new(i);
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.is_finite() => Self::new(f as i64),
                    _ => Err(out_of_range()),
                }
            }
            serde_json::Value::String(s) => {
                let parsed = s.trim().parse::<i64>().map_err(|_| out_of_range())?;
                Self::new(parsed)
            }
            serde_json::Value::Null => Err(ValidationError::Empty { field: "rating" }),
            _ => Err(out_of_range()),
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

fn out_of_range() -> ValidationError {
    ValidationError::OutOfRange {
        field: "rating",
        min: MIN_RATING as i64,
        max: MAX_RATING as i64,
    }
}

/// One user's rating of an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user: UserId,
    pub rating: u8,
    pub created_at: DateTime<Utc>,
}

/// Derived rating aggregate: review count and mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub num_reviews: i64,
    pub average_rating: f64,
}

impl RatingSummary {
    /// Recompute the aggregate from the full rating list.
    pub fn from_ratings(ratings: &[Rating]) -> Self {
        if ratings.is_empty() {
            return Self::default();
        }
        let sum: i64 = ratings.iter().map(|r| r.rating as i64).sum();
        let count = ratings.len() as i64;
        Self {
            num_reviews: count,
            average_rating: sum as f64 / count as f64,
        }
    }
}

impl Default for RatingSummary {
    fn default() -> Self {
        Self {
            num_reviews: 0,
            average_rating: 0.0,
        }
    }
}
