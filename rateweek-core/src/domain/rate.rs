//! Daily RUB/USD exchange rate record.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Series tag carried by every rate record.
pub const RATE_SERIES_TAG: &str = "RUB/USD";

/// One calendar day of the rate series.
///
/// `value` is `None` on days the provider published nothing (weekends,
/// holidays). It is never zero-filled or carried forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub currency_pair: String,
}

impl RateRecord {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self {
            date,
            value,
            currency_pair: RATE_SERIES_TAG.to_string(),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }
}
