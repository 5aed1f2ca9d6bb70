//! Per-run metadata attached to the persisted rate file.

use crate::calendar::DateRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Source tag for the Central Bank of Russia rate series.
pub const CBR_SOURCE: &str = "CBR";

/// Created fresh for each run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub report_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub data_source: String,
}

impl RunMetadata {
    pub fn new(report_date: NaiveDate, period: &DateRange, data_source: impl Into<String>) -> Self {
        Self {
            report_date,
            period_start: period.start(),
            period_end: period.end(),
            data_source: data_source.into(),
        }
    }

    /// Key/value pairs as stored in file metadata; dates are ISO-8601.
    pub fn key_values(&self) -> Vec<(String, String)> {
        vec![
            ("report_date".into(), self.report_date.to_string()),
            ("period_start".into(), self.period_start.to_string()),
            ("period_end".into(), self.period_end.to_string()),
            ("data_source".into(), self.data_source.clone()),
        ]
    }
}
