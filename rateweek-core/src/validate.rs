//! Validation gates for densified record sets.
//!
//! Rules are applied in a fixed order and the first violation decides the
//! reported reason:
//!
//! 1. record count equals the expected day count
//! 2. per record, in order: date inside the period, date not seen before,
//!    value(s) acceptable, tag(s) match
//! 3. the set of dates equals the set of days in the period
//!
//! Rate values must be finite and strictly positive; candle values must be
//! finite and non-negative. Absent values always pass.

use crate::calendar::{DateRange, WINDOW_DAYS};
use crate::domain::{CandleRecord, RateRecord, BOARD_TAG, INSTRUMENT_TAG, RATE_SERIES_TAG};
use chrono::{Duration, NaiveDate};
use std::collections::BTreeSet;
use thiserror::Error;

/// The violated rule, with the offending date or value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("Expected {expected} records, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("Date {date} is outside the expected period {period}")]
    OutOfPeriod { date: NaiveDate, period: DateRange },

    #[error("Duplicate date found: {0}")]
    DuplicateDate(NaiveDate),

    #[error("Invalid {field} value for date {date}: {value}")]
    InvalidValue {
        field: &'static str,
        date: NaiveDate,
        value: f64,
    },

    #[error("Invalid {field}: {found}, expected {expected}")]
    WrongTag {
        field: &'static str,
        found: String,
        expected: &'static str,
    },

    #[error("Missing dates in records: {}", format_dates(.0))]
    MissingDates(Vec<NaiveDate>),
}

fn format_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(NaiveDate::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Outcome of a validation pass. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    violation: Option<Violation>,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.violation.is_none()
    }

    /// Human-readable reason, present only on failure.
    pub fn reason(&self) -> Option<String> {
        self.violation.as_ref().map(ToString::to_string)
    }

    pub fn violation(&self) -> Option<&Violation> {
        self.violation.as_ref()
    }

    pub fn into_result(self) -> Result<(), Violation> {
        match self.violation {
            None => Ok(()),
            Some(v) => Err(v),
        }
    }
}

impl From<Result<(), Violation>> for ValidationResult {
    fn from(r: Result<(), Violation>) -> Self {
        Self { violation: r.err() }
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn is_non_negative(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

fn check_tag(field: &'static str, found: &str, expected: &'static str) -> Result<(), Violation> {
    if found != expected {
        return Err(Violation::WrongTag {
            field,
            found: found.to_string(),
            expected,
        });
    }
    Ok(())
}

/// Shared per-record pass: period bounds and uniqueness. Returns the dates seen.
fn check_dates(
    dates: impl Iterator<Item = NaiveDate>,
    period: &DateRange,
    mut per_record: impl FnMut(usize) -> Result<(), Violation>,
) -> Result<BTreeSet<NaiveDate>, Violation> {
    let mut seen = BTreeSet::new();
    for (i, date) in dates.enumerate() {
        if !period.contains(date) {
            return Err(Violation::OutOfPeriod {
                date,
                period: *period,
            });
        }
        if !seen.insert(date) {
            return Err(Violation::DuplicateDate(date));
        }
        per_record(i)?;
    }
    Ok(seen)
}

/// Set equality between the dates seen and the days expected. For candles the
/// count, range and uniqueness rules already imply it; it stays as a backstop.
fn check_coverage(
    seen: &BTreeSet<NaiveDate>,
    expected: impl Iterator<Item = NaiveDate>,
) -> Result<(), Violation> {
    let expected: BTreeSet<NaiveDate> = expected.collect();
    if *seen != expected {
        let missing: Vec<NaiveDate> = expected.difference(seen).copied().collect();
        return Err(Violation::MissingDates(missing));
    }
    Ok(())
}

fn check_rates(records: &[RateRecord], period: &DateRange) -> Result<(), Violation> {
    let expected = WINDOW_DAYS as usize;
    if records.len() != expected {
        return Err(Violation::CountMismatch {
            expected,
            actual: records.len(),
        });
    }

    let seen = check_dates(records.iter().map(|r| r.date), period, |i| {
        let record = &records[i];
        if let Some(value) = record.value {
            if !is_positive(value) {
                return Err(Violation::InvalidValue {
                    field: "exchange rate",
                    date: record.date,
                    value,
                });
            }
        }
        check_tag("currency pair", &record.currency_pair, RATE_SERIES_TAG)
    })?;

    let start = period.start();
    check_coverage(&seen, (0..WINDOW_DAYS).map(|i| start + Duration::days(i)))
}

fn check_candles(records: &[CandleRecord], period: &DateRange) -> Result<(), Violation> {
    let expected = period.num_days();
    if records.len() != expected {
        return Err(Violation::CountMismatch {
            expected,
            actual: records.len(),
        });
    }

    let seen = check_dates(records.iter().map(|r| r.date), period, |i| {
        let record = &records[i];
        for (field, value) in record.values.fields() {
            if let Some(value) = value {
                if !is_non_negative(value) {
                    return Err(Violation::InvalidValue {
                        field,
                        date: record.date,
                        value,
                    });
                }
            }
        }
        check_tag("instrument", &record.instrument, INSTRUMENT_TAG)?;
        check_tag("board", &record.board, BOARD_TAG)
    })?;

    check_coverage(&seen, period.days())
}

/// Validate a dense RUB/USD record set against the seven-day window.
pub fn validate_rates(records: &[RateRecord], period: &DateRange) -> ValidationResult {
    check_rates(records, period).into()
}

/// Validate a dense LQDT/TQTF candle set. The expected count follows the
/// span of `period` rather than a fixed seven.
pub fn validate_candles(records: &[CandleRecord], period: &DateRange) -> ValidationResult {
    check_candles(records, period).into()
}
