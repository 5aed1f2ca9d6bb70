//! Densification: reconcile a sparse upstream series with the calendar window.
//!
//! Every day of the range gets exactly one record. Days the provider did not
//! publish get absent values (no interpolation, no carry-forward). Upstream
//! dates outside the range are dropped here and never reach validation.

use super::sparse::SparseSeries;
use crate::calendar::DateRange;
use crate::domain::{CandleRecord, Ohlcv, RateRecord};
use chrono::NaiveDate;

/// One `(date, value)` pair per day of `range`, ascending.
pub fn densify<T: Clone>(series: &SparseSeries<T>, range: &DateRange) -> Vec<(NaiveDate, Option<T>)> {
    let dropped = series.dates().filter(|d| !range.contains(*d)).count();
    if dropped > 0 {
        tracing::debug!(dropped, %range, "discarding upstream dates outside the window");
    }

    range
        .days()
        .map(|date| (date, series.get(&date).cloned()))
        .collect()
}

/// Dense RUB/USD records for the window.
pub fn densify_rates(series: &SparseSeries<f64>, range: &DateRange) -> Vec<RateRecord> {
    let records: Vec<RateRecord> = densify(series, range)
        .into_iter()
        .map(|(date, value)| RateRecord::new(date, value))
        .collect();

    let missing = records.iter().filter(|r| r.is_missing()).count();
    tracing::debug!(records = records.len(), missing, "densified rate series");
    records
}

/// Dense LQDT/TQTF candles for the window.
pub fn densify_candles(series: &SparseSeries<Ohlcv>, range: &DateRange) -> Vec<CandleRecord> {
    densify(series, range)
        .into_iter()
        .map(|(date, values)| match values {
            Some(v) => CandleRecord::new(date, v),
            None => CandleRecord::empty(date),
        })
        .collect()
}
