//! Sparse series: upstream values keyed by calendar date.

use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Provider output: at most one value per date, no completeness guarantee.
///
/// Inserting a date that is already present replaces the earlier value
/// (last write wins) and logs a warning.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseSeries<T> {
    points: BTreeMap<NaiveDate, T>,
}

impl<T> SparseSeries<T> {
    pub fn new() -> Self {
        Self {
            points: BTreeMap::new(),
        }
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, date: NaiveDate, value: T) -> Option<T> {
        let previous = self.points.insert(date, value);
        if previous.is_some() {
            tracing::warn!(%date, "duplicate upstream date, keeping the later value");
        }
        previous
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&T> {
        self.points.get(date)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.points.keys().copied()
    }
}

impl<T> Default for SparseSeries<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(NaiveDate, T)> for SparseSeries<T> {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, T)>>(iter: I) -> Self {
        let mut series = Self::new();
        for (date, value) in iter {
            series.insert(date, value);
        }
        series
    }
}
