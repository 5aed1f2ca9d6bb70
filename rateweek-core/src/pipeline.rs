//! Run orchestration: window → fetch → densify → validate → write.
//!
//! Each run computes its window once, makes one provider call, and either
//! writes one file or stops at the first failure. Nothing is retried and
//! nothing is written after a failed validation.

use crate::calendar::DateRange;
use crate::data::{densify_candles, densify_rates, MarketDataProvider, ProviderError, ProviderErrorKind};
use crate::domain::{Ohlcv, RunMetadata, CBR_SOURCE};
use crate::sink::{CandleSink, RateSink, SinkError, SinkErrorKind};
use crate::validate::{validate_candles, validate_rates, Violation};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Process-level outcome of a run. Exactly one per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    ApiError,
    NetworkError,
    InvalidData,
    FileSystemError,
    ValidationError,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::ApiError => 1,
            Self::NetworkError => 2,
            Self::InvalidData => 3,
            Self::FileSystemError => 4,
            Self::ValidationError => 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("data validation failed: {0}")]
    Validation(Violation),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl From<Violation> for RunError {
    fn from(v: Violation) -> Self {
        Self::Validation(v)
    }
}

impl RunError {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Self::Provider(e) => match e.kind() {
                ProviderErrorKind::Network => ExitStatus::NetworkError,
                ProviderErrorKind::Upstream => ExitStatus::ApiError,
                ProviderErrorKind::Malformed => ExitStatus::InvalidData,
            },
            Self::Validation(_) => ExitStatus::ValidationError,
            Self::Sink(e) => match e.kind() {
                SinkErrorKind::Filesystem | SinkErrorKind::Unexpected => {
                    ExitStatus::FileSystemError
                }
                SinkErrorKind::InvalidMetadata => ExitStatus::InvalidData,
            },
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub path: PathBuf,
    pub period: DateRange,
    pub records: usize,
    /// Days with no upstream data, written as nulls.
    pub missing_days: usize,
}

/// RUB/USD rate run: trailing week ending `today`, written as Parquet.
pub fn run_rates(
    provider: &dyn MarketDataProvider<Value = f64>,
    sink: &dyn RateSink,
    today: NaiveDate,
    output_dir: &Path,
) -> Result<RunReport, RunError> {
    let period = DateRange::trailing_week(today);
    tracing::info!(%period, provider = provider.name(), "extracting exchange rates");

    let series = provider.fetch(&period).inspect_err(|e| {
        tracing::error!(error = %e, "provider call failed");
    })?;
    let records = densify_rates(&series, &period);

    validate_rates(&records, &period)
        .into_result()
        .inspect_err(|v| tracing::error!(reason = %v, "rate validation failed"))?;

    let metadata = RunMetadata::new(today, &period, CBR_SOURCE);
    let path = sink
        .write(&records, &metadata, output_dir)
        .inspect_err(|e| tracing::error!(error = %e, "writing rate file failed"))?;

    Ok(RunReport {
        path,
        period,
        records: records.len(),
        missing_days: records.iter().filter(|r| r.is_missing()).count(),
    })
}

/// LQDT/TQTF candle run: trailing week ending `today`, written as XLSX.
pub fn run_candles(
    provider: &dyn MarketDataProvider<Value = Ohlcv>,
    sink: &dyn CandleSink,
    today: NaiveDate,
    output_dir: &Path,
) -> Result<RunReport, RunError> {
    let period = DateRange::trailing_week(today);
    tracing::info!(%period, provider = provider.name(), "extracting candles");

    let series = provider.fetch(&period).inspect_err(|e| {
        tracing::error!(error = %e, "provider call failed");
    })?;
    let records = densify_candles(&series, &period);

    validate_candles(&records, &period)
        .into_result()
        .inspect_err(|v| tracing::error!(reason = %v, "candle validation failed"))?;

    let path = sink
        .write(&records, &period, today, output_dir)
        .inspect_err(|e| tracing::error!(error = %e, "writing candle file failed"))?;

    Ok(RunReport {
        path,
        period,
        records: records.len(),
        missing_days: records.iter().filter(|r| r.values.is_empty()).count(),
    })
}
