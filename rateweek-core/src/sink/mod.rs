//! Sink writers: persist validated dense record sets to files.
//!
//! Writers serialize the whole file in memory, write it next to the target
//! as `*.tmp`, and rename it into place. A failed write leaves no partial
//! output file behind.

pub mod parquet;
pub mod xlsx;

pub use self::parquet::ParquetRateWriter;
pub use self::xlsx::XlsxCandleWriter;

use crate::calendar::DateRange;
use crate::domain::{CandleRecord, RateRecord, RunMetadata};
use chrono::{NaiveDate, NaiveTime};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("file system error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("unexpected error while writing: {0}")]
    Unexpected(String),
}

/// Coarse classification the orchestrator maps to exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkErrorKind {
    Filesystem,
    InvalidMetadata,
    Unexpected,
}

impl SinkError {
    pub fn kind(&self) -> SinkErrorKind {
        match self {
            Self::Filesystem { .. } => SinkErrorKind::Filesystem,
            Self::InvalidMetadata(_) => SinkErrorKind::InvalidMetadata,
            Self::Unexpected(_) => SinkErrorKind::Unexpected,
        }
    }

    fn fs(path: &Path, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Persists the rate series with its run metadata.
pub trait RateSink {
    fn write(
        &self,
        records: &[RateRecord],
        metadata: &RunMetadata,
        output_dir: &Path,
    ) -> Result<PathBuf, SinkError>;
}

/// Persists the candle series. Period and report date come as parameters,
/// there is no free-form metadata.
pub trait CandleSink {
    fn write(
        &self,
        records: &[CandleRecord],
        period: &DateRange,
        report_date: NaiveDate,
        output_dir: &Path,
    ) -> Result<PathBuf, SinkError>;
}

/// `rub_usd_{start}_to_{end}_{report}_{HHMMSS}.parquet`
pub fn rate_file_name(metadata: &RunMetadata, at: NaiveTime) -> String {
    format!(
        "rub_usd_{}_to_{}_{}_{}.parquet",
        metadata.period_start,
        metadata.period_end,
        metadata.report_date,
        at.format("%H%M%S")
    )
}

/// `lqdt_tqtf_{start}_to_{end}_{report}_{HHMMSS}.xlsx`
pub fn candle_file_name(period: &DateRange, report_date: NaiveDate, at: NaiveTime) -> String {
    format!(
        "lqdt_tqtf_{}_to_{}_{}_{}.xlsx",
        period.start(),
        period.end(),
        report_date,
        at.format("%H%M%S")
    )
}

/// Time-of-day used in file names: pinned for reproducible output, or the
/// local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameClock {
    pinned: Option<NaiveTime>,
}

impl NameClock {
    pub fn pinned(at: NaiveTime) -> Self {
        Self { pinned: Some(at) }
    }

    pub fn now(&self) -> NaiveTime {
        self.pinned
            .unwrap_or_else(|| chrono::Local::now().time())
    }
}

/// Write `bytes` to `dir/file_name` via a temporary file and rename.
pub(crate) fn write_atomic(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, SinkError> {
    fs::create_dir_all(dir).map_err(|e| SinkError::fs(dir, e))?;

    let path = dir.join(file_name);
    let tmp_path = dir.join(format!("{file_name}.tmp"));

    if let Err(e) = fs::write(&tmp_path, bytes) {
        let _ = fs::remove_file(&tmp_path);
        return Err(SinkError::fs(&tmp_path, e));
    }

    fs::rename(&tmp_path, &path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        SinkError::fs(&path, e)
    })?;

    Ok(path)
}
