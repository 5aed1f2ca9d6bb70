//! Parquet writer for the RUB/USD rate series.
//!
//! Schema: `date` (Date), `exchange_rate_value` (nullable Float64),
//! `currency_pair` (String). Run metadata (report_date, period_start,
//! period_end, data_source) is stored as Parquet key-value metadata.

use super::{rate_file_name, write_atomic, NameClock, RateSink, SinkError};
use crate::domain::{RateRecord, RunMetadata};
use chrono::NaiveDate;
use polars::prelude::*;
use polars_parquet::write::KeyValue;
use std::path::{Path, PathBuf};

/// Writes rate records to a single Parquet file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParquetRateWriter {
    clock: NameClock,
}

impl ParquetRateWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed time-of-day in generated file names.
    pub fn with_clock(clock: NameClock) -> Self {
        Self { clock }
    }
}

fn check_metadata(records: &[RateRecord], metadata: &RunMetadata) -> Result<(), SinkError> {
    if records.is_empty() {
        return Err(SinkError::InvalidMetadata("no rate records to write".into()));
    }
    if metadata.data_source.trim().is_empty() {
        return Err(SinkError::InvalidMetadata(
            "missing required metadata key: data_source".into(),
        ));
    }
    if metadata.period_start > metadata.period_end {
        return Err(SinkError::InvalidMetadata(format!(
            "period_start {} is after period_end {}",
            metadata.period_start, metadata.period_end
        )));
    }
    Ok(())
}

/// Convert rate records to a Polars DataFrame, preserving record order.
pub fn records_to_dataframe(records: &[RateRecord]) -> Result<DataFrame, SinkError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| SinkError::Unexpected("epoch date".into()))?;

    let dates: Vec<i32> = records
        .iter()
        .map(|r| (r.date - epoch).num_days() as i32)
        .collect();
    let values: Vec<Option<f64>> = records.iter().map(|r| r.value).collect();
    let pairs: Vec<&str> = records.iter().map(|r| r.currency_pair.as_str()).collect();

    DataFrame::new(vec![
        Column::new("date".into(), dates)
            .cast(&DataType::Date)
            .map_err(|e| SinkError::Unexpected(format!("date cast: {e}")))?,
        Column::new("exchange_rate_value".into(), values),
        Column::new("currency_pair".into(), pairs),
    ])
    .map_err(|e| SinkError::Unexpected(format!("dataframe creation: {e}")))
}

/// Encode the frame as one Parquet file with the run metadata in the footer.
///
/// `ParquetWriter::finish` always closes the file without user metadata, so
/// the batched writer is driven by hand and the underlying file writer is
/// ended with the key-value pairs.
pub fn encode_parquet(mut df: DataFrame, metadata: &RunMetadata) -> Result<Vec<u8>, SinkError> {
    let parquet_err = |e: PolarsError| SinkError::Unexpected(format!("write parquet: {e}"));

    df.rechunk_mut();
    let key_values: Vec<KeyValue> = metadata
        .key_values()
        .into_iter()
        .map(|(key, value)| KeyValue::new(key, value))
        .collect();

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut batched = ParquetWriter::new(&mut buf)
            .batched(df.schema())
            .map_err(parquet_err)?;
        batched.write_batch(&df).map_err(parquet_err)?;
        let mut writer = batched
            .get_writer()
            .lock()
            .map_err(|_| SinkError::Unexpected("parquet writer lock poisoned".into()))?;
        writer.end(Some(key_values)).map_err(parquet_err)?;
    }
    Ok(buf)
}

/// Read the key-value pairs stored in a Parquet footer.
pub fn read_key_values(path: &Path) -> Result<Vec<(String, String)>, SinkError> {
    let file = std::fs::File::open(path).map_err(|e| SinkError::fs(path, e))?;
    let mut reader = ParquetReader::new(file);
    let metadata = reader
        .get_metadata()
        .map_err(|e| SinkError::Unexpected(format!("read parquet footer: {e}")))?;

    Ok(metadata
        .key_value_metadata()
        .iter()
        .flatten()
        .filter_map(|kv| kv.value.clone().map(|v| (kv.key.clone(), v)))
        .collect())
}

impl RateSink for ParquetRateWriter {
    fn write(
        &self,
        records: &[RateRecord],
        metadata: &RunMetadata,
        output_dir: &Path,
    ) -> Result<PathBuf, SinkError> {
        check_metadata(records, metadata)?;

        let df = records_to_dataframe(records)?;
        let buf = encode_parquet(df, metadata)?;

        let file_name = rate_file_name(metadata, self.clock.now());
        let path = write_atomic(output_dir, &file_name, &buf)?;

        tracing::info!(path = %path.display(), rows = records.len(), "wrote parquet file");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::DateRange;
    use crate::sink::SinkErrorKind;
    use chrono::NaiveTime;
    use std::fs;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn period() -> DateRange {
        DateRange::new(d(2025, 11, 25), d(2025, 12, 1)).unwrap()
    }

    fn sample_records() -> Vec<RateRecord> {
        let values = [Some(78.5), Some(78.55), None, None, Some(78.6), Some(78.65), Some(78.7)];
        period()
            .days()
            .zip(values)
            .map(|(date, v)| RateRecord::new(date, v))
            .collect()
    }

    fn writer() -> ParquetRateWriter {
        ParquetRateWriter::with_clock(NameClock::pinned(NaiveTime::from_hms_opt(12, 0, 0).unwrap()))
    }

    #[test]
    fn write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let meta = RunMetadata::new(d(2025, 12, 1), &period(), "CBR");

        let path = writer()
            .write(&sample_records(), &meta, dir.path())
            .unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "rub_usd_2025-11-25_to_2025-12-01_2025-12-01_120000.parquet"
        );

        let file = fs::File::open(&path).unwrap();
        let df = ParquetReader::new(file).finish().unwrap();
        assert_eq!(df.height(), 7);

        let values = df
            .column("exchange_rate_value")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .clone();
        assert_eq!(values.get(0), Some(78.5));
        assert_eq!(values.get(2), None);
        assert_eq!(values.get(3), None);
        assert_eq!(values.null_count(), 2);

        let pairs = df
            .column("currency_pair")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap();
        assert_eq!(pairs.get(6), Some("RUB/USD"));

        assert_eq!(df.column("date").unwrap().dtype(), &DataType::Date);
        let days = df
            .column("date")
            .unwrap()
            .cast(&DataType::Int32)
            .unwrap();
        let days = days.as_materialized_series().i32().unwrap().clone();
        let first = d(1970, 1, 1) + chrono::Duration::days(days.get(0).unwrap() as i64);
        assert_eq!(first, d(2025, 11, 25));
    }

    #[test]
    fn run_metadata_is_stored_in_footer() {
        let dir = tempfile::tempdir().unwrap();
        let meta = RunMetadata::new(d(2025, 12, 1), &period(), "CBR");

        let path = writer()
            .write(&sample_records(), &meta, dir.path())
            .unwrap();
        let stored = read_key_values(&path).unwrap();

        for (key, value) in meta.key_values() {
            let found = stored.iter().find(|(k, _)| *k == key);
            assert_eq!(found.map(|(_, v)| v.as_str()), Some(value.as_str()), "{key}");
        }
        let lookup = |key: &str| {
            stored
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };
        assert_eq!(lookup("report_date").as_deref(), Some("2025-12-01"));
        assert_eq!(lookup("period_start").as_deref(), Some("2025-11-25"));
        assert_eq!(lookup("period_end").as_deref(), Some("2025-12-01"));
        assert_eq!(lookup("data_source").as_deref(), Some("CBR"));
    }

    #[test]
    fn encoded_bytes_still_read_as_a_frame() {
        let meta = RunMetadata::new(d(2025, 12, 1), &period(), "CBR");
        let bytes = encode_parquet(records_to_dataframe(&sample_records()).unwrap(), &meta).unwrap();
        assert_eq!(&bytes[..4], b"PAR1");

        let df = ParquetReader::new(std::io::Cursor::new(bytes)).finish().unwrap();
        assert_eq!(df.height(), 7);
        assert_eq!(df.get_column_names().len(), 3);
    }

    #[test]
    fn empty_data_source_is_invalid_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let meta = RunMetadata::new(d(2025, 12, 1), &period(), "");
        let err = writer()
            .write(&sample_records(), &meta, dir.path())
            .unwrap_err();
        assert_eq!(err.kind(), SinkErrorKind::InvalidMetadata);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn empty_records_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let meta = RunMetadata::new(d(2025, 12, 1), &period(), "CBR");
        let err = writer().write(&[], &meta, dir.path()).unwrap_err();
        assert_eq!(err.kind(), SinkErrorKind::InvalidMetadata);
    }

    #[test]
    fn dataframe_preserves_order_and_nulls() {
        let df = records_to_dataframe(&sample_records()).unwrap();
        assert_eq!(df.height(), 7);
        assert_eq!(df.get_column_names().len(), 3);
        assert_eq!(
            df.column("exchange_rate_value").unwrap().null_count(),
            2
        );
    }
}
