//! Integration tests for the run pipelines using stub providers and the
//! real file writers on a temporary directory.

use chrono::{NaiveDate, NaiveTime};
use polars::prelude::*;
use rateweek_core::calendar::DateRange;
use rateweek_core::data::{MarketDataProvider, ProviderError, SparseSeries};
use rateweek_core::domain::{CandleRecord, Ohlcv, RateRecord, RunMetadata};
use rateweek_core::sink::parquet::read_key_values;
use rateweek_core::sink::{
    CandleSink, NameClock, ParquetRateWriter, RateSink, SinkError, XlsxCandleWriter,
};
use rateweek_core::{run_candles, run_rates, ExitStatus, RunError};
use std::cell::Cell;
use std::path::{Path, PathBuf};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn today() -> NaiveDate {
    d(2025, 12, 1)
}

fn noon() -> NameClock {
    NameClock::pinned(NaiveTime::from_hms_opt(12, 0, 0).unwrap())
}

// ── Stubs ────────────────────────────────────────────────────────────

struct StubProvider<T> {
    result: fn() -> Result<SparseSeries<T>, ProviderError>,
}

impl<T> MarketDataProvider for StubProvider<T> {
    type Value = T;

    fn name(&self) -> &str {
        "stub"
    }

    fn fetch(&self, _range: &DateRange) -> Result<SparseSeries<T>, ProviderError> {
        (self.result)()
    }
}

/// Sink that records whether it was called and always fails with a
/// file-system error.
#[derive(Default)]
struct FailingSink {
    called: Cell<bool>,
}

impl RateSink for FailingSink {
    fn write(&self, _: &[RateRecord], _: &RunMetadata, dir: &Path) -> Result<PathBuf, SinkError> {
        self.called.set(true);
        Err(SinkError::Filesystem {
            path: dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

impl CandleSink for FailingSink {
    fn write(
        &self,
        _: &[CandleRecord],
        _: &DateRange,
        _: NaiveDate,
        dir: &Path,
    ) -> Result<PathBuf, SinkError> {
        self.called.set(true);
        Err(SinkError::Filesystem {
            path: dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

fn weekday_rates() -> Result<SparseSeries<f64>, ProviderError> {
    Ok(vec![
        (d(2025, 11, 24), 77.90),
        (d(2025, 11, 25), 78.50),
        (d(2025, 11, 26), 78.55),
        (d(2025, 11, 29), 78.60),
        (d(2025, 11, 30), 78.65),
        (d(2025, 12, 1), 78.70),
    ]
    .into_iter()
    .collect())
}

fn zero_rate() -> Result<SparseSeries<f64>, ProviderError> {
    Ok(vec![(d(2025, 11, 26), 0.0)].into_iter().collect())
}

fn timeout() -> Result<SparseSeries<f64>, ProviderError> {
    Err(ProviderError::Timeout {
        provider: "stub".into(),
    })
}

fn http_500() -> Result<SparseSeries<Ohlcv>, ProviderError> {
    Err(ProviderError::Http {
        provider: "stub".into(),
        status: 500,
    })
}

fn candles() -> Result<SparseSeries<Ohlcv>, ProviderError> {
    let row = Ohlcv {
        open: Some(1.80),
        high: Some(1.82),
        low: Some(1.79),
        close: Some(1.81),
        volume: Some(0.0),
    };
    Ok(vec![(d(2025, 11, 25), row), (d(2025, 11, 28), row)]
        .into_iter()
        .collect())
}

fn negative_open() -> Result<SparseSeries<Ohlcv>, ProviderError> {
    let row = Ohlcv {
        open: Some(-1.0),
        high: Some(1.82),
        low: Some(1.79),
        close: Some(1.81),
        volume: Some(10.0),
    };
    Ok(vec![(d(2025, 11, 27), row)].into_iter().collect())
}

// ── Rate pipeline ────────────────────────────────────────────────────

#[test]
fn rate_run_writes_dense_week_to_parquet() {
    let dir = tempfile::tempdir().unwrap();
    let provider = StubProvider {
        result: weekday_rates,
    };

    let report = run_rates(
        &provider,
        &ParquetRateWriter::with_clock(noon()),
        today(),
        dir.path(),
    )
    .unwrap();

    assert_eq!(report.records, 7);
    assert_eq!(report.missing_days, 2);
    assert_eq!(report.period, DateRange::trailing_week(today()));
    assert_eq!(
        report.path,
        dir.path()
            .join("rub_usd_2025-11-25_to_2025-12-01_2025-12-01_120000.parquet")
    );

    let file = std::fs::File::open(&report.path).unwrap();
    let df = ParquetReader::new(file).finish().unwrap();
    assert_eq!(df.height(), 7);
    let values = df
        .column("exchange_rate_value")
        .unwrap()
        .as_materialized_series()
        .f64()
        .unwrap()
        .clone();
    // 2025-11-24 was outside the window and must not appear
    assert_eq!(values.get(0), Some(78.50));
    assert_eq!(values.get(2), None);
    assert_eq!(values.get(3), None);
    assert_eq!(values.get(6), Some(78.70));

    let stored = read_key_values(&report.path).unwrap();
    let expected = [
        ("report_date", "2025-12-01"),
        ("period_start", "2025-11-25"),
        ("period_end", "2025-12-01"),
        ("data_source", "CBR"),
    ];
    for (key, value) in expected {
        assert!(
            stored.iter().any(|(k, v)| k == key && v == value),
            "missing {key}={value} in {stored:?}"
        );
    }
}

#[test]
fn rate_validation_failure_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let provider = StubProvider { result: zero_rate };
    let sink = FailingSink::default();

    let err = run_rates(&provider, &sink, today(), dir.path()).unwrap_err();

    assert!(matches!(err, RunError::Validation(_)));
    assert_eq!(err.exit_status(), ExitStatus::ValidationError);
    assert!(err.to_string().contains("2025-11-26"));
    assert!(!sink.called.get());
}

#[test]
fn rate_provider_timeout_is_network_error() {
    let dir = tempfile::tempdir().unwrap();
    let provider = StubProvider { result: timeout };
    let sink = FailingSink::default();

    let err = run_rates(&provider, &sink, today(), dir.path()).unwrap_err();

    assert_eq!(err.exit_status(), ExitStatus::NetworkError);
    assert!(!sink.called.get());
}

#[test]
fn sink_failure_is_distinct_from_bad_data() {
    let dir = tempfile::tempdir().unwrap();
    let provider = StubProvider {
        result: weekday_rates,
    };
    let sink = FailingSink::default();

    let err = run_rates(&provider, &sink, today(), dir.path()).unwrap_err();

    assert!(sink.called.get());
    assert_eq!(err.exit_status(), ExitStatus::FileSystemError);
}

// ── Candle pipeline ──────────────────────────────────────────────────

#[test]
fn candle_run_writes_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let provider = StubProvider { result: candles };

    let report = run_candles(
        &provider,
        &XlsxCandleWriter::with_clock(noon()),
        today(),
        dir.path(),
    )
    .unwrap();

    assert_eq!(report.records, 7);
    assert_eq!(report.missing_days, 5);
    assert!(report.path.exists());
    assert_eq!(
        report.path.file_name().unwrap().to_str().unwrap(),
        "lqdt_tqtf_2025-11-25_to_2025-12-01_2025-12-01_120000.xlsx"
    );
}

#[test]
fn negative_candle_value_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    let provider = StubProvider {
        result: negative_open,
    };
    let sink = FailingSink::default();

    let err = run_candles(&provider, &sink, today(), dir.path()).unwrap_err();

    assert_eq!(err.exit_status(), ExitStatus::ValidationError);
    let msg = err.to_string();
    assert!(msg.contains("open"), "{msg}");
    assert!(msg.contains("2025-11-27"), "{msg}");
    assert!(!sink.called.get());
}

#[test]
fn candle_http_error_is_api_error() {
    let dir = tempfile::tempdir().unwrap();
    let provider = StubProvider { result: http_500 };

    let err = run_candles(&provider, &XlsxCandleWriter::new(), today(), dir.path()).unwrap_err();

    assert_eq!(err.exit_status(), ExitStatus::ApiError);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
