//! Rateweek Core: trailing-week extraction of daily market series.
//!
//! Two independent pipelines share one shape:
//! - RUB/USD official rate from the Central Bank of Russia → Parquet
//! - LQDT/TQTF daily candles from the Moscow Exchange → XLSX
//!
//! Each run computes a seven-day calendar window, fetches a sparse series,
//! densifies it to one record per day (absent days become nulls), validates
//! the dense set, and only then writes a file.

pub mod calendar;
pub mod config;
pub mod data;
pub mod domain;
pub mod pipeline;
pub mod sink;
pub mod validate;

pub use calendar::DateRange;
pub use config::AppConfig;
pub use pipeline::{run_candles, run_rates, ExitStatus, RunError, RunReport};
pub use validate::{validate_candles, validate_rates, ValidationResult, Violation};
