//! Domain types: dense per-day records and per-run metadata.

pub mod candle;
pub mod metadata;
pub mod rate;

pub use candle::{CandleRecord, Ohlcv, BOARD_TAG, INSTRUMENT_TAG};
pub use metadata::{RunMetadata, CBR_SOURCE};
pub use rate::{RateRecord, RATE_SERIES_TAG};
