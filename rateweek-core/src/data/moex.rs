//! Moscow Exchange ISS candle provider for LQDT on board TQTF.
//!
//! The ISS candles endpoint returns a column-oriented JSON table:
//!
//! ```text
//! {"candles": {"columns": ["open","close","high","low","value","volume","begin","end"],
//!              "data": [[1.5, 1.6, 1.7, 1.4, 100.0, 10, "2025-11-25 00:00:00", "..."]]}}
//! ```

use super::provider::{MarketDataProvider, ProviderError};
use super::sparse::SparseSeries;
use crate::calendar::DateRange;
use crate::config::MoexConfig;
use crate::domain::{Ohlcv, BOARD_TAG};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

const PROVIDER: &str = "MOEX ISS API";

const REQUIRED_COLUMNS: [&str; 6] = ["open", "high", "low", "close", "volume", "begin"];

/// ISS candles response.
#[derive(Debug, Deserialize)]
struct CandlesResponse {
    candles: Option<CandleTable>,
}

#[derive(Debug, Deserialize)]
struct CandleTable {
    columns: Vec<String>,
    data: Vec<Vec<Value>>,
}

/// MOEX daily candle provider.
pub struct MoexProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl MoexProvider {
    pub fn new(config: &MoexConfig) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::Connection {
                provider: PROVIDER.to_string(),
                detail: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Query parameters for a daily-interval request.
    pub fn query(range: &DateRange) -> [(&'static str, String); 3] {
        [
            ("from", range.start().to_string()),
            ("till", range.end().to_string()),
            ("interval", "24".to_string()),
        ]
    }
}

/// Parse the candle `begin` timestamp into a calendar date.
fn parse_begin(raw: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

/// A cell is either null (absent) or a number. Anything else is unparseable.
fn parse_number(cell: Option<&Value>) -> Result<Option<f64>, String> {
    match cell {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("unrepresentable number {n}")),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| format!("non-numeric value {s:?}")),
        Some(other) => Err(format!("unexpected value {other}")),
    }
}

/// Parse an ISS candles payload into a sparse candle series.
///
/// A missing `candles` section or required column is an error, as is a row
/// for a board other than TQTF. Rows with an unparseable date or value are
/// skipped with a warning. Negative values are passed through unchanged.
pub fn parse_candles(body: &str) -> Result<SparseSeries<Ohlcv>, ProviderError> {
    let resp: CandlesResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::malformed(PROVIDER, format!("invalid JSON: {e}")))?;

    let table = resp
        .candles
        .ok_or_else(|| ProviderError::malformed(PROVIDER, "missing candles section"))?;

    let index: HashMap<&str, usize> = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    for col in REQUIRED_COLUMNS {
        if !index.contains_key(col) {
            return Err(ProviderError::malformed(
                PROVIDER,
                format!("missing column {col}"),
            ));
        }
    }
    let board_col = index.get("boardid").copied();

    let mut series = SparseSeries::new();

    for row in &table.data {
        let cell = |name: &str| index.get(name).and_then(|&i| row.get(i));

        let Some(date) = cell("begin").and_then(Value::as_str).and_then(parse_begin) else {
            tracing::warn!(?row, "invalid candle date in MOEX response, skipping");
            continue;
        };

        if let Some(board) = board_col.and_then(|i| row.get(i)).and_then(Value::as_str) {
            if board != BOARD_TAG {
                return Err(ProviderError::malformed(
                    PROVIDER,
                    format!("got board {board}, expected {BOARD_TAG}"),
                ));
            }
        }

        let parsed = (|| {
            Ok::<_, String>(Ohlcv {
                open: parse_number(cell("open"))?,
                high: parse_number(cell("high"))?,
                low: parse_number(cell("low"))?,
                close: parse_number(cell("close"))?,
                volume: parse_number(cell("volume"))?,
            })
        })();

        match parsed {
            Ok(values) => {
                series.insert(date, values);
            }
            Err(reason) => {
                tracing::warn!(%date, %reason, "unparseable candle row, skipping");
            }
        }
    }

    Ok(series)
}

impl MarketDataProvider for MoexProvider {
    type Value = Ohlcv;

    fn name(&self) -> &str {
        PROVIDER
    }

    fn fetch(&self, range: &DateRange) -> Result<SparseSeries<Ohlcv>, ProviderError> {
        tracing::info!(start = %range.start(), end = %range.end(), "requesting LQDT/TQTF candles");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&Self::query(range))
            .send()
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Http {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;
        let series = parse_candles(&body)?;

        tracing::info!(count = series.len(), "retrieved candles");
        Ok(series)
    }
}
