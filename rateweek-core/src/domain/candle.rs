//! Daily OHLCV candle record for LQDT on board TQTF.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Instrument tag carried by every candle record.
pub const INSTRUMENT_TAG: &str = "LQDT";

/// Board tag carried by every candle record.
pub const BOARD_TAG: &str = "TQTF";

/// Candle values as delivered by the provider; any field may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Ohlcv {
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl Ohlcv {
    /// Field names paired with their values, in column order.
    pub fn fields(&self) -> [(&'static str, Option<f64>); 5] {
        [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_none())
    }
}

/// One calendar day of the candle series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandleRecord {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: Ohlcv,
    pub instrument: String,
    pub board: String,
}

impl CandleRecord {
    pub fn new(date: NaiveDate, values: Ohlcv) -> Self {
        Self {
            date,
            values,
            instrument: INSTRUMENT_TAG.to_string(),
            board: BOARD_TAG.to_string(),
        }
    }

    /// A record for a day with no trading: every value absent.
    pub fn empty(date: NaiveDate) -> Self {
        Self::new(date, Ohlcv::default())
    }
}
