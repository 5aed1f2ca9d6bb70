//! XLSX writer for LQDT/TQTF candles.
//!
//! One sheet named `candles` with a header row and one row per day.
//! Absent values are left as empty cells.

use super::{candle_file_name, write_atomic, CandleSink, NameClock, SinkError};
use crate::calendar::DateRange;
use crate::domain::CandleRecord;
use chrono::NaiveDate;
use rust_xlsxwriter::{Workbook, XlsxError};
use std::path::{Path, PathBuf};

pub const HEADERS: [&str; 6] = ["Date", "Open", "High", "Low", "Close", "Volume"];

const SHEET_NAME: &str = "candles";

/// Writes candle records to a single-sheet workbook.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxCandleWriter {
    clock: NameClock,
}

impl XlsxCandleWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed time-of-day in generated file names.
    pub fn with_clock(clock: NameClock) -> Self {
        Self { clock }
    }
}

fn unexpected(e: XlsxError) -> SinkError {
    SinkError::Unexpected(format!("xlsx: {e}"))
}

/// Build the workbook bytes, rows in record order.
pub fn build_workbook(records: &[CandleRecord]) -> Result<Vec<u8>, SinkError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME).map_err(unexpected)?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet
            .write_string(0, col as u16, *header)
            .map_err(unexpected)?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet
            .write_string(row, 0, record.date.to_string())
            .map_err(unexpected)?;
        for (offset, (_, value)) in record.values.fields().iter().enumerate() {
            if let Some(value) = value {
                sheet
                    .write_number(row, (offset + 1) as u16, *value)
                    .map_err(unexpected)?;
            }
        }
    }

    workbook.save_to_buffer().map_err(unexpected)
}

impl CandleSink for XlsxCandleWriter {
    fn write(
        &self,
        records: &[CandleRecord],
        period: &DateRange,
        report_date: NaiveDate,
        output_dir: &Path,
    ) -> Result<PathBuf, SinkError> {
        if records.is_empty() {
            return Err(SinkError::InvalidMetadata(
                "no candle records to write".into(),
            ));
        }

        let bytes = build_workbook(records)?;
        let file_name = candle_file_name(period, report_date, self.clock.now());
        let path = write_atomic(output_dir, &file_name, &bytes)?;

        tracing::info!(path = %path.display(), rows = records.len(), "wrote xlsx file");
        Ok(path)
    }
}
