//! Central Bank of Russia rate provider.
//!
//! Fetches the daily RUB/USD official rate from the `XML_dynamic.asp`
//! endpoint. The response is windows-1251 encoded XML with decimal commas:
//!
//! ```text
//! <ValCurs ID="R01235" ...>
//!   <Record Date="25.11.2025" Id="R01235"><Nominal>1</Nominal><Value>78,5000</Value></Record>
//! </ValCurs>
//! ```
//!
//! The bank publishes no record for weekends and holidays; those gaps are
//! left for the densifier.

use super::provider::{MarketDataProvider, ProviderError};
use super::sparse::SparseSeries;
use crate::calendar::DateRange;
use crate::config::CbrConfig;
use chrono::NaiveDate;
use std::time::Duration;

const PROVIDER: &str = "CBR API";

/// CBR daily rate provider.
pub struct CbrProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    currency_code: String,
}

impl CbrProvider {
    pub fn new(config: &CbrConfig) -> Result<Self, ProviderError> {
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
            currency_code: config.currency_code.clone(),
        })
    }

    /// Build the request URL. The endpoint expects `DD/MM/YYYY` dates.
    pub fn request_url(&self, range: &DateRange) -> String {
        format!(
            "{}?date_req1={}&date_req2={}&VAL_NM_RQ={}",
            self.base_url,
            range.start().format("%d/%m/%Y"),
            range.end().format("%d/%m/%Y"),
            self.currency_code
        )
    }
}

/// Decode a windows-1251 body into text.
pub fn decode_body(bytes: &[u8]) -> Result<String, ProviderError> {
    let (text, _, had_errors) = encoding_rs::WINDOWS_1251.decode(bytes);
    if had_errors {
        return Err(ProviderError::malformed(
            PROVIDER,
            "response is not valid windows-1251",
        ));
    }
    Ok(text.into_owned())
}

/// Parse the `ValCurs` document into a sparse rate series.
///
/// Individual records with a missing or unparseable date or value are
/// skipped with a warning. An unparseable document is an error.
pub fn parse_rates(xml: &str) -> Result<SparseSeries<f64>, ProviderError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| ProviderError::malformed(PROVIDER, format!("XML parse error: {e}")))?;

    let mut series = SparseSeries::new();

    for record in doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("Record"))
    {
        let Some(raw_date) = record.attribute("Date") else {
            tracing::warn!("record without Date attribute, skipping");
            continue;
        };

        let date = match NaiveDate::parse_from_str(raw_date, "%d.%m.%Y") {
            Ok(date) => date,
            Err(_) => {
                tracing::warn!(raw_date, "invalid date format in CBR response, skipping");
                continue;
            }
        };

        let Some(raw_value) = record
            .children()
            .find(|n| n.has_tag_name("Value"))
            .and_then(|n| n.text())
        else {
            tracing::warn!(%date, "no Value element, skipping");
            continue;
        };

        match raw_value.trim().replace(',', ".").parse::<f64>() {
            Ok(rate) => {
                series.insert(date, rate);
            }
            Err(_) => {
                tracing::warn!(%date, raw_value, "invalid rate value, skipping");
            }
        }
    }

    Ok(series)
}

impl MarketDataProvider for CbrProvider {
    type Value = f64;

    fn name(&self) -> &str {
        PROVIDER
    }

    fn fetch(&self, range: &DateRange) -> Result<SparseSeries<f64>, ProviderError> {
        let url = self.request_url(range);
        tracing::info!(start = %range.start(), end = %range.end(), "requesting exchange rates from CBR");

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Http {
                provider: PROVIDER.to_string(),
                status: status.as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;
        let series = parse_rates(&decode_body(&bytes)?)?;

        tracing::info!(count = series.len(), "retrieved exchange rates");
        Ok(series)
    }
}
