//! Market data provider trait and structured error types.
//!
//! The MarketDataProvider trait abstracts over the upstream sources (the CBR
//! rate feed, the MOEX candle feed) so the pipeline can be driven by stubs in
//! tests. Providers return whatever dates the upstream has; densification and
//! validation happen above this trait.

use super::sparse::SparseSeries;
use crate::calendar::DateRange;
use thiserror::Error;

/// Structured error types for provider calls.
///
/// Every variant is terminal for the run; nothing here is retried.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network timeout while contacting {provider}")]
    Timeout { provider: String },

    #[error("unable to connect to {provider}: {detail}")]
    Connection { provider: String, detail: String },

    #[error("{provider} returned HTTP {status}")]
    Http { provider: String, status: u16 },

    #[error("invalid or malformed response from {provider}: {detail}")]
    Malformed { provider: String, detail: String },
}

/// Coarse classification the orchestrator maps to exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Network,
    Upstream,
    Malformed,
}

impl ProviderError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            Self::Timeout { .. } | Self::Connection { .. } => ProviderErrorKind::Network,
            Self::Http { .. } => ProviderErrorKind::Upstream,
            Self::Malformed { .. } => ProviderErrorKind::Malformed,
        }
    }

    /// Classify a transport-level reqwest error.
    pub(crate) fn from_reqwest(provider: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else if let Some(status) = e.status() {
            Self::Http {
                provider: provider.to_string(),
                status: status.as_u16(),
            }
        } else if e.is_connect() || e.is_request() {
            Self::Connection {
                provider: provider.to_string(),
                detail: e.to_string(),
            }
        } else {
            Self::Malformed {
                provider: provider.to_string(),
                detail: e.to_string(),
            }
        }
    }

    pub(crate) fn malformed(provider: &str, detail: impl Into<String>) -> Self {
        Self::Malformed {
            provider: provider.to_string(),
            detail: detail.into(),
        }
    }
}

/// Trait for upstream data sources.
///
/// Implementations make exactly one bounded-timeout request per call and
/// drop individually unparseable rows with a warning before returning.
pub trait MarketDataProvider: Send + Sync {
    /// Payload stored per date (a single rate, or a candle).
    type Value;

    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the raw series for a date range. The result may omit dates in
    /// the range and may include dates outside it.
    fn fetch(&self, range: &DateRange) -> Result<SparseSeries<Self::Value>, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds() {
        let timeout = ProviderError::Timeout {
            provider: "cbr".into(),
        };
        assert_eq!(timeout.kind(), ProviderErrorKind::Network);

        let http = ProviderError::Http {
            provider: "cbr".into(),
            status: 503,
        };
        assert_eq!(http.kind(), ProviderErrorKind::Upstream);
        assert_eq!(http.to_string(), "cbr returned HTTP 503");

        let bad = ProviderError::malformed("moex", "no candles section");
        assert_eq!(bad.kind(), ProviderErrorKind::Malformed);
        assert!(bad.to_string().contains("malformed"));
    }
}
