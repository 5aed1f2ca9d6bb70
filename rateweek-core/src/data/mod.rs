//! Upstream data: provider adapters, sparse series, densification.

pub mod cbr;
pub mod densify;
pub mod moex;
pub mod provider;
pub mod sparse;

pub use cbr::CbrProvider;
pub use densify::{densify, densify_candles, densify_rates};
pub use moex::MoexProvider;
pub use provider::{MarketDataProvider, ProviderError, ProviderErrorKind};
pub use sparse::SparseSeries;
