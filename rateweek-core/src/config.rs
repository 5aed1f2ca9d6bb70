//! Application configuration loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! [output]
//! dir = "reports"
//!
//! [cbr]
//! timeout_secs = 15
//!
//! [moex]
//! base_url = "https://iss.moex.com/iss/engines/stock/markets/shares/boards/TQTF/securities/LQDT/candles.json"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub output: OutputConfig,
    pub cbr: CbrConfig,
    pub moex: MoexConfig,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

/// Central Bank of Russia endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CbrConfig {
    pub base_url: String,
    /// CBR internal code for the currency; R01235 is USD.
    pub currency_code: String,
    pub timeout_secs: u64,
}

impl Default for CbrConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.cbr.ru/scripts/XML_dynamic.asp".into(),
            currency_code: "R01235".into(),
            timeout_secs: 15,
        }
    }
}

/// Moscow Exchange ISS endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoexConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for MoexConfig {
    fn default() -> Self {
        Self {
            base_url: "https://iss.moex.com/iss/engines/stock/markets/shares/boards/TQTF/securities/LQDT/candles.json".into(),
            timeout_secs: 15,
        }
    }
}
