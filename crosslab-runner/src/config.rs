//! Serializable backtest configuration.
//!
//! A run is fully described by a [`BacktestConfig`]: ticker, date range, the
//! two SMA windows, and the evaluation parameters. It loads from a TOML file
//! with a `[backtest]` table; any field left out takes its default.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub const DEFAULT_SHORT_WINDOW: usize = 50;
pub const DEFAULT_LONG_WINDOW: usize = 200;
pub const DEFAULT_ANNUALIZATION_FACTOR: f64 = 252.0;

fn default_initial_capital() -> f64 {
    1.0
}

fn default_short_window() -> usize {
    DEFAULT_SHORT_WINDOW
}

fn default_long_window() -> usize {
    DEFAULT_LONG_WINDOW
}

fn default_annualization_factor() -> f64 {
    DEFAULT_ANNUALIZATION_FACTOR
}

/// True for a non-empty ticker of `A-Z`, `0-9`, `.`, `^`, `-` or `=`.
///
/// Tickers name cache files and artifact directories, so anything that could
/// act as a path separator or component is refused.
pub fn is_valid_ticker(ticker: &str) -> bool {
    !ticker.is_empty()
        && ticker
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '^' | '-' | '='))
        && ticker.chars().any(|c| c.is_ascii_alphanumeric())
}

/// Everything needed to reproduce one backtest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    pub ticker: String,
    /// Inclusive.
    pub start_date: NaiveDate,
    /// Inclusive.
    pub end_date: NaiveDate,
    #[serde(default = "default_short_window")]
    pub short_window: usize,
    #[serde(default = "default_long_window")]
    pub long_window: usize,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    /// Annualized.
    #[serde(default)]
    pub risk_free_rate: f64,
    #[serde(default = "default_annualization_factor")]
    pub annualization_factor: f64,
}

/// On-disk layout: the config lives under a `[backtest]` table.
#[derive(Debug, Serialize, Deserialize)]
struct ConfigFile {
    backtest: BacktestConfig,
}

impl BacktestConfig {
    /// A config with default windows and evaluation parameters.
    pub fn new(ticker: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            ticker: ticker.into(),
            start_date,
            end_date,
            short_window: DEFAULT_SHORT_WINDOW,
            long_window: DEFAULT_LONG_WINDOW,
            initial_capital: default_initial_capital(),
            risk_free_rate: 0.0,
            annualization_factor: DEFAULT_ANNUALIZATION_FACTOR,
        }
    }

    pub fn with_windows(mut self, short_window: usize, long_window: usize) -> Self {
        self.short_window = short_window;
        self.long_window = long_window;
        self
    }

    /// Parse and validate a TOML document with a `[backtest]` table.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(text)?;
        let mut config = file.backtest;
        config.ticker = config.ticker.trim().to_ascii_uppercase();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(&ConfigFile {
            backtest: self.clone(),
        })
        .map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Reject anything the pipeline would refuse, before any data is loaded.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker.trim().is_empty() {
            return Err(ConfigError::Invalid("ticker must not be empty".into()));
        }
        if !is_valid_ticker(&self.ticker) {
            return Err(ConfigError::Invalid(format!(
                "ticker '{}' may only contain A-Z, 0-9, '.', '^', '-' and '='",
                self.ticker
            )));
        }
        if self.start_date >= self.end_date {
            return Err(ConfigError::Invalid(format!(
                "start_date ({}) must be before end_date ({})",
                self.start_date, self.end_date
            )));
        }
        if self.short_window == 0 || self.long_window == 0 {
            return Err(ConfigError::Invalid("SMA windows must be >= 1".into()));
        }
        if self.short_window >= self.long_window {
            return Err(ConfigError::Invalid(format!(
                "short_window ({}) must be less than long_window ({})",
                self.short_window, self.long_window
            )));
        }
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if !self.risk_free_rate.is_finite() || self.risk_free_rate < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "risk_free_rate must be finite and non-negative, got {}",
                self.risk_free_rate
            )));
        }
        if !self.annualization_factor.is_finite() || self.annualization_factor <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "annualization_factor must be positive, got {}",
                self.annualization_factor
            )));
        }
        Ok(())
    }

    /// Deterministic hash of the configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json =
            serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample() -> BacktestConfig {
        BacktestConfig::new("SPY", d(2015, 1, 1), d(2024, 12, 31))
    }

    #[test]
    fn run_id_deterministic() {
        let config = sample();
        let id1 = config.run_id().unwrap();
        let id2 = config.run_id().unwrap();
        assert_eq!(id1, id2, "RunId should be deterministic");
        assert_eq!(id1.len(), 64);
    }

    #[test]
    fn run_id_changes_with_params() {
        let a = sample();
        let b = sample().with_windows(20, 200);
        assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
    }

    #[test]
    fn toml_defaults_fill_missing_fields() {
        let config = BacktestConfig::from_toml(
            r#"
            [backtest]
            ticker = "spy"
            start_date = "2015-01-01"
            end_date = "2024-12-31"
            "#,
        )
        .unwrap();
        assert_eq!(config.ticker, "SPY");
        assert_eq!(config.short_window, 50);
        assert_eq!(config.long_window, 200);
        assert_eq!(config.initial_capital, 1.0);
        assert_eq!(config.risk_free_rate, 0.0);
        assert_eq!(config.annualization_factor, 252.0);
    }

    #[test]
    fn toml_round_trip() {
        let mut config = sample().with_windows(20, 100);
        config.initial_capital = 10_000.0;
        config.risk_free_rate = 0.02;
        let text = config.to_toml().unwrap();
        assert!(text.contains("[backtest]"));
        assert_eq!(BacktestConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn missing_table_is_parse_error() {
        let err = BacktestConfig::from_toml("ticker = \"SPY\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let bad = [
            sample().with_windows(200, 50),
            sample().with_windows(50, 50),
            sample().with_windows(0, 50),
            BacktestConfig {
                initial_capital: 0.0,
                ..sample()
            },
            BacktestConfig {
                annualization_factor: -1.0,
                ..sample()
            },
            BacktestConfig {
                risk_free_rate: f64::NAN,
                ..sample()
            },
            BacktestConfig {
                risk_free_rate: -0.01,
                ..sample()
            },
            BacktestConfig {
                ticker: "  ".into(),
                ..sample()
            },
            BacktestConfig::new("SPY", d(2024, 1, 1), d(2024, 1, 1)),
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(ConfigError::Invalid(_))),
                "expected rejection: {config:?}"
            );
        }
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn ticker_must_be_path_safe() {
        for ticker in ["SPY", "BRK-B", "BRK.B", "^GSPC", "EURUSD=X", "7203.T"] {
            assert!(is_valid_ticker(ticker), "{ticker}");
            let config = BacktestConfig {
                ticker: ticker.into(),
                ..sample()
            };
            assert!(config.validate().is_ok(), "{ticker}");
        }
        for ticker in ["../etc", "SPY/QQQ", "a\\b", "spy", "SP Y", "..", "^", ""] {
            assert!(!is_valid_ticker(ticker), "{ticker}");
            let config = BacktestConfig {
                ticker: ticker.into(),
                ..sample()
            };
            assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))), "{ticker}");
        }
    }

    #[test]
    fn from_file_reports_path() {
        let err = BacktestConfig::from_file(Path::new("/nonexistent/crosslab.toml")).unwrap_err();
        match err {
            ConfigError::Io { path, .. } => assert!(path.ends_with("crosslab.toml")),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
