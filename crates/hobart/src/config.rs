//! Analysis configuration.
//!
//! Every field has a default, so a partial JSON file only overrides what it
//! names:
//!
//! ```json
//! { "benchmark": "QQQ", "regression": { "market_factor": "include" } }
//! ```

use hobart_data::french::DEFAULT_BASE_URL;
use hobart_stats::{DEFAULT_WINDOW, PcaConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid configuration JSON.
    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// How the sum of portfolio weights is checked.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightSumRule {
    /// The floating-point sum must equal exactly 1.
    #[default]
    Exact,
    /// The sum may differ from 1 by at most the given amount.
    Tolerance(f64),
}

impl WeightSumRule {
    /// Whether `sum` satisfies the rule.
    pub fn accepts(&self, sum: f64) -> bool {
        match self {
            Self::Exact => sum == 1.0,
            Self::Tolerance(eps) => (sum - 1.0).abs() <= *eps,
        }
    }
}

/// Treatment of weight tokens that are not numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightParsing {
    /// Drop unparseable tokens and carry on.
    #[default]
    Lenient,
    /// Reject the request on the first unparseable token.
    Strict,
}

/// Whether the market excess return is a regressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketFactor {
    /// Regress on the size, value (and profitability, investment) factors
    /// only.
    #[default]
    Exclude,
    /// Also regress on `Mkt-RF`.
    Include,
}

/// Regression settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Observations per rolling window.
    pub rolling_window: usize,
    /// Market factor treatment.
    pub market_factor: MarketFactor,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            rolling_window: DEFAULT_WINDOW,
            market_factor: MarketFactor::default(),
        }
    }
}

/// PCA settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcaSettings {
    /// Largest number of components a request may ask for.
    pub max_components: usize,
    /// Project centred rather than raw returns onto the components.
    pub center_projection: bool,
}

impl Default for PcaSettings {
    fn default() -> Self {
        Self {
            max_components: 5,
            center_projection: false,
        }
    }
}

impl PcaSettings {
    /// Engine configuration for these settings.
    pub fn engine_config(&self) -> PcaConfig {
        PcaConfig {
            center_projection: self.center_projection,
            ..PcaConfig::default()
        }
    }
}

/// Data gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Delay between consecutive quote requests, in milliseconds.
    pub rate_limit_ms: u64,
    /// Root of the factor data library.
    pub french_base_url: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            rate_limit_ms: 250,
            french_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl DataConfig {
    /// Delay between consecutive quote requests.
    pub const fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }
}

/// Top-level configuration shared by both analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Ticker whose returns are subtracted to form active returns.
    pub benchmark: String,
    /// Weight sum rule.
    pub weight_sum: WeightSumRule,
    /// Weight token handling.
    pub weight_parsing: WeightParsing,
    /// Regression settings.
    pub regression: RegressionConfig,
    /// PCA settings.
    pub pca: PcaSettings,
    /// Data gateway settings.
    pub data: DataConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            benchmark: "SPY".to_string(),
            weight_sum: WeightSumRule::default(),
            weight_parsing: WeightParsing::default(),
            regression: RegressionConfig::default(),
            pca: PcaSettings::default(),
            data: DataConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
