//! Request parsing and validation.
//!
//! Requests arrive as raw form fields. Validation runs every check before
//! any data is fetched and reports the first failure.

use crate::config::{AnalysisConfig, MarketFactor, WeightParsing};
use crate::error::AnalysisError;
use chrono::NaiveDate;
use derive_more::Display;
use hobart_data::{DateRange, FactorDataset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Input rejected with a message meant for the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Ticker or weight field missing or blank.
    #[error("Please enter valid ticker symbols and weights.")]
    MissingTickersOrWeights,

    /// No ticker survived parsing.
    #[error("Please enter at least one valid ticker symbol.")]
    NoTickers,

    /// A weight token is not a number (strict parsing only).
    #[error("Invalid weight value: {0}")]
    InvalidWeight(String),

    /// Ticker and weight lists differ in length.
    #[error("The number of tickers and weights must match.")]
    LengthMismatch {
        /// Number of tickers.
        tickers: usize,
        /// Number of weights.
        weights: usize,
    },

    /// Weights do not sum to one.
    #[error("The weights must sum to 1.")]
    WeightSum {
        /// Actual sum.
        sum: f64,
    },

    /// Start date falls after end date.
    #[error("The start date must not be after the end date.")]
    StartAfterEnd,

    /// Unknown factor model.
    #[error("Invalid model selected.")]
    InvalidModel(String),

    /// More components than tickers.
    #[error("Number of components exceeds number of tickers.")]
    TooManyComponents {
        /// Requested components.
        requested: usize,
        /// Distinct tickers available.
        tickers: usize,
    },

    /// Component count above the configured maximum.
    #[error("Number of components must be between 0 and {max}.")]
    ComponentsOutOfRange {
        /// Requested components.
        requested: usize,
        /// Configured maximum.
        max: usize,
    },
}

/// Fama-French factor model.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FactorModel {
    /// Three-factor model.
    #[display("FF3")]
    FF3,
    /// Five-factor model.
    #[display("FF5")]
    FF5,
}

impl FromStr for FactorModel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FF3" => Ok(Self::FF3),
            "FF5" => Ok(Self::FF5),
            other => Err(ValidationError::InvalidModel(other.to_string())),
        }
    }
}

impl FactorModel {
    /// Dataset carrying this model's factors.
    pub const fn dataset(&self) -> FactorDataset {
        match self {
            Self::FF3 => FactorDataset::ThreeFactorDaily,
            Self::FF5 => FactorDataset::FiveFactorDaily,
        }
    }

    /// Regressor columns, in design-matrix order.
    pub fn regressors(&self, market: MarketFactor) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(5);
        if market == MarketFactor::Include {
            names.push("Mkt-RF");
        }
        names.extend(["SMB", "HML"]);
        if *self == Self::FF5 {
            names.extend(["RMW", "CMA"]);
        }
        names
    }
}

/// Ordered, upper-cased ticker symbols. Duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerSpec(Vec<String>);

impl TickerSpec {
    /// Split a comma-separated field, trimming and upper-casing each symbol
    /// and dropping empty tokens.
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_uppercase)
                .collect(),
        )
    }

    /// Symbols in input order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of symbols, counting duplicates.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Number of different symbols.
    pub fn distinct_len(&self) -> usize {
        self.0.iter().collect::<BTreeSet<_>>().len()
    }

    /// Whether no symbol was given.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `symbol` is among the tickers.
    pub fn contains(&self, symbol: &str) -> bool {
        self.0.iter().any(|t| t == symbol)
    }
}

/// Portfolio weights, parallel to a [`TickerSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSpec(Vec<f64>);

impl WeightSpec {
    /// Split a comma-separated field into weights.
    ///
    /// Under [`WeightParsing::Lenient`] tokens that are not numbers are
    /// dropped with a warning; under [`WeightParsing::Strict`] the first
    /// such token is an error.
    pub fn parse(raw: &str, mode: WeightParsing) -> Result<Self, ValidationError> {
        let mut weights = Vec::new();
        for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.parse::<f64>() {
                Ok(w) => weights.push(w),
                Err(_) if mode == WeightParsing::Strict => {
                    return Err(ValidationError::InvalidWeight(token.to_string()));
                }
                Err(_) => tracing::warn!(token, "dropping weight that is not a number"),
            }
        }
        Ok(Self(weights))
    }

    /// Weights in input order.
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of weights.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no weight was given.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of the weights, accumulated left to right.
    pub fn sum(&self) -> f64 {
        self.0.iter().fold(0.0, |acc, w| acc + w)
    }
}

fn parse_date(raw: Option<&str>) -> Result<NaiveDate, AnalysisError> {
    let Some(value) = raw else {
        return Err(AnalysisError::DateParse {
            value: String::new(),
            source: None,
        });
    };
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| AnalysisError::DateParse {
        value: value.to_string(),
        source: Some(e),
    })
}

fn parse_range(start: Option<&str>, end: Option<&str>) -> Result<DateRange, AnalysisError> {
    let start = parse_date(start)?;
    let end = parse_date(end)?;
    DateRange::new(start, end).map_err(|_| ValidationError::StartAfterEnd.into())
}

fn is_blank(field: Option<&str>) -> bool {
    field.is_none_or(|s| s.trim().is_empty())
}

/// Raw Fama-French regression form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegressionRequest {
    /// Comma-separated tickers.
    pub tickers: Option<String>,
    /// Comma-separated weights.
    pub weights: Option<String>,
    /// `FF3` or `FF5`.
    pub model: Option<String>,
    /// Start date, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// End date, `YYYY-MM-DD`.
    pub end_date: Option<String>,
}

/// A regression request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRegression {
    /// Portfolio constituents.
    pub tickers: TickerSpec,
    /// Constituent weights.
    pub weights: WeightSpec,
    /// Factor model.
    pub model: FactorModel,
    /// Analysis period.
    pub range: DateRange,
}

impl RegressionRequest {
    /// Build a request with every field present.
    pub fn new(
        tickers: impl Into<String>,
        weights: impl Into<String>,
        model: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            tickers: Some(tickers.into()),
            weights: Some(weights.into()),
            model: Some(model.into()),
            start_date: Some(start_date.into()),
            end_date: Some(end_date.into()),
        }
    }

    /// Validate the form.
    ///
    /// Checks run in order: presence, weight parsing, length match, weight
    /// sum, dates, model.
    pub fn validate(&self, config: &AnalysisConfig) -> Result<ValidRegression, AnalysisError> {
        if is_blank(self.tickers.as_deref()) || is_blank(self.weights.as_deref()) {
            return Err(ValidationError::MissingTickersOrWeights.into());
        }
        let tickers = TickerSpec::parse(self.tickers.as_deref().unwrap_or_default());
        let weights = WeightSpec::parse(
            self.weights.as_deref().unwrap_or_default(),
            config.weight_parsing,
        )?;

        if tickers.len() != weights.len() {
            return Err(ValidationError::LengthMismatch {
                tickers: tickers.len(),
                weights: weights.len(),
            }
            .into());
        }

        let sum = weights.sum();
        if !config.weight_sum.accepts(sum) {
            return Err(ValidationError::WeightSum { sum }.into());
        }

        let range = parse_range(self.start_date.as_deref(), self.end_date.as_deref())?;

        let model: FactorModel = self.model.as_deref().unwrap_or_default().parse()?;

        Ok(ValidRegression {
            tickers,
            weights,
            model,
            range,
        })
    }
}

/// Raw PCA form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcaRequest {
    /// Comma-separated tickers.
    pub tickers: Option<String>,
    /// Components to retain.
    pub n_components: usize,
    /// Start date, `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// End date, `YYYY-MM-DD`.
    pub end_date: Option<String>,
}

/// A PCA request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPca {
    /// Tickers to decompose.
    pub tickers: TickerSpec,
    /// Components to retain.
    pub n_components: usize,
    /// Analysis period.
    pub range: DateRange,
}

impl PcaRequest {
    /// Build a request with every field present.
    pub fn new(
        tickers: impl Into<String>,
        n_components: usize,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            tickers: Some(tickers.into()),
            n_components,
            start_date: Some(start_date.into()),
            end_date: Some(end_date.into()),
        }
    }

    /// Validate the form.
    ///
    /// Checks run in order: tickers present, components within ticker
    /// count, dates, components within the configured maximum.
    pub fn validate(&self, config: &AnalysisConfig) -> Result<ValidPca, AnalysisError> {
        let tickers = TickerSpec::parse(self.tickers.as_deref().unwrap_or_default());
        if tickers.is_empty() {
            return Err(ValidationError::NoTickers.into());
        }
        if tickers.distinct_len() < self.n_components {
            return Err(ValidationError::TooManyComponents {
                requested: self.n_components,
                tickers: tickers.distinct_len(),
            }
            .into());
        }

        let range = parse_range(self.start_date.as_deref(), self.end_date.as_deref())?;

        let max = config.pca.max_components;
        if self.n_components > max {
            return Err(ValidationError::ComponentsOutOfRange {
                requested: self.n_components,
                max,
            }
            .into());
        }

        Ok(ValidPca {
            tickers,
            n_components: self.n_components,
            range,
        })
    }
}
