//! Errors surfaced by the analysis pipelines.

use crate::request::ValidationError;
use hobart_data::DataError;
use hobart_stats::StatsError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Message shown for every failure that is not a validation error.
pub const GENERIC_FAILURE: &str = "An error occurred while running the analysis.";

/// Any failure of a PCA or regression run.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input rejected before any data was fetched.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A date field was missing or not `YYYY-MM-DD`.
    #[error("Invalid date {value:?}: expected YYYY-MM-DD")]
    DateParse {
        /// The raw field value.
        value: String,
        /// Parser failure, absent when the field was missing.
        #[source]
        source: Option<chrono::ParseError>,
    },

    /// A data gateway failed.
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// A model could not be fitted.
    #[error("Fit error: {0}")]
    Fit(#[from] StatsError),

    /// Price frame could not be reshaped.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Active returns and factor data share no dates.
    #[error("No overlapping dates between active returns and factor data")]
    NoOverlap,

    /// The benchmark's series could not be found in the fetched prices.
    #[error("Benchmark {0} missing from price data")]
    MissingBenchmark(String),

    /// A requested ticker has no prices.
    #[error("Ticker {0} missing from price data")]
    MissingTicker(String),
}

impl AnalysisError {
    /// Whether the error came from input validation.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Text to show the user.
    ///
    /// Validation errors carry their own message; everything else collapses
    /// to [`GENERIC_FAILURE`].
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            _ => GENERIC_FAILURE.to_string(),
        }
    }

    /// The error and all of its sources joined with `": "`.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_passes_through() {
        let err = AnalysisError::from(ValidationError::LengthMismatch {
            tickers: 1,
            weights: 2,
        });
        assert!(err.is_validation());
        assert_eq!(
            err.user_message(),
            "The number of tickers and weights must match."
        );
    }

    #[test]
    fn test_other_errors_are_generic() {
        let err = AnalysisError::NoOverlap;
        assert!(!err.is_validation());
        assert_eq!(err.user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_chain_includes_sources() {
        let parse = chrono::NaiveDate::parse_from_str("2024-13-01", "%Y-%m-%d").unwrap_err();
        let err = AnalysisError::DateParse {
            value: "2024-13-01".to_string(),
            source: Some(parse),
        };
        let chain = err.chain();
        assert!(chain.starts_with("Invalid date \"2024-13-01\""));
        assert!(chain.matches(": ").count() >= 2);
    }
}
