//! Presentation-facing response.

use crate::error::AnalysisError;
use crate::pipeline::{PcaOutcome, RegressionOutcome};
use hobart_output::{Chart, PcaCharts, pca_charts, rolling_coefficients_chart};
use serde::{Deserialize, Serialize};

/// What the presentation layer renders after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    /// Factor regression output.
    Regression {
        /// Text summary of the full-sample fit.
        summary: String,
        /// Rolling coefficient paths.
        rolling_chart: Chart,
    },
    /// PCA charts.
    Pca {
        /// Explained variance per component.
        bar: Chart,
        /// Cumulative explained variance.
        line: Chart,
        /// Exposures on the first two components.
        scatter: Chart,
    },
    /// A failure to show the user.
    Error {
        /// User-facing message.
        message: String,
        /// Whether the notification is visible.
        show: bool,
    },
}

impl Response {
    /// Map a pipeline result to a response.
    ///
    /// Non-validation errors are logged with their full source chain and
    /// shown with a generic message.
    pub fn from_result<T: Into<Self>>(result: Result<T, AnalysisError>) -> Self {
        match result {
            Ok(outcome) => outcome.into(),
            Err(err) => Self::from_error(&err),
        }
    }

    /// Response for a failed run.
    pub fn from_error(err: &AnalysisError) -> Self {
        if !err.is_validation() {
            tracing::error!(error = %err.chain(), "analysis failed");
        }
        Self::Error {
            message: err.user_message(),
            show: true,
        }
    }

    /// Whether the response reports a failure.
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }
}

impl From<PcaOutcome> for Response {
    fn from(outcome: PcaOutcome) -> Self {
        let PcaCharts { bar, line, scatter } = pca_charts(&outcome.result);
        Self::Pca { bar, line, scatter }
    }
}

impl From<RegressionOutcome> for Response {
    fn from(outcome: RegressionOutcome) -> Self {
        Self::Regression {
            summary: outcome.summary.to_text(),
            rolling_chart: rolling_coefficients_chart(&outcome.rolling),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GENERIC_FAILURE;
    use crate::request::ValidationError;

    #[test]
    fn test_validation_error_response() {
        let response =
            Response::from_result::<PcaOutcome>(Err(ValidationError::NoTickers.into()));
        assert_eq!(
            response,
            Response::Error {
                message: "Please enter at least one valid ticker symbol.".to_string(),
                show: true,
            }
        );
    }

    #[test]
    fn test_failure_response_is_generic() {
        let response = Response::from_result::<PcaOutcome>(Err(AnalysisError::NoOverlap));
        assert!(response.is_error());
        match response {
            Response::Error { message, show } => {
                assert_eq!(message, GENERIC_FAILURE);
                assert!(show);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_error_serializes_with_kind_tag() {
        let json = serde_json::to_string(&Response::from_error(&AnalysisError::NoOverlap)).unwrap();
        assert!(json.contains("\"kind\":\"error\""));
        assert!(json.contains("\"show\":true"));
    }
}
