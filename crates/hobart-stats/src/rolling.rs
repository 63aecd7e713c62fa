//! Fixed-window rolling OLS.

use crate::error::StatsError;
use crate::ols::{CONST_NAME, add_constant, solve_coefficients};
use chrono::NaiveDate;
use ndarray::{Array1, Array2, s};
use serde::{Deserialize, Serialize};

/// Window length used when none is configured.
pub const DEFAULT_WINDOW: usize = 60;

/// Rolling regression of a series on an intercept plus regressors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingOls {
    window: usize,
}

impl Default for RollingOls {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}

/// Coefficients for every complete window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingOlsResult {
    /// Parameter names, intercept first.
    pub names: Vec<String>,
    /// Date of the last observation in each window.
    pub dates: Vec<NaiveDate>,
    /// Coefficients, one row per window (windows x params).
    pub params: Array2<f64>,
}

impl RollingOlsResult {
    /// Number of complete windows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// True when the sample was shorter than the window.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Coefficient path of a named parameter.
    pub fn series(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.names.iter().position(|n| n == name)?;
        Some(self.params.column(idx).to_vec())
    }
}

impl RollingOls {
    /// Create a rolling regression over `window` observations.
    pub const fn new(window: usize) -> Self {
        Self { window }
    }

    /// Configured window length.
    pub const fn window(&self) -> usize {
        self.window
    }

    /// Fit one regression per complete window.
    ///
    /// Windows that would start before the first observation are skipped, so
    /// a sample of `n` rows yields `n - window + 1` rows of coefficients and
    /// none when `n < window`.
    pub fn fit(
        &self,
        y: &Array1<f64>,
        regressors: &Array2<f64>,
        names: &[String],
        dates: &[NaiveDate],
    ) -> Result<RollingOlsResult, StatsError> {
        let n = y.len();
        if regressors.nrows() != n {
            return Err(StatsError::DimensionMismatch {
                expected: n,
                actual: regressors.nrows(),
            });
        }
        if dates.len() != n {
            return Err(StatsError::DimensionMismatch {
                expected: n,
                actual: dates.len(),
            });
        }
        if names.len() != regressors.ncols() {
            return Err(StatsError::DimensionMismatch {
                expected: regressors.ncols(),
                actual: names.len(),
            });
        }

        let k = regressors.ncols() + 1;
        if self.window < k {
            return Err(StatsError::InvalidParameter(format!(
                "window of {} is smaller than the {} parameters",
                self.window, k
            )));
        }

        let names: Vec<String> = std::iter::once(CONST_NAME.to_string())
            .chain(names.iter().cloned())
            .collect();

        if n < self.window {
            tracing::debug!(n, window = self.window, "sample shorter than rolling window");
            return Ok(RollingOlsResult {
                names,
                dates: Vec::new(),
                params: Array2::zeros((0, k)),
            });
        }

        let design = add_constant(regressors);
        let windows = n - self.window + 1;
        let mut params = Array2::zeros((windows, k));

        for start in 0..windows {
            let end = start + self.window;
            let x = design.slice(s![start..end, ..]).to_owned();
            let target = y.slice(s![start..end]).to_owned();
            let beta = solve_coefficients(&target, &x).map_err(|e| match e {
                StatsError::Singular(msg) => {
                    StatsError::Singular(format!("window ending {}: {msg}", dates[end - 1]))
                }
                other => other,
            })?;
            params.row_mut(start).assign(&beta);
        }

        Ok(RollingOlsResult {
            names,
            dates: dates[self.window - 1..].to_vec(),
            params,
        })
    }
}
