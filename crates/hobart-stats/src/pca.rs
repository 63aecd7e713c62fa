//! Principal component analysis of asset returns.
//!
//! Components are the leading eigenvectors of the sample covariance of the
//! return matrix. Each component is sign-normalised so that its
//! largest-magnitude loading is positive, which makes repeated fits on the
//! same data produce identical output.

use crate::error::StatsError;
use crate::linalg::{default_max_rotations, jacobi_eigendecomp, sample_covariance};
use chrono::NaiveDate;
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// PCA configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PcaConfig {
    /// Project mean-centred returns onto the components instead of raw
    /// returns when computing factor returns (default: false)
    pub center_projection: bool,

    /// Relative convergence tolerance of the eigensolver (default: 1e-14)
    pub tolerance: f64,
}

impl Default for PcaConfig {
    fn default() -> Self {
        Self {
            center_projection: false,
            tolerance: 1e-14,
        }
    }
}

/// Fitted principal component decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct PcaResult {
    /// Asset labels, one per input column.
    pub assets: Vec<String>,
    /// Observation dates, one per input row.
    pub dates: Vec<NaiveDate>,
    /// Variance captured by each retained component.
    pub explained_variance: Array1<f64>,
    /// Fraction of total variance captured by each retained component.
    pub explained_variance_ratio: Array1<f64>,
    /// Running sum of `explained_variance_ratio`.
    pub cumulative_variance_ratio: Array1<f64>,
    /// Component loadings, `k x assets`.
    pub components: Array2<f64>,
    /// Returns projected onto the components, `dates x k`.
    pub factor_returns: Array2<f64>,
    /// Loadings by asset, `assets x k`.
    pub factor_exposures: Array2<f64>,
}

impl PcaResult {
    /// A result with no components.
    pub fn empty() -> Self {
        Self {
            assets: Vec::new(),
            dates: Vec::new(),
            explained_variance: Array1::zeros(0),
            explained_variance_ratio: Array1::zeros(0),
            cumulative_variance_ratio: Array1::zeros(0),
            components: Array2::zeros((0, 0)),
            factor_returns: Array2::zeros((0, 0)),
            factor_exposures: Array2::zeros((0, 0)),
        }
    }

    /// Number of retained components.
    pub fn n_components(&self) -> usize {
        self.explained_variance_ratio.len()
    }

    /// Whether nothing was fitted.
    pub fn is_empty(&self) -> bool {
        self.n_components() == 0
    }

    /// Component labels `f1..fk`.
    pub fn factor_names(&self) -> Vec<String> {
        (1..=self.n_components()).map(|i| format!("f{i}")).collect()
    }
}

/// Principal component estimator with a fixed number of components.
#[derive(Debug, Clone)]
pub struct Pca {
    n_components: usize,
    config: PcaConfig,
}

impl Pca {
    /// Retain `n_components` components with the default configuration.
    pub fn new(n_components: usize) -> Self {
        Self::with_config(n_components, PcaConfig::default())
    }

    /// Retain `n_components` components with a custom configuration.
    pub const fn with_config(n_components: usize, config: PcaConfig) -> Self {
        Self {
            n_components,
            config,
        }
    }

    /// Fit on a `dates x assets` return matrix with no missing values.
    ///
    /// Zero components or an empty matrix yield [`PcaResult::empty`]
    /// without fitting.
    pub fn fit(
        &self,
        returns: &Array2<f64>,
        assets: &[String],
        dates: &[NaiveDate],
    ) -> Result<PcaResult, StatsError> {
        let (n_obs, n_assets) = returns.dim();
        let k = self.n_components;

        if k == 0 || n_obs == 0 || n_assets == 0 {
            return Ok(PcaResult::empty());
        }
        if assets.len() != n_assets {
            return Err(StatsError::DimensionMismatch {
                expected: n_assets,
                actual: assets.len(),
            });
        }
        if dates.len() != n_obs {
            return Err(StatsError::DimensionMismatch {
                expected: n_obs,
                actual: dates.len(),
            });
        }
        if k > n_assets {
            return Err(StatsError::InvalidParameter(format!(
                "{k} components requested from {n_assets} assets"
            )));
        }
        if returns.iter().any(|v| !v.is_finite()) {
            return Err(StatsError::Degenerate(
                "return matrix contains non-finite values".to_string(),
            ));
        }

        let (means, cov) = sample_covariance(returns)?;
        let decomp = jacobi_eigendecomp(
            &cov,
            default_max_rotations(n_assets),
            self.config.tolerance,
        )?;

        let eigenvalues = decomp.eigenvalues.mapv(|v| v.max(0.0));
        let total_variance: f64 = eigenvalues.sum();
        // Centring leaves rounding noise, so zero variance is judged
        // relative to the magnitude of the raw returns.
        let raw_scale = returns.mapv(|v| v * v).mean().unwrap_or(0.0);
        if total_variance <= f64::EPSILON * raw_scale * n_assets as f64 {
            return Err(StatsError::Degenerate(
                "returns have zero total variance".to_string(),
            ));
        }

        let mut components = decomp
            .eigenvectors
            .slice(ndarray::s![.., ..k])
            .t()
            .to_owned();
        for mut component in components.axis_iter_mut(Axis(0)) {
            let dominant = component
                .iter()
                .copied()
                .fold(0.0_f64, |acc, v| if v.abs() > acc.abs() { v } else { acc });
            if dominant < 0.0 {
                component.mapv_inplace(|v| -v);
            }
        }

        let explained_variance = eigenvalues.slice(ndarray::s![..k]).to_owned();
        let explained_variance_ratio = &explained_variance / total_variance;
        let cumulative_variance_ratio: Array1<f64> = explained_variance_ratio
            .iter()
            .scan(0.0, |acc, &r| {
                *acc += r;
                Some(*acc)
            })
            .collect();

        let factor_returns = if self.config.center_projection {
            (returns - &means).dot(&components.t())
        } else {
            returns.dot(&components.t())
        };
        let factor_exposures = components.t().to_owned();

        tracing::debug!(
            n_obs,
            n_assets,
            k,
            captured = cumulative_variance_ratio[k - 1],
            "fitted pca"
        );

        Ok(PcaResult {
            assets: assets.to_vec(),
            dates: dates.to_vec(),
            explained_variance,
            explained_variance_ratio,
            cumulative_variance_ratio,
            components,
            factor_returns,
            factor_exposures,
        })
    }
}
