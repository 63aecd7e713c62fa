//! Ordinary least squares with inference statistics.
//!
//! The design matrix always carries an intercept named [`CONST_NAME`] as
//! its first column, followed by the caller's regressors in order.

use crate::error::StatsError;
use crate::linalg::{condition_number, invert, solve_linear_system};
use ndarray::{Array1, Array2, Axis, concatenate};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, StudentsT};

/// Name given to the intercept column.
pub const CONST_NAME: &str = "const";

/// Fitted OLS model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsResult {
    /// Parameter names, intercept first.
    pub names: Vec<String>,
    /// Coefficient estimates.
    pub params: Vec<f64>,
    /// Standard errors of the estimates.
    pub std_errors: Vec<f64>,
    /// t-statistics.
    pub t_values: Vec<f64>,
    /// Two-sided p-values of the t-statistics.
    pub p_values: Vec<f64>,
    /// Lower bound of the 95% confidence interval.
    pub conf_lower: Vec<f64>,
    /// Upper bound of the 95% confidence interval.
    pub conf_upper: Vec<f64>,
    /// Residuals `y - X b`.
    pub residuals: Vec<f64>,
    /// Number of observations.
    pub nobs: usize,
    /// Model degrees of freedom (regressors excluding the intercept).
    pub df_model: f64,
    /// Residual degrees of freedom.
    pub df_resid: f64,
    /// Coefficient of determination.
    pub r_squared: f64,
    /// R-squared adjusted for degrees of freedom.
    pub adj_r_squared: f64,
    /// F-statistic of the joint test that all slopes are zero.
    pub f_statistic: f64,
    /// p-value of the F-statistic.
    pub f_p_value: f64,
    /// Gaussian log-likelihood.
    pub log_likelihood: f64,
    /// Akaike information criterion.
    pub aic: f64,
    /// Bayesian information criterion.
    pub bic: f64,
    /// Durbin-Watson statistic of the residuals.
    pub durbin_watson: f64,
    /// Skewness of the residuals.
    pub skew: f64,
    /// Kurtosis of the residuals (3 for a normal distribution).
    pub kurtosis: f64,
    /// Jarque-Bera normality statistic of the residuals.
    pub jarque_bera: f64,
    /// p-value of the Jarque-Bera statistic.
    pub jarque_bera_p_value: f64,
    /// Condition number of the design matrix.
    pub condition_number: f64,
}

impl OlsResult {
    /// Estimate for a named parameter.
    pub fn param(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.params[i])
    }
}

/// Prepend an intercept column of ones.
pub fn add_constant(regressors: &Array2<f64>) -> Array2<f64> {
    let ones = Array2::<f64>::ones((regressors.nrows(), 1));
    // Shapes agree on the row axis by construction.
    concatenate(Axis(1), &[ones.view(), regressors.view()])
        .unwrap_or_else(|_| Array2::zeros((regressors.nrows(), regressors.ncols() + 1)))
}

/// Least-squares coefficients of `y` on an intercept-bearing design matrix.
pub(crate) fn solve_coefficients(
    y: &Array1<f64>,
    design: &Array2<f64>,
) -> Result<Array1<f64>, StatsError> {
    let xtx = design.t().dot(design);
    let xty = design.t().dot(y);
    solve_linear_system(&xtx, &xty)
}

/// Regress `y` on an intercept plus the columns of `regressors`.
///
/// # Arguments
/// * `y` - Dependent variable (n,)
/// * `regressors` - Regressor matrix without intercept (n x p)
/// * `names` - One name per regressor column
///
/// # Errors
/// Dimension mismatches, fewer observations than parameters plus one, or a
/// singular design.
pub fn fit_ols(
    y: &Array1<f64>,
    regressors: &Array2<f64>,
    names: &[String],
) -> Result<OlsResult, StatsError> {
    let n = y.len();
    if regressors.nrows() != n {
        return Err(StatsError::DimensionMismatch {
            expected: n,
            actual: regressors.nrows(),
        });
    }
    if names.len() != regressors.ncols() {
        return Err(StatsError::DimensionMismatch {
            expected: regressors.ncols(),
            actual: names.len(),
        });
    }

    let design = add_constant(regressors);
    let k = design.ncols();
    if n <= k {
        return Err(StatsError::InsufficientData {
            required: k + 1,
            actual: n,
        });
    }

    let xtx = design.t().dot(&design);
    let params = solve_coefficients(y, &design)?;
    let xtx_inv = invert(&xtx)?;

    let fitted = design.dot(&params);
    let residuals = y - &fitted;

    let nobs = n as f64;
    let df_resid = (n - k) as f64;
    let df_model = (k - 1) as f64;

    let ssr: f64 = residuals.iter().map(|e| e * e).sum();
    let y_mean = y.mean().unwrap_or(0.0);
    let centered_tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();

    let r_squared = if centered_tss > 0.0 {
        1.0 - ssr / centered_tss
    } else {
        f64::NAN
    };
    let adj_r_squared = 1.0 - (nobs - 1.0) / df_resid * (1.0 - r_squared);

    let sigma2 = ssr / df_resid;
    let std_errors: Vec<f64> = xtx_inv
        .diag()
        .iter()
        .map(|v| (sigma2 * v).max(0.0).sqrt())
        .collect();

    let t_dist = StudentsT::new(0.0, 1.0, df_resid)
        .map_err(|e| StatsError::Distribution(e.to_string()))?;
    let t_crit = t_dist.inverse_cdf(0.975);

    let t_values: Vec<f64> = params
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| b / se)
        .collect();
    let p_values: Vec<f64> = t_values
        .iter()
        .map(|t| {
            if t.is_finite() {
                2.0 * t_dist.sf(t.abs())
            } else {
                f64::NAN
            }
        })
        .collect();
    let conf_lower = params
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| b - t_crit * se)
        .collect();
    let conf_upper = params
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| b + t_crit * se)
        .collect();

    let (f_statistic, f_p_value) = if df_model > 0.0 && r_squared.is_finite() {
        let f = (r_squared / df_model) / ((1.0 - r_squared) / df_resid);
        let f_dist = FisherSnedecor::new(df_model, df_resid)
            .map_err(|e| StatsError::Distribution(e.to_string()))?;
        let p = if f.is_finite() { f_dist.sf(f) } else { 0.0 };
        (f, p)
    } else {
        (f64::NAN, f64::NAN)
    };

    let log_likelihood = -nobs / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (ssr / nobs).ln() + 1.0);
    let aic = -2.0 * log_likelihood + 2.0 * k as f64;
    let bic = -2.0 * log_likelihood + nobs.ln() * k as f64;

    let diagnostics = ResidualDiagnostics::compute(residuals.as_slice().unwrap_or(&[]))?;

    let names: Vec<String> = std::iter::once(CONST_NAME.to_string())
        .chain(names.iter().cloned())
        .collect();

    Ok(OlsResult {
        names,
        params: params.to_vec(),
        std_errors,
        t_values,
        p_values,
        conf_lower,
        conf_upper,
        residuals: residuals.to_vec(),
        nobs: n,
        df_model,
        df_resid,
        r_squared,
        adj_r_squared,
        f_statistic,
        f_p_value,
        log_likelihood,
        aic,
        bic,
        durbin_watson: diagnostics.durbin_watson,
        skew: diagnostics.skew,
        kurtosis: diagnostics.kurtosis,
        jarque_bera: diagnostics.jarque_bera,
        jarque_bera_p_value: diagnostics.jarque_bera_p_value,
        condition_number: condition_number(&xtx).sqrt(),
    })
}

struct ResidualDiagnostics {
    durbin_watson: f64,
    skew: f64,
    kurtosis: f64,
    jarque_bera: f64,
    jarque_bera_p_value: f64,
}

impl ResidualDiagnostics {
    fn compute(residuals: &[f64]) -> Result<Self, StatsError> {
        let n = residuals.len() as f64;
        let ssr: f64 = residuals.iter().map(|e| e * e).sum();
        let diff_ss: f64 = residuals.windows(2).map(|w| (w[1] - w[0]).powi(2)).sum();
        let durbin_watson = if ssr > 0.0 { diff_ss / ssr } else { f64::NAN };

        let mean = residuals.iter().sum::<f64>() / n;
        let moment = |p: i32| residuals.iter().map(|e| (e - mean).powi(p)).sum::<f64>() / n;
        let m2 = moment(2);
        let (skew, kurtosis) = if m2 > 0.0 {
            (moment(3) / m2.powf(1.5), moment(4) / (m2 * m2))
        } else {
            (f64::NAN, f64::NAN)
        };

        let jarque_bera = n / 6.0 * (skew * skew + (kurtosis - 3.0).powi(2) / 4.0);
        let chi2 = ChiSquared::new(2.0).map_err(|e| StatsError::Distribution(e.to_string()))?;
        let jarque_bera_p_value = if jarque_bera.is_finite() {
            chi2.sf(jarque_bera)
        } else {
            f64::NAN
        };

        Ok(Self {
            durbin_watson,
            skew,
            kurtosis,
            jarque_bera,
            jarque_bera_p_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_add_constant_prepends_ones() {
        let x = array![[2.0], [3.0]];
        let design = add_constant(&x);
        assert_eq!(design, array![[1.0, 2.0], [1.0, 3.0]]);
    }

    #[test]
    fn test_exact_fit() {
        // y = 1 + 2a - b
        let x = array![[1.0, 0.0], [0.0, 1.0], [2.0, 1.0], [3.0, 5.0], [1.0, 1.0]];
        let y = x.map_axis(Axis(1), |r| 1.0 + 2.0 * r[0] - r[1]);
        let result = fit_ols(&y, &x, &names(&["a", "b"])).unwrap();

        assert_eq!(result.names, vec!["const", "a", "b"]);
        assert_abs_diff_eq!(result.params[0], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(result.param("a").unwrap(), 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(result.param("b").unwrap(), -1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(result.r_squared, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_simple_regression_statistics() {
        // Hand-checked simple regression: x = 1..5, y = [2, 4, 5, 4, 5]
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![2.0, 4.0, 5.0, 4.0, 5.0];
        let result = fit_ols(&y, &x, &names(&["x"])).unwrap();

        assert_abs_diff_eq!(result.params[0], 2.2, epsilon = 1e-10);
        assert_abs_diff_eq!(result.params[1], 0.6, epsilon = 1e-10);
        assert_abs_diff_eq!(result.r_squared, 0.6, epsilon = 1e-10);
        assert_eq!(result.nobs, 5);
        assert_abs_diff_eq!(result.df_resid, 3.0);
        assert_abs_diff_eq!(result.df_model, 1.0);
        // SSR = 2.4, sigma2 = 0.8, se(slope) = sqrt(0.8 / 10)
        assert_abs_diff_eq!(result.std_errors[1], (0.08_f64).sqrt(), epsilon = 1e-10);
        assert_abs_diff_eq!(result.f_statistic, 4.5, epsilon = 1e-10);
        assert!(result.conf_lower[1] < 0.6 && result.conf_upper[1] > 0.6);
        assert!(result.p_values[1] > 0.05 && result.p_values[1] < 0.2);
    }

    #[test]
    fn test_noisy_fit_recovers_coefficients() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 400;
        let mut x = Array2::zeros((n, 2));
        let mut y = Array1::zeros(n);
        for i in 0..n {
            let a: f64 = rng.gen_range(-1.0..1.0);
            let b: f64 = rng.gen_range(-1.0..1.0);
            x[[i, 0]] = a;
            x[[i, 1]] = b;
            y[i] = 0.05 + 0.7 * a - 0.3 * b + rng.gen_range(-0.1..0.1);
        }
        let result = fit_ols(&y, &x, &names(&["SMB", "HML"])).unwrap();
        assert_abs_diff_eq!(result.param("SMB").unwrap(), 0.7, epsilon = 0.02);
        assert_abs_diff_eq!(result.param("HML").unwrap(), -0.3, epsilon = 0.02);
        assert!(result.p_values[1] < 1e-6);
        assert!(result.durbin_watson > 1.5 && result.durbin_watson < 2.5);
        assert!(result.jarque_bera_p_value >= 0.0 && result.jarque_bera_p_value <= 1.0);
    }

    #[test]
    fn test_too_few_observations() {
        let x = array![[1.0, 2.0], [2.0, 1.0], [3.0, 3.0]];
        let y = array![1.0, 2.0, 3.0];
        assert!(matches!(
            fit_ols(&y, &x, &names(&["a", "b"])),
            Err(StatsError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_collinear_regressors_are_singular() {
        let x = array![[1.0, 2.0], [2.0, 4.0], [3.0, 6.0], [4.0, 8.0], [5.0, 10.0]];
        let y = array![1.0, 2.0, 2.5, 4.0, 5.5];
        assert!(matches!(
            fit_ols(&y, &x, &names(&["a", "b"])),
            Err(StatsError::Singular(_))
        ));
    }

    #[test]
    fn test_name_count_must_match() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 2.0, 3.0];
        assert!(matches!(
            fit_ols(&y, &x, &names(&["a", "b"])),
            Err(StatsError::DimensionMismatch { .. })
        ));
    }
}
