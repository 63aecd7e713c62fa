//! Text summary of a fitted regression.
//!
//! The layout follows the familiar econometrics table: a two-column header
//! of fit statistics, a coefficient table with 95% intervals and a block of
//! residual diagnostics.

use chrono::{DateTime, Utc};
use hobart_stats::OlsResult;
use serde::{Deserialize, Serialize};
use std::fmt;

const WIDTH: usize = 78;
const LEFT_COLUMN: usize = 38;
const RIGHT_COLUMN: usize = 37;

/// A regression result ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionSummary {
    /// Name of the dependent variable.
    pub dependent: String,
    /// When the model was fitted.
    pub fitted_at: DateTime<Utc>,
    /// The fitted model.
    pub result: OlsResult,
}

impl RegressionSummary {
    /// Wrap a fit, stamped with the current time.
    pub fn new(dependent: impl Into<String>, result: OlsResult) -> Self {
        Self {
            dependent: dependent.into(),
            fitted_at: Utc::now(),
            result,
        }
    }

    /// Replace the fit timestamp.
    pub const fn with_timestamp(mut self, fitted_at: DateTime<Utc>) -> Self {
        self.fitted_at = fitted_at;
        self
    }

    /// Render the summary table.
    pub fn to_text(&self) -> String {
        let r = &self.result;
        let mut out = String::new();

        out.push_str(&format!("{:^WIDTH$}\n", "OLS Regression Results"));
        out.push_str(&"=".repeat(WIDTH));
        out.push('\n');

        let header = [
            (
                ("Dep. Variable:", self.dependent.clone()),
                ("R-squared:", format_stat(r.r_squared, 3)),
            ),
            (
                ("Model:", "OLS".to_string()),
                ("Adj. R-squared:", format_stat(r.adj_r_squared, 3)),
            ),
            (
                ("Method:", "Least Squares".to_string()),
                ("F-statistic:", format_stat(r.f_statistic, 2)),
            ),
            (
                ("Date:", self.fitted_at.format("%a, %d %b %Y").to_string()),
                ("Prob (F-statistic):", format_prob(r.f_p_value)),
            ),
            (
                ("Time:", self.fitted_at.format("%H:%M:%S").to_string()),
                ("Log-Likelihood:", format_stat(r.log_likelihood, 2)),
            ),
            (
                ("No. Observations:", r.nobs.to_string()),
                ("AIC:", format_stat(r.aic, 1)),
            ),
            (
                ("Df Residuals:", format!("{:.0}", r.df_resid)),
                ("BIC:", format_stat(r.bic, 1)),
            ),
            (
                ("Df Model:", format!("{:.0}", r.df_model)),
                ("", String::new()),
            ),
            (
                ("Covariance Type:", "nonrobust".to_string()),
                ("", String::new()),
            ),
        ];
        for ((left_label, left_value), (right_label, right_value)) in header {
            out.push_str(&two_column_row(left_label, &left_value, right_label, &right_value));
        }

        out.push_str(&"=".repeat(WIDTH));
        out.push('\n');
        out.push_str(&format!(
            "{:<14}{:>10} {:>10} {:>10} {:>10} {:>10} {:>10}\n",
            "", "coef", "std err", "t", "P>|t|", "[0.025", "0.975]"
        ));
        out.push_str(&"-".repeat(WIDTH));
        out.push('\n');
        for (i, name) in r.names.iter().enumerate() {
            out.push_str(&format!(
                "{:<14}{:>10.4} {:>10.3} {:>10.3} {:>10.3} {:>10.3} {:>10.3}\n",
                truncate(name, 14),
                r.params[i],
                r.std_errors[i],
                r.t_values[i],
                r.p_values[i],
                r.conf_lower[i],
                r.conf_upper[i],
            ));
        }

        out.push_str(&"=".repeat(WIDTH));
        out.push('\n');
        let diagnostics = [
            (
                ("Durbin-Watson:", format_stat(r.durbin_watson, 3)),
                ("Jarque-Bera (JB):", format_stat(r.jarque_bera, 3)),
            ),
            (
                ("Skew:", format_stat(r.skew, 3)),
                ("Prob(JB):", format_prob(r.jarque_bera_p_value)),
            ),
            (
                ("Kurtosis:", format_stat(r.kurtosis, 3)),
                ("Cond. No.", format_stat(r.condition_number, 2)),
            ),
        ];
        for ((left_label, left_value), (right_label, right_value)) in diagnostics {
            out.push_str(&two_column_row(left_label, &left_value, right_label, &right_value));
        }
        out.push_str(&"=".repeat(WIDTH));
        out.push('\n');

        out
    }
}

impl fmt::Display for RegressionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn two_column_row(left_label: &str, left: &str, right_label: &str, right: &str) -> String {
    let left_width = LEFT_COLUMN.saturating_sub(left_label.len());
    let right_width = RIGHT_COLUMN.saturating_sub(right_label.len());
    let row = format!("{left_label}{left:>left_width$}   {right_label}{right:>right_width$}");
    format!("{}\n", row.trim_end())
}

fn format_stat(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if value != 0.0 && (value.abs() >= 1e6 || value.abs() < 1e-3) {
        format!("{value:.2e}")
    } else {
        format!("{value:.decimals$}")
    }
}

fn format_prob(value: f64) -> String {
    if value.is_finite() && value > 0.0 && value < 1e-3 {
        format!("{value:.2e}")
    } else {
        format_stat(value, 3)
    }
}

fn truncate(name: &str, width: usize) -> &str {
    match name.char_indices().nth(width) {
        Some((idx, _)) => &name[..idx],
        None => name,
    }
}
