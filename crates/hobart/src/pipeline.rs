//! End-to-end analysis runs.
//!
//! Both pipelines validate first, then fetch, reshape and fit. Data sources
//! are passed in by the caller.

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::request::{PcaRequest, RegressionRequest, ValidPca, ValidRegression};
use crate::returns::{PriceTable, ReturnSeries};
use hobart_data::{FactorDataSource, MarketDataSource};
use hobart_output::RegressionSummary;
use hobart_stats::{Pca, PcaResult, RollingOls, RollingOlsResult, fit_ols};

/// Regressand scale: returns are regressed in percent, like the factors.
const PERCENT: f64 = 100.0;

/// A completed PCA run.
#[derive(Debug, Clone)]
pub struct PcaOutcome {
    /// The validated request.
    pub request: ValidPca,
    /// The fit.
    pub result: PcaResult,
}

/// A completed factor regression run.
#[derive(Debug, Clone)]
pub struct RegressionOutcome {
    /// The validated request.
    pub request: ValidRegression,
    /// Portfolio minus benchmark, in fractional daily returns.
    pub active_returns: ReturnSeries,
    /// Full-sample fit.
    pub summary: RegressionSummary,
    /// Rolling coefficients.
    pub rolling: RollingOlsResult,
    /// Rolling window length.
    pub window: usize,
}

/// Principal components of the requested tickers' daily returns.
#[tracing::instrument(
    level = "info",
    skip_all,
    fields(tickers = ?request.tickers, k = request.n_components)
)]
pub async fn run_pca<M: MarketDataSource>(
    market: &M,
    request: &PcaRequest,
    config: &AnalysisConfig,
) -> Result<PcaOutcome, AnalysisError> {
    let valid = request.validate(config)?;

    let prices = market
        .fetch_prices(valid.tickers.as_slice(), &valid.range)
        .await?;
    let returns = PriceTable::from_long_frame(&prices)?.pct_change();
    tracing::debug!(rows = returns.len(), tickers = returns.tickers().len(), "return matrix");

    let result = Pca::with_config(valid.n_components, config.pca.engine_config()).fit(
        returns.values(),
        returns.tickers(),
        returns.dates(),
    )?;

    Ok(PcaOutcome {
        request: valid,
        result,
    })
}

/// Static and rolling Fama-French regression of a portfolio's active
/// returns.
///
/// When the benchmark is one of the portfolio tickers its returns are taken
/// from the portfolio fetch; otherwise it is fetched on its own.
#[tracing::instrument(
    level = "info",
    skip_all,
    fields(tickers = ?request.tickers, model = ?request.model)
)]
pub async fn run_factor_regression<M, F>(
    market: &M,
    factors: &F,
    request: &RegressionRequest,
    config: &AnalysisConfig,
) -> Result<RegressionOutcome, AnalysisError>
where
    M: MarketDataSource,
    F: FactorDataSource,
{
    let valid = request.validate(config)?;
    let tickers = valid.tickers.as_slice();
    let benchmark = config.benchmark.as_str();

    let prices = market.fetch_prices(tickers, &valid.range).await?;
    let mut returns = PriceTable::from_long_frame(&prices)?.pct_change();
    let portfolio = returns.portfolio(tickers, valid.weights.as_slice())?;

    let benchmark_returns = if valid.tickers.contains(benchmark) {
        tracing::debug!(benchmark, "reusing benchmark from portfolio prices");
        returns.pop(benchmark)
    } else {
        let prices = market
            .fetch_prices(&[benchmark.to_string()], &valid.range)
            .await?;
        PriceTable::from_long_frame(&prices)?
            .pct_change()
            .pop(benchmark)
    };
    let benchmark_returns =
        benchmark_returns.ok_or_else(|| AnalysisError::MissingBenchmark(benchmark.to_string()))?;

    let active_returns = portfolio.active_against(&benchmark_returns);

    let table = factors
        .fetch_factors(valid.model.dataset(), valid.range.start())
        .await?;
    let regressors = valid.model.regressors(config.regression.market_factor);
    let sample = active_returns.align_with(&table, &regressors)?;
    let y = &sample.y * PERCENT;

    let fit = fit_ols(&y, &sample.x, &sample.names)?;
    let window = config.regression.rolling_window;
    let rolling = RollingOls::new(window).fit(&y, &sample.x, &sample.names, &sample.dates)?;
    tracing::debug!(
        observations = fit.nobs,
        windows = rolling.len(),
        r_squared = fit.r_squared,
        "fitted factor regression"
    );

    Ok(RegressionOutcome {
        request: valid,
        active_returns,
        summary: RegressionSummary::new("Active Returns", fit),
        rolling,
        window,
    })
}
