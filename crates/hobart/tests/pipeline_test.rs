//! End-to-end pipeline runs against in-memory data sources.

use chrono::{Duration, NaiveDate};
use hobart::data::{
    DataError, DateRange, FactorDataSource, FactorDataset, FactorTable, MarketDataSource,
};
use hobart::output::Trace;
use hobart::{
    AnalysisConfig, AnalysisError, MarketFactor, PcaRequest, RegressionRequest, Response,
    run_factor_regression, run_pca,
};
use ndarray::Array2;
use polars::prelude::*;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

const DAYS: usize = 150;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 2).unwrap()
}

fn day(i: usize) -> NaiveDate {
    start() + Duration::days(i as i64)
}

/// Daily factor values in percent.
fn factor_value(t: usize, k: usize) -> f64 {
    let t = t as f64;
    let k = k as f64;
    ((t * (0.7 + 0.45 * k)).sin() + 0.3 * (t * (1.9 + 0.2 * k)).cos()) * 0.8
}

fn factor_table() -> FactorTable {
    let names: Vec<String> = ["Mkt-RF", "SMB", "HML", "RMW", "CMA", "RF"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let values = Array2::from_shape_fn((DAYS, names.len()), |(t, k)| {
        if k == 5 { 0.02 } else { factor_value(t, k) }
    });
    FactorTable::new((0..DAYS).map(day).collect(), names, values).unwrap()
}

fn price_path(seed: usize) -> Vec<f64> {
    let mut price = 100.0;
    let mut path = vec![price];
    for t in 1..DAYS {
        let exposure = 0.3 + 0.2 * seed as f64;
        let r = 0.0004
            + exposure * factor_value(t, 0) / 100.0
            + 0.4 * factor_value(t, 1 + seed % 4) / 100.0
            + 0.002 * ((t * (seed + 3)) as f64).sin();
        price *= 1.0 + r;
        path.push(price);
    }
    path
}

#[derive(Default)]
struct FakeMarket {
    paths: HashMap<String, Vec<f64>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<Vec<String>>>,
}

impl FakeMarket {
    fn with_tickers(tickers: &[&str]) -> Self {
        let paths = tickers
            .iter()
            .enumerate()
            .map(|(i, t)| (t.to_string(), price_path(i)))
            .collect();
        Self {
            paths,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MarketDataSource for FakeMarket {
    async fn fetch_prices(
        &self,
        tickers: &[String],
        range: &DateRange,
    ) -> Result<DataFrame, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(tickers.to_vec());

        let mut symbols = Vec::new();
        let mut dates = Vec::new();
        let mut closes = Vec::new();
        for ticker in tickers {
            let Some(path) = self.paths.get(ticker) else {
                continue;
            };
            for (i, close) in path.iter().enumerate() {
                if range.contains(day(i)) {
                    symbols.push(ticker.clone());
                    dates.push(day(i));
                    closes.push(*close);
                }
            }
        }
        Ok(DataFrame::new(vec![
            Series::new("symbol".into(), symbols).into(),
            Series::new("date".into(), dates).into(),
            Series::new("close".into(), closes).into(),
        ])?)
    }
}

#[derive(Default)]
struct FakeFactors {
    calls: AtomicUsize,
    datasets: Mutex<Vec<FactorDataset>>,
}

impl FactorDataSource for FakeFactors {
    async fn fetch_factors(
        &self,
        dataset: FactorDataset,
        start: NaiveDate,
    ) -> Result<FactorTable, DataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.datasets.lock().unwrap().push(dataset);
        let table = factor_table().since(start);
        table.require_columns(dataset.columns())?;
        Ok(table)
    }
}

fn full_range() -> (String, String) {
    (start().to_string(), day(DAYS - 1).to_string())
}

fn regression(tickers: &str, weights: &str, model: &str) -> RegressionRequest {
    let (from, to) = full_range();
    RegressionRequest::new(tickers, weights, model, from, to)
}

#[tokio::test]
async fn test_pca_two_tickers() {
    let market = FakeMarket::with_tickers(&["AAPL", "MSFT"]);
    let (from, to) = full_range();
    let request = PcaRequest::new("AAPL,MSFT", 2, from, to);

    let outcome = run_pca(&market, &request, &AnalysisConfig::default())
        .await
        .unwrap();
    assert_eq!(market.calls(), 1);
    assert_eq!(outcome.result.n_components(), 2);
    assert_eq!(outcome.result.dates.len(), DAYS - 1);

    match Response::from(outcome) {
        Response::Pca { bar, line, scatter } => {
            assert_eq!(bar.traces[0].len(), 2);
            assert_eq!(line.traces[0].len(), 2);
            match &scatter.traces[0] {
                Trace::Scatter { text, .. } => assert_eq!(text, &vec!["AAPL", "MSFT"]),
                other => panic!("unexpected trace {other:?}"),
            }
        }
        other => panic!("unexpected response {other:?}"),
    }
}

#[tokio::test]
async fn test_pca_cumulative_variance_is_running_sum() {
    let market = FakeMarket::with_tickers(&["AAPL", "MSFT", "NVDA", "SPY"]);
    let (from, to) = full_range();
    let request = PcaRequest::new("aapl, msft, nvda, spy", 3, from, to);

    let outcome = run_pca(&market, &request, &AnalysisConfig::default())
        .await
        .unwrap();
    let ratio = &outcome.result.explained_variance_ratio;
    let cumulative = &outcome.result.cumulative_variance_ratio;
    let mut acc = 0.0;
    for i in 0..3 {
        acc += ratio[i];
        approx::assert_abs_diff_eq!(cumulative[i], acc, epsilon = 1e-12);
        if i > 0 {
            assert!(ratio[i] <= ratio[i - 1]);
        }
    }
}

#[tokio::test]
async fn test_pca_validation_happens_before_fetch() {
    let market = FakeMarket::with_tickers(&["AAPL"]);
    let (from, to) = full_range();
    let request = PcaRequest::new("AAPL", 2, from, to);

    let response =
        Response::from_result(run_pca(&market, &request, &AnalysisConfig::default()).await);
    assert_eq!(
        response,
        Response::Error {
            message: "Number of components exceeds number of tickers.".to_string(),
            show: true,
        }
    );
    assert_eq!(market.calls(), 0);
}

#[tokio::test]
async fn test_regression_length_mismatch() {
    let market = FakeMarket::with_tickers(&["AAPL", "SPY"]);
    let factors = FakeFactors::default();
    let request = regression("AAPL", "0.6,0.4", "FF3");

    let config = AnalysisConfig::default();
    let result = run_factor_regression(&market, &factors, &request, &config).await;
    let response = Response::from_result(result);
    assert_eq!(
        response,
        Response::Error {
            message: "The number of tickers and weights must match.".to_string(),
            show: true,
        }
    );
    assert_eq!(market.calls(), 0);
    assert_eq!(factors.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_regression_ff5_coefficients() {
    let market = FakeMarket::with_tickers(&["AAPL", "MSFT", "SPY"]);
    let factors = FakeFactors::default();
    let request = regression("AAPL,MSFT", "0.5,0.5", "FF5");

    let outcome = run_factor_regression(&market, &factors, &request, &AnalysisConfig::default())
        .await
        .unwrap();
    assert_eq!(
        outcome.summary.result.names,
        vec!["const", "SMB", "HML", "RMW", "CMA"]
    );
    assert_eq!(
        factors.datasets.lock().unwrap().as_slice(),
        &[FactorDataset::FiveFactorDaily]
    );
    assert_eq!(outcome.summary.result.nobs, DAYS - 1);
    assert_eq!(outcome.rolling.len(), DAYS - 1 - 59);

    let text = outcome.summary.to_text();
    for name in ["const", "SMB", "HML", "RMW", "CMA"] {
        assert!(text.lines().any(|l| l.starts_with(name)), "missing {name}");
    }

    match Response::from(outcome) {
        Response::Regression { rolling_chart, .. } => {
            assert_eq!(rolling_chart.traces.len(), 5);
            assert!(rolling_chart.traces.iter().all(|t| t.len() == DAYS - 60));
        }
        other => panic!("unexpected response {other:?}"),
    }
}

#[tokio::test]
async fn test_regression_with_market_factor() {
    let market = FakeMarket::with_tickers(&["AAPL", "SPY"]);
    let factors = FakeFactors::default();
    let request = regression("AAPL", "1", "FF3");
    let mut config = AnalysisConfig::default();
    config.regression.market_factor = MarketFactor::Include;

    let outcome = run_factor_regression(&market, &factors, &request, &config)
        .await
        .unwrap();
    assert_eq!(
        outcome.summary.result.names,
        vec!["const", "Mkt-RF", "SMB", "HML"]
    );
}

#[tokio::test]
async fn test_benchmark_in_portfolio_is_not_refetched() {
    let market = FakeMarket::with_tickers(&["AAPL", "SPY"]);
    let factors = FakeFactors::default();
    let request = regression("AAPL,SPY", "0.5,0.5", "FF3");

    let outcome = run_factor_regression(&market, &factors, &request, &AnalysisConfig::default())
        .await
        .unwrap();
    assert_eq!(market.calls(), 1);
    assert_eq!(outcome.active_returns.name(), "Active Returns");
    assert_eq!(outcome.active_returns.len(), DAYS - 1);
}

#[tokio::test]
async fn test_benchmark_fetched_separately() {
    let market = FakeMarket::with_tickers(&["AAPL", "MSFT", "SPY"]);
    let factors = FakeFactors::default();
    let request = regression("AAPL,MSFT", "0.5,0.5", "FF3");

    run_factor_regression(&market, &factors, &request, &AnalysisConfig::default())
        .await
        .unwrap();
    assert_eq!(market.calls(), 2);
    let requests = market.requests.lock().unwrap();
    assert_eq!(requests[1], vec!["SPY".to_string()]);
}

#[tokio::test]
async fn test_missing_benchmark_is_generic_failure() {
    let market = FakeMarket::with_tickers(&["AAPL"]);
    let factors = FakeFactors::default();
    let request = regression("AAPL", "1", "FF3");

    let config = AnalysisConfig::default();
    let result = run_factor_regression(&market, &factors, &request, &config).await;
    assert!(matches!(result, Err(AnalysisError::MissingBenchmark(ref b)) if b == "SPY"));
    match Response::from_result(result) {
        Response::Error { message, .. } => {
            assert_eq!(message, "An error occurred while running the analysis.");
        }
        other => panic!("unexpected response {other:?}"),
    }
}

#[tokio::test]
async fn test_short_history_gives_empty_rolling_chart() {
    let market = FakeMarket::with_tickers(&["AAPL", "SPY"]);
    let factors = FakeFactors::default();
    let request = RegressionRequest::new(
        "AAPL",
        "1",
        "FF3",
        start().to_string(),
        day(40).to_string(),
    );

    let outcome = run_factor_regression(&market, &factors, &request, &AnalysisConfig::default())
        .await
        .unwrap();
    assert_eq!(outcome.summary.result.nobs, 40);
    assert!(outcome.rolling.is_empty());
    match Response::from(outcome) {
        Response::Regression { rolling_chart, .. } => assert!(rolling_chart.is_placeholder()),
        other => panic!("unexpected response {other:?}"),
    }
}
