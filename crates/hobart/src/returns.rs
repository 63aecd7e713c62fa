//! Price tables and return series.
//!
//! Prices arrive as a long `symbol, date, close` frame and are reshaped to
//! a wide table with one column per ticker. Columns are sorted by symbol;
//! weights and benchmarks are always looked up by name, never by position.

use crate::error::AnalysisError;
use chrono::NaiveDate;
use hobart_data::{DataError, FactorTable};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

/// Days from 0001-01-01 to the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Wide table of closing prices.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    /// `prices[t][j]`: close of ticker `j` on date `t`, if it traded.
    prices: Vec<Vec<Option<f64>>>,
}

impl PriceTable {
    /// Pivot a long price frame into a wide table.
    ///
    /// The frame needs `symbol`, `date` and `close` columns. A repeated
    /// `(symbol, date)` pair keeps the last close.
    pub fn from_long_frame(frame: &DataFrame) -> Result<Self, AnalysisError> {
        let sorted = frame
            .clone()
            .lazy()
            .select([
                col("symbol").cast(DataType::String),
                col("date").cast(DataType::Date),
                col("close").cast(DataType::Float64),
            ])
            .sort(
                ["symbol", "date"],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()?;

        let symbols = sorted.column("symbol")?.str()?;
        let days = sorted.column("date")?.as_materialized_series().date()?;
        let closes = sorted.column("close")?.f64()?;

        let mut by_symbol: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        let mut all_dates = BTreeSet::new();
        for ((symbol, day), close) in symbols.into_iter().zip(days.into_iter()).zip(closes) {
            let (Some(symbol), Some(day)) = (symbol, day) else {
                continue;
            };
            let date = NaiveDate::from_num_days_from_ce_opt(day + UNIX_EPOCH_DAYS_FROM_CE)
                .ok_or_else(|| DataError::Parse(format!("date out of range: {day}")))?;
            all_dates.insert(date);
            let series = by_symbol.entry(symbol.to_string()).or_default();
            match close {
                Some(close) => {
                    series.insert(date, close);
                }
                None => {
                    series.remove(&date);
                }
            }
        }

        let tickers: Vec<String> = by_symbol.keys().cloned().collect();
        let dates: Vec<NaiveDate> = all_dates.into_iter().collect();
        let prices = dates
            .iter()
            .map(|date| {
                by_symbol
                    .values()
                    .map(|series| series.get(date).copied())
                    .collect()
            })
            .collect();

        tracing::debug!(tickers = tickers.len(), dates = dates.len(), "pivoted prices");

        Ok(Self {
            tickers,
            dates,
            prices,
        })
    }

    /// Ticker columns, sorted.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Trading dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Close of `ticker` on the `row`-th date.
    pub fn price(&self, row: usize, ticker: &str) -> Option<f64> {
        let col = self.tickers.iter().position(|t| t == ticker)?;
        self.prices.get(row).and_then(|r| r[col])
    }

    /// Period-over-period percentage change.
    ///
    /// The first date has no return and is dropped. Any later date on which
    /// some ticker's return is undefined (missing close on either side, or a
    /// non-finite ratio) is dropped as a whole.
    pub fn pct_change(&self) -> ReturnMatrix {
        let p = self.tickers.len();
        let mut dates = Vec::new();
        let mut values = Vec::new();

        for t in 1..self.dates.len() {
            let row: Option<Vec<f64>> = (0..p)
                .map(|j| {
                    let prev = self.prices[t - 1][j]?;
                    let curr = self.prices[t][j]?;
                    let r = curr / prev - 1.0;
                    r.is_finite().then_some(r)
                })
                .collect();
            if let Some(row) = row {
                dates.push(self.dates[t]);
                values.extend(row);
            }
        }

        let n = dates.len();
        let values =
            Array2::from_shape_vec((n, p), values).unwrap_or_else(|_| Array2::zeros((0, p)));
        ReturnMatrix {
            tickers: self.tickers.clone(),
            dates,
            values,
        }
    }
}

/// Daily returns, one column per ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnMatrix {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    values: Array2<f64>,
}

impl ReturnMatrix {
    /// Ticker columns.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// Dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Returns, `dates x tickers`.
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether there are no dates.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    fn index_of(&self, ticker: &str) -> Option<usize> {
        self.tickers.iter().position(|t| t == ticker)
    }

    /// Copy of one ticker's column.
    pub fn column(&self, ticker: &str) -> Option<ReturnSeries> {
        let idx = self.index_of(ticker)?;
        Some(ReturnSeries::new(
            ticker,
            self.dates.clone(),
            self.values.column(idx).to_vec(),
        ))
    }

    /// Remove a ticker's column and return it.
    pub fn pop(&mut self, ticker: &str) -> Option<ReturnSeries> {
        let idx = self.index_of(ticker)?;
        let series = self.column(ticker)?;
        let keep: Vec<usize> = (0..self.tickers.len()).filter(|&j| j != idx).collect();
        self.values = self.values.select(ndarray::Axis(1), &keep);
        self.tickers.remove(idx);
        Some(series)
    }

    /// Weighted sum of ticker returns, named `"Portfolio"`.
    ///
    /// Weights are matched to columns by ticker. A ticker listed more than
    /// once contributes the sum of its weights.
    pub fn portfolio(
        &self,
        tickers: &[String],
        weights: &[f64],
    ) -> Result<ReturnSeries, AnalysisError> {
        let mut column_weights = vec![0.0; self.tickers.len()];
        for (ticker, weight) in tickers.iter().zip(weights) {
            let idx = self
                .index_of(ticker)
                .ok_or_else(|| AnalysisError::MissingTicker(ticker.clone()))?;
            column_weights[idx] += weight;
        }
        let values = self.values.dot(&Array1::from(column_weights)).to_vec();
        Ok(ReturnSeries::new("Portfolio", self.dates.clone(), values))
    }
}

/// A named daily return series.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    name: String,
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

/// Dependent variable and regressors on shared dates.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSample {
    /// Shared dates, ascending.
    pub dates: Vec<NaiveDate>,
    /// Dependent variable.
    pub y: Array1<f64>,
    /// Regressors, `dates x names`.
    pub x: Array2<f64>,
    /// Regressor names.
    pub names: Vec<String>,
}

impl ReturnSeries {
    /// Create a series. `dates` must be ascending and parallel to `values`.
    pub fn new(name: impl Into<String>, dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            dates,
            values,
        }
    }

    /// Series name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dates, ascending.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the series has no observations.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `self - benchmark` on the dates both series share, named
    /// `"Active Returns"`.
    pub fn active_against(&self, benchmark: &Self) -> Self {
        let mut dates = Vec::new();
        let mut values = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.dates.len() && j < benchmark.dates.len() {
            match self.dates[i].cmp(&benchmark.dates[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dates.push(self.dates[i]);
                    values.push(self.values[i] - benchmark.values[j]);
                    i += 1;
                    j += 1;
                }
            }
        }
        Self::new("Active Returns", dates, values)
    }

    /// Join with factor columns on date.
    ///
    /// # Errors
    /// A missing factor column, or no date in common.
    pub fn align_with(
        &self,
        table: &FactorTable,
        factors: &[&str],
    ) -> Result<AlignedSample, AnalysisError> {
        table.require_columns(factors)?;
        let columns: Vec<usize> = factors
            .iter()
            .filter_map(|name| table.column_index(name))
            .collect();

        let mut dates = Vec::new();
        let mut y = Vec::new();
        let mut x = Vec::new();
        for (date, value) in self.dates.iter().zip(&self.values) {
            if let Some(row) = table.position(*date) {
                dates.push(*date);
                y.push(*value);
                x.extend(columns.iter().map(|&c| table.value(row, c)));
            }
        }

        if dates.is_empty() {
            return Err(AnalysisError::NoOverlap);
        }

        let n = dates.len();
        let x = Array2::from_shape_vec((n, columns.len()), x)
            .map_err(|e| DataError::Parse(e.to_string()))?;
        tracing::debug!(rows = n, factors = columns.len(), "aligned sample");

        Ok(AlignedSample {
            dates,
            y: Array1::from(y),
            x,
            names: factors.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn long_frame(rows: &[(&str, u32, Option<f64>)]) -> DataFrame {
        let symbols: Vec<&str> = rows.iter().map(|r| r.0).collect();
        let dates: Vec<NaiveDate> = rows.iter().map(|r| d(r.1)).collect();
        let closes: Vec<Option<f64>> = rows.iter().map(|r| r.2).collect();
        DataFrame::new(vec![
            Series::new("symbol".into(), symbols).into(),
            Series::new("date".into(), dates).into(),
            Series::new("close".into(), closes).into(),
        ])
        .unwrap()
    }

    fn table() -> PriceTable {
        PriceTable::from_long_frame(&long_frame(&[
            ("MSFT", 2, Some(100.0)),
            ("AAPL", 2, Some(10.0)),
            ("MSFT", 3, Some(110.0)),
            ("AAPL", 3, Some(11.0)),
            ("AAPL", 4, Some(9.9)),
            ("MSFT", 4, Some(99.0)),
        ]))
        .unwrap()
    }

    #[test]
    fn test_pivot_sorts_tickers_and_dates() {
        let prices = table();
        assert_eq!(prices.tickers(), &["AAPL", "MSFT"]);
        assert_eq!(prices.dates(), &[d(2), d(3), d(4)]);
        assert_eq!(prices.price(1, "MSFT"), Some(110.0));
    }

    #[test]
    fn test_pivot_keeps_last_duplicate() {
        let prices = PriceTable::from_long_frame(&long_frame(&[
            ("AAPL", 2, Some(10.0)),
            ("AAPL", 2, Some(12.0)),
        ]))
        .unwrap();
        assert_eq!(prices.price(0, "AAPL"), Some(12.0));
    }

    #[test]
    fn test_pct_change() {
        let returns = table().pct_change();
        assert_eq!(returns.dates(), &[d(3), d(4)]);
        assert_abs_diff_eq!(returns.values()[[0, 0]], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(returns.values()[[1, 1]], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_pct_change_is_idempotent() {
        let prices = table();
        assert_eq!(prices.pct_change(), prices.pct_change());
    }

    #[test]
    fn test_pct_change_drops_rows_with_gaps() {
        let prices = PriceTable::from_long_frame(&long_frame(&[
            ("AAPL", 2, Some(10.0)),
            ("AAPL", 3, Some(11.0)),
            ("AAPL", 4, Some(12.0)),
            ("AAPL", 5, Some(13.0)),
            ("MSFT", 2, Some(100.0)),
            ("MSFT", 4, Some(120.0)),
            ("MSFT", 5, Some(130.0)),
        ]))
        .unwrap();
        let returns = prices.pct_change();
        // 01-03 lacks MSFT, 01-04 lacks the MSFT close before it
        assert_eq!(returns.dates(), &[d(5)]);
    }

    #[test]
    fn test_portfolio_weights_follow_ticker_names() {
        let returns = table().pct_change();
        // input order differs from the sorted column order
        let tickers = vec!["MSFT".to_string(), "AAPL".to_string()];
        let portfolio = returns.portfolio(&tickers, &[0.75, 0.25]).unwrap();
        assert_eq!(portfolio.name(), "Portfolio");
        assert_abs_diff_eq!(portfolio.values()[0], 0.1, epsilon = 1e-12);

        let returns = PriceTable::from_long_frame(&long_frame(&[
            ("AAPL", 2, Some(10.0)),
            ("AAPL", 3, Some(12.0)),
            ("MSFT", 2, Some(10.0)),
            ("MSFT", 3, Some(10.0)),
        ]))
        .unwrap()
        .pct_change();
        let portfolio = returns.portfolio(&tickers, &[0.75, 0.25]).unwrap();
        assert_abs_diff_eq!(portfolio.values()[0], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_portfolio_duplicate_tickers_sum_weights() {
        let returns = PriceTable::from_long_frame(&long_frame(&[
            ("AAPL", 2, Some(10.0)),
            ("AAPL", 3, Some(12.0)),
            ("MSFT", 2, Some(10.0)),
            ("MSFT", 3, Some(10.0)),
        ]))
        .unwrap()
        .pct_change();
        let tickers = vec!["AAPL".to_string(), "AAPL".to_string(), "MSFT".to_string()];
        let portfolio = returns.portfolio(&tickers, &[0.25, 0.25, 0.5]).unwrap();
        assert_abs_diff_eq!(portfolio.values()[0], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_portfolio_missing_ticker() {
        let returns = table().pct_change();
        assert!(matches!(
            returns.portfolio(&["TSLA".to_string()], &[1.0]),
            Err(AnalysisError::MissingTicker(t)) if t == "TSLA"
        ));
    }

    #[test]
    fn test_pop_removes_column() {
        let mut returns = table().pct_change();
        let msft = returns.pop("MSFT").unwrap();
        assert_eq!(msft.name(), "MSFT");
        assert_eq!(returns.tickers(), &["AAPL"]);
        assert_eq!(returns.values().ncols(), 1);
        assert!(returns.pop("MSFT").is_none());
    }

    #[test]
    fn test_active_returns_inner_join() {
        let portfolio =
            ReturnSeries::new("Portfolio", vec![d(2), d(3), d(5)], vec![0.02, 0.01, 0.03]);
        let benchmark =
            ReturnSeries::new("SPY", vec![d(3), d(4), d(5)], vec![0.005, 0.0, 0.01]);
        let active = portfolio.active_against(&benchmark);
        assert_eq!(active.name(), "Active Returns");
        assert_eq!(active.dates(), &[d(3), d(5)]);
        assert_abs_diff_eq!(active.values()[0], 0.005, epsilon = 1e-12);
        assert_abs_diff_eq!(active.values()[1], 0.02, epsilon = 1e-12);
    }

    fn factors() -> FactorTable {
        FactorTable::new(
            vec![d(3), d(4), d(5)],
            vec!["Mkt-RF".into(), "SMB".into(), "HML".into(), "RF".into()],
            ndarray::array![
                [0.5, 0.1, -0.2, 0.02],
                [0.3, 0.2, -0.1, 0.02],
                [-0.4, -0.1, 0.3, 0.02]
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_align_with_factors() {
        let active =
            ReturnSeries::new("Active Returns", vec![d(2), d(3), d(5)], vec![0.1, 0.2, 0.3]);
        let sample = active.align_with(&factors(), &["SMB", "HML"]).unwrap();
        assert_eq!(sample.dates, vec![d(3), d(5)]);
        assert_eq!(sample.y.to_vec(), vec![0.2, 0.3]);
        assert_eq!(sample.x, ndarray::array![[0.1, -0.2], [-0.1, 0.3]]);
        assert_eq!(sample.names, vec!["SMB", "HML"]);
    }

    #[test]
    fn test_align_without_overlap() {
        let active = ReturnSeries::new("Active Returns", vec![d(10)], vec![0.1]);
        assert!(matches!(
            active.align_with(&factors(), &["SMB"]),
            Err(AnalysisError::NoOverlap)
        ));
    }

    #[test]
    fn test_align_missing_factor() {
        let active = ReturnSeries::new("Active Returns", vec![d(3)], vec![0.1]);
        assert!(matches!(
            active.align_with(&factors(), &["RMW"]),
            Err(AnalysisError::Data(_))
        ));
    }
}
