//! Data source traits consumed by the analysis pipeline.
//!
//! The pipeline only needs two things from the outside world: daily closes
//! for a set of tickers, and a published factor table. Both are modelled as
//! traits so callers choose the backing provider and tests can substitute
//! in-memory fixtures.

use crate::error::Result;
use crate::french::{FactorDataset, FactorTable};
use crate::range::DateRange;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::future::Future;

/// Provider of historical daily prices.
pub trait MarketDataSource {
    /// Fetch daily bars for `tickers` over `range`.
    ///
    /// The returned frame is in long format with at least the columns
    /// `symbol` (string), `date` (date) and `close` (f64), one row per
    /// ticker per trading day.
    fn fetch_prices(
        &self,
        tickers: &[String],
        range: &DateRange,
    ) -> impl Future<Output = Result<DataFrame>>;
}

/// Provider of published factor return series.
pub trait FactorDataSource {
    /// Fetch the daily factor table for `dataset` from `start` onwards.
    ///
    /// Values are in percent per day.
    fn fetch_factors(
        &self,
        dataset: FactorDataset,
        start: NaiveDate,
    ) -> impl Future<Output = Result<FactorTable>>;
}
