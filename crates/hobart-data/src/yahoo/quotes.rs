//! Daily bars from Yahoo Finance.

use crate::error::{DataError, Result};
use crate::range::DateRange;
use crate::source::MarketDataSource;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use std::time::Duration;
use yahoo_finance_api as yahoo;

/// Default pause between consecutive ticker requests.
pub const DEFAULT_RATE_LIMIT: Duration = Duration::from_millis(250);

/// Yahoo Finance price gateway.
///
/// Issues one history request per distinct ticker, pausing between
/// requests. Any failed ticker fails the whole fetch.
pub struct YahooQuoteProvider {
    connector: yahoo::YahooConnector,
    rate_limit: Duration,
}

impl std::fmt::Debug for YahooQuoteProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooQuoteProvider")
            .field("rate_limit", &self.rate_limit)
            .finish_non_exhaustive()
    }
}

impl YahooQuoteProvider {
    /// Provider with [`DEFAULT_RATE_LIMIT`].
    pub fn new() -> Result<Self> {
        Self::with_rate_limit(DEFAULT_RATE_LIMIT)
    }

    /// Provider pausing `rate_limit` between tickers.
    pub fn with_rate_limit(rate_limit: Duration) -> Result<Self> {
        Ok(Self {
            connector: yahoo::YahooConnector::new()?,
            rate_limit,
        })
    }

    /// Configured pause between tickers.
    pub const fn rate_limit(&self) -> Duration {
        self.rate_limit
    }

    /// Fetch the daily history of one ticker over `[start, end)`.
    ///
    /// Columns: symbol, date, open, high, low, close, volume, adjusted_close.
    pub async fn fetch_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DataFrame> {
        if symbol.trim().is_empty() {
            return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
        }
        if start > end {
            return Err(DataError::InvalidDateRange {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        let response = self
            .connector
            .get_quote_history(symbol, offset_time(start)?, offset_time(end)?)
            .await?;
        let quotes = response
            .quotes()
            .map_err(|e| DataError::YahooApi(e.to_string()))?;
        if quotes.is_empty() {
            return Err(DataError::MissingData {
                symbol: symbol.to_string(),
                reason: "No data returned from Yahoo Finance".to_string(),
            });
        }

        let mut bars = DailyBars::with_capacity(quotes.len());
        for q in &quotes {
            bars.push(q.timestamp, [q.open, q.high, q.low, q.close], q.volume, q.adjclose);
        }
        let frame = bars.into_frame(symbol)?;
        tracing::debug!(symbol, rows = frame.height(), "fetched quotes");
        Ok(frame)
    }

    /// Fetch every distinct ticker in `symbols` and stack the results.
    ///
    /// Duplicates are requested once, in first-seen order.
    pub async fn fetch_quotes_batch(
        &self,
        symbols: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<DataFrame> {
        let distinct = distinct_symbols(symbols);
        if distinct.is_empty() {
            return Err(DataError::MissingData {
                symbol: "batch".to_string(),
                reason: "No symbols requested".to_string(),
            });
        }

        let mut frames = Vec::with_capacity(distinct.len());
        for (i, symbol) in distinct.into_iter().enumerate() {
            if i > 0 && !self.rate_limit.is_zero() {
                tokio::time::sleep(self.rate_limit).await;
            }
            let frame = self
                .fetch_quotes(symbol, start, end)
                .await
                .inspect_err(|e| tracing::warn!(symbol, error = %e, "quote fetch failed"))?;
            frames.push(frame.lazy());
        }

        Ok(concat(frames, UnionArgs::default())?.collect()?)
    }
}

impl MarketDataSource for YahooQuoteProvider {
    #[tracing::instrument(level = "info", skip(self), fields(n = tickers.len()))]
    async fn fetch_prices(&self, tickers: &[String], range: &DateRange) -> Result<DataFrame> {
        let (start, end) = range.utc_bounds();
        self.fetch_quotes_batch(tickers, start, end).await
    }
}

fn offset_time(at: DateTime<Utc>) -> Result<time::OffsetDateTime> {
    time::OffsetDateTime::from_unix_timestamp(at.timestamp())
        .map_err(|e| DataError::TimeConversion(e.to_string()))
}

fn distinct_symbols(symbols: &[String]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        if !seen.contains(&symbol.as_str()) {
            seen.push(symbol);
        }
    }
    seen
}

/// Column buffers for one ticker's history.
#[derive(Debug, Default)]
struct DailyBars {
    timestamps: Vec<i64>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<u64>,
    adjusted_close: Vec<f64>,
}

impl DailyBars {
    fn with_capacity(n: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(n),
            open: Vec::with_capacity(n),
            high: Vec::with_capacity(n),
            low: Vec::with_capacity(n),
            close: Vec::with_capacity(n),
            volume: Vec::with_capacity(n),
            adjusted_close: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, timestamp: i64, [o, h, l, c]: [f64; 4], volume: u64, adjusted: f64) {
        self.timestamps.push(timestamp);
        self.open.push(o);
        self.high.push(h);
        self.low.push(l);
        self.close.push(c);
        self.volume.push(volume);
        self.adjusted_close.push(adjusted);
    }

    /// Build the long frame, converting unix seconds to calendar dates.
    fn into_frame(self, symbol: &str) -> Result<DataFrame> {
        let height = self.timestamps.len();
        let frame = DataFrame::new(vec![
            Column::new("symbol".into(), vec![symbol; height]),
            Column::new("timestamp".into(), self.timestamps),
            Column::new("open".into(), self.open),
            Column::new("high".into(), self.high),
            Column::new("low".into(), self.low),
            Column::new("close".into(), self.close),
            Column::new("volume".into(), self.volume),
            Column::new("adjusted_close".into(), self.adjusted_close),
        ])?;

        let frame = frame
            .lazy()
            .with_column(
                (col("timestamp") * lit(1_000_000_000i64))
                    .cast(DataType::Datetime(TimeUnit::Nanoseconds, None))
                    .cast(DataType::Date)
                    .alias("date"),
            )
            .select([
                col("symbol"),
                col("date"),
                col("open"),
                col("high"),
                col("low"),
                col("close"),
                col("volume"),
                col("adjusted_close"),
            ])
            .collect()?;
        Ok(frame)
    }
}
