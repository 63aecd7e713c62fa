#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;
pub mod request;
pub mod response;
pub mod returns;

// Re-export main types from sub-crates
pub use hobart_data as data;
pub use hobart_output as output;
pub use hobart_stats as stats;

pub use config::{
    AnalysisConfig, ConfigError, DataConfig, MarketFactor, PcaSettings, RegressionConfig,
    WeightParsing, WeightSumRule,
};
pub use error::AnalysisError;
pub use pipeline::{PcaOutcome, RegressionOutcome, run_factor_regression, run_pca};
pub use request::{
    FactorModel, PcaRequest, RegressionRequest, TickerSpec, ValidPca, ValidRegression,
    ValidationError, WeightSpec,
};
pub use response::Response;
pub use returns::{AlignedSample, PriceTable, ReturnMatrix, ReturnSeries};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
