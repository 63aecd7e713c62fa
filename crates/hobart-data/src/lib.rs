#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod french;
pub mod range;
pub mod source;
pub mod yahoo;

pub use error::{DataError, Result};
pub use french::{CsvFactorFile, FactorDataset, FactorTable, KenFrenchClient};
pub use range::DateRange;
pub use source::{FactorDataSource, MarketDataSource};
pub use yahoo::YahooQuoteProvider;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
