//! Fama-French factor data from Kenneth French's data library.
//!
//! The library publishes each dataset as a zip archive holding a single CSV
//! file: a free-text preamble, a header row whose first cell is blank, one
//! row per trading day keyed by `YYYYMMDD`, and a copyright trailer. Returns
//! are in percent.

pub mod client;
pub mod dataset;
pub mod parse;
pub mod table;

pub use client::{CsvFactorFile, DEFAULT_BASE_URL, KenFrenchClient, read_archive};
pub use dataset::FactorDataset;
pub use parse::parse_factor_csv;
pub use table::FactorTable;
