#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod linalg;
pub mod ols;
pub mod pca;
pub mod rolling;

pub use error::StatsError;
pub use ols::{CONST_NAME, OlsResult, add_constant, fit_ols};
pub use pca::{Pca, PcaConfig, PcaResult};
pub use rolling::{DEFAULT_WINDOW, RollingOls, RollingOlsResult};
