#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/hobart/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod chart;
pub mod export;
pub mod report;
pub mod summary;

pub use chart::{Chart, PcaCharts, Trace, pca_charts, rolling_coefficients_chart};
pub use export::{
    CoefficientRecord, ExportError, ExportFormat, Exporter, ExposureRecord, PcaExport,
    RollingCoefficientsExport,
};
pub use report::{AnalysisKind, Report, ReportBuilder, ReportError};
pub use summary::RegressionSummary;
