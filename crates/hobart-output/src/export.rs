//! CSV and JSON export of analysis results.
//!
//! Rolling coefficients and PCA exposures are flattened into long records
//! (one row per date/parameter or ticker/component) for CSV, and kept in
//! their nested form for JSON.

use chrono::NaiveDate;
use hobart_stats::{PcaResult, RollingOlsResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized CSV was not valid UTF-8.
    #[error("Encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Infer the format from a file extension (`.csv` or `.json`).
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Ok(Self::Csv),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::PrettyJson),
            _ => Err(ExportError::InvalidFormat(format!(
                "cannot infer export format from {}",
                path.display()
            ))),
        }
    }
}

/// One rolling coefficient at one window end.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CoefficientRecord {
    /// Last date of the window.
    pub date: NaiveDate,
    /// Parameter name.
    pub parameter: String,
    /// Estimated coefficient.
    pub value: f64,
}

/// Rolling regression coefficients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RollingCoefficientsExport {
    /// Rolling window length.
    pub window: usize,
    /// Coefficients in date-major order.
    pub records: Vec<CoefficientRecord>,
}

impl RollingCoefficientsExport {
    /// Flatten a rolling fit.
    pub fn new(window: usize, result: &RollingOlsResult) -> Self {
        let records = result
            .dates
            .iter()
            .zip(result.params.rows())
            .flat_map(|(date, row)| {
                result
                    .names
                    .iter()
                    .zip(row)
                    .map(|(name, value)| CoefficientRecord {
                        date: *date,
                        parameter: name.clone(),
                        value: *value,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { window, records }
    }
}

/// Loading of one ticker on one component.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExposureRecord {
    /// Ticker symbol.
    pub ticker: String,
    /// Component label (`f1`, `f2`, ...).
    pub component: String,
    /// Loading.
    pub exposure: f64,
}

/// PCA output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PcaExport {
    /// Explained variance ratio per component.
    pub explained_variance_ratio: Vec<f64>,
    /// Cumulative explained variance per component.
    pub cumulative_variance_ratio: Vec<f64>,
    /// Exposures in ticker-major order.
    pub exposures: Vec<ExposureRecord>,
}

impl PcaExport {
    /// Flatten a PCA fit.
    pub fn new(result: &PcaResult) -> Self {
        let names = result.factor_names();
        let exposures = result
            .assets
            .iter()
            .zip(result.factor_exposures.rows())
            .flat_map(|(ticker, row)| {
                names
                    .iter()
                    .zip(row)
                    .map(|(component, exposure)| ExposureRecord {
                        ticker: ticker.clone(),
                        component: component.clone(),
                        exposure: *exposure,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        Self {
            explained_variance_ratio: result.explained_variance_ratio.to_vec(),
            cumulative_variance_ratio: result.cumulative_variance_ratio.to_vec(),
            exposures,
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn records_to_csv<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

impl Exporter for RollingCoefficientsExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => records_to_csv(&self.records),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for PcaExport {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => records_to_csv(&self.exposures),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
