//! JSON report envelope around an analysis response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A required field was not set on the builder.
    #[error("Missing report field: {0}")]
    MissingField(&'static str),
}

/// Which analysis produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Principal component analysis.
    Pca,
    /// Fama-French factor regression.
    FamaFrench,
}

/// A timestamped analysis report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Analysis that produced the contents.
    pub kind: AnalysisKind,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Requested tickers.
    pub tickers: Vec<String>,

    /// Whether the analysis completed.
    pub succeeded: bool,

    /// Serialized analysis response.
    pub contents: serde_json::Value,
}

impl Report {
    /// Report for a completed analysis, stamped now.
    pub fn new(kind: AnalysisKind, tickers: Vec<String>, contents: serde_json::Value) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            tickers,
            succeeded: true,
            contents,
        }
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON report to `path`, creating missing parent directories.
    pub fn write_to(&self, path: &std::path::Path) -> Result<(), ReportError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut json = self.to_json()?;
        json.push('\n');
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    kind: Option<AnalysisKind>,
    tickers: Vec<String>,
    failed: bool,
    contents: Option<serde_json::Value>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the analysis kind.
    pub const fn kind(mut self, kind: AnalysisKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Set the requested tickers.
    pub fn tickers(mut self, tickers: Vec<String>) -> Self {
        self.tickers = tickers;
        self
    }

    /// Mark the analysis as failed.
    pub const fn failed(mut self, failed: bool) -> Self {
        self.failed = failed;
        self
    }

    /// Set the report contents.
    pub fn contents(mut self, contents: serde_json::Value) -> Self {
        self.contents = Some(contents);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        let kind = self.kind.ok_or(ReportError::MissingField("kind"))?;
        let mut report = Report::new(
            kind,
            self.tickers,
            self.contents.unwrap_or(serde_json::Value::Null),
        );
        report.succeeded = !self.failed;
        Ok(report)
    }
}
