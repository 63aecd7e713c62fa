//! Factor data providers: the online data library and local CSV copies.

use super::dataset::FactorDataset;
use super::parse::parse_factor_csv;
use super::table::FactorTable;
use crate::error::{DataError, Result};
use crate::source::FactorDataSource;
use chrono::NaiveDate;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

/// Base URL of the Ken French data library's download area.
pub const DEFAULT_BASE_URL: &str = "https://mba.tuck.dartmouth.edu/pages/faculty/ken.french/ftp";

/// Downloads factor datasets from the Ken French data library.
#[derive(Debug, Clone)]
pub struct KenFrenchClient {
    http: reqwest::Client,
    base_url: String,
}

impl KenFrenchClient {
    /// Create a client against the public data library.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Create a client against a mirror of the data library.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// URL of the zip archive for `dataset`.
    pub fn archive_url(&self, dataset: FactorDataset) -> String {
        format!("{}/{}_CSV.zip", self.base_url, dataset.file_stem())
    }

    async fn download(&self, dataset: FactorDataset) -> Result<Vec<u8>> {
        let url = self.archive_url(dataset);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Http(format!("{url} returned {status}")));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl Default for KenFrenchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FactorDataSource for KenFrenchClient {
    #[tracing::instrument(level = "info", skip(self))]
    async fn fetch_factors(&self, dataset: FactorDataset, start: NaiveDate) -> Result<FactorTable> {
        let archive = self.download(dataset).await?;
        let table = read_archive(&archive, start)?;
        table.require_columns(dataset.columns())?;
        tracing::debug!(rows = table.len(), "parsed factor table");
        Ok(table)
    }
}

/// Parse the single CSV file held in a data library zip archive.
pub fn read_archive(bytes: &[u8], start: NaiveDate) -> Result<FactorTable> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    if archive.is_empty() {
        return Err(DataError::Parse("factor archive is empty".to_string()));
    }
    let mut contents = Vec::new();
    archive.by_index(0)?.read_to_end(&mut contents)?;
    parse_factor_csv(contents.as_slice(), Some(start))
}

/// Reads a factor dataset from a local CSV file in the data library layout.
///
/// Useful offline, or to pin an analysis to a specific vintage of the data.
#[derive(Debug, Clone)]
pub struct CsvFactorFile {
    path: PathBuf,
}

impl CsvFactorFile {
    /// Use the CSV file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FactorDataSource for CsvFactorFile {
    #[tracing::instrument(level = "info", skip(self), fields(path = %self.path.display()))]
    async fn fetch_factors(&self, dataset: FactorDataset, start: NaiveDate) -> Result<FactorTable> {
        let file = File::open(&self.path)?;
        let table = parse_factor_csv(file, Some(start))?;
        table.require_columns(dataset.columns())?;
        Ok(table)
    }
}
