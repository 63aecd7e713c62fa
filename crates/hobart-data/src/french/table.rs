//! Time-indexed table of named factor returns.

use crate::error::{DataError, Result};
use chrono::NaiveDate;
use ndarray::{Array2, ArrayView1, Axis};

/// Daily factor returns keyed by date, one column per factor.
///
/// Dates are strictly ascending. Values are in percent per day, the unit
/// the data library publishes.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorTable {
    dates: Vec<NaiveDate>,
    names: Vec<String>,
    values: Array2<f64>,
}

impl FactorTable {
    /// Build a table, checking shape and date ordering.
    pub fn new(dates: Vec<NaiveDate>, names: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.nrows() != dates.len() || values.ncols() != names.len() {
            return Err(DataError::Parse(format!(
                "factor table shape {}x{} does not match {} dates and {} columns",
                values.nrows(),
                values.ncols(),
                dates.len(),
                names.len()
            )));
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DataError::Parse(
                "factor dates must be strictly ascending".to_string(),
            ));
        }
        Ok(Self {
            dates,
            names,
            values,
        })
    }

    /// Trading dates.
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Factor column names in file order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Index of a named column.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// A named column, if present.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name)
            .map(|j| self.values.index_axis(Axis(1), j))
    }

    /// Row position of `date`, if the table has it.
    pub fn position(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Value at a row position and column index.
    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.values[[row, column]]
    }

    /// Rows dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> Self {
        let from = self.dates.partition_point(|d| *d < start);
        Self {
            dates: self.dates[from..].to_vec(),
            names: self.names.clone(),
            values: self.values.slice(ndarray::s![from.., ..]).to_owned(),
        }
    }

    /// Check that every name in `required` is a column.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        match required.iter().find(|c| self.column_index(c).is_none()) {
            Some(missing) => Err(DataError::MissingData {
                symbol: (*missing).to_string(),
                reason: "factor column not present in table".to_string(),
            }),
            None => Ok(()),
        }
    }
}
