//! Parser for the data library's CSV layout.

use super::table::FactorTable;
use crate::error::{DataError, Result};
use chrono::NaiveDate;
use ndarray::Array2;
use std::io::Read;

/// Parse a daily factor CSV as published in the data library.
///
/// Preamble lines are skipped until the header row (blank first cell,
/// named columns after it). Data rows are read until the first row whose
/// key is not an 8-digit `YYYYMMDD` date. Rows before `start` are dropped.
pub fn parse_factor_csv<R: Read>(reader: R, start: Option<NaiveDate>) -> Result<FactorTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut names: Option<Vec<String>> = None;
    let mut dates = Vec::new();
    let mut values = Vec::new();

    for record in rdr.records() {
        let record = record?;
        let Some(key) = record.get(0) else {
            continue;
        };

        let n_columns = match &names {
            Some(columns) => columns.len(),
            None => {
                if is_header(&record) {
                    names = Some(record.iter().skip(1).map(str::to_string).collect());
                }
                continue;
            }
        };

        let Some(date) = parse_row_date(key) else {
            // Past the daily section: any trailer or later section ends it.
            if dates.is_empty() && key.is_empty() {
                continue;
            }
            break;
        };

        if record.len() != n_columns + 1 {
            return Err(DataError::Parse(format!(
                "row {} has {} values, expected {}",
                key,
                record.len() - 1,
                n_columns
            )));
        }

        if start.is_some_and(|s| date < s) {
            continue;
        }

        dates.push(date);
        for cell in record.iter().skip(1) {
            let value = cell
                .parse::<f64>()
                .map_err(|e| DataError::Parse(format!("row {key}: '{cell}': {e}")))?;
            values.push(value);
        }
    }

    let Some(names) = names else {
        return Err(DataError::Parse(
            "no header row found in factor file".to_string(),
        ));
    };

    let values = Array2::from_shape_vec((dates.len(), names.len()), values)
        .map_err(|e| DataError::Parse(e.to_string()))?;

    FactorTable::new(dates, names, values)
}

fn is_header(record: &csv::StringRecord) -> bool {
    record.len() > 1
        && record.get(0).is_some_and(str::is_empty)
        && record.iter().skip(1).all(|c| !c.is_empty())
}

fn parse_row_date(key: &str) -> Option<NaiveDate> {
    if key.len() != 8 || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(key, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const THREE_FACTOR: &str = "\
This file was created by CMPT_ME_BEME_RETS_DAILY using the 202401 CRSP database.
The 1-month TBill return is from Ibbotson and Associates, Inc.

,Mkt-RF,SMB,HML,RF
20240102,   -0.71,    0.56,    0.72,    0.02
20240103,   -1.07,   -0.35,    0.14,    0.02
20240104,   -0.33,    0.12,    0.02,    0.02

Copyright 2024 Kenneth R. French
";

    #[test]
    fn test_parses_header_and_rows() {
        let table = parse_factor_csv(THREE_FACTOR.as_bytes(), None).unwrap();
        assert_eq!(table.names(), &["Mkt-RF", "SMB", "HML", "RF"]);
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.dates()[0],
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
        );
        assert_relative_eq!(table.column("SMB").unwrap()[1], -0.35);
    }

    #[test]
    fn test_start_filter() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let table = parse_factor_csv(THREE_FACTOR.as_bytes(), Some(start)).unwrap();
        assert_eq!(table.len(), 2);
        assert_relative_eq!(table.column("Mkt-RF").unwrap()[0], -1.07);
    }

    #[test]
    fn test_missing_header_is_error() {
        let result = parse_factor_csv("20240102,1.0,2.0\n".as_bytes(), None);
        assert!(matches!(result, Err(DataError::Parse(_))));
    }

    #[test]
    fn test_bad_value_is_error() {
        let data = ",SMB,HML\n20240102,abc,0.1\n";
        assert!(parse_factor_csv(data.as_bytes(), None).is_err());
    }

    #[test]
    fn test_stops_at_annual_section() {
        let data = "\
,Mkt-RF,SMB
20240102,0.1,0.2

 Annual Factors: January-December
,Mkt-RF,SMB
1927,29.47,-2.46
";
        let table = parse_factor_csv(data.as_bytes(), None).unwrap();
        assert_eq!(table.len(), 1);
    }
}
