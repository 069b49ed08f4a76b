//! Column validation and typed access for raw CSV tables.
//!
//! CATS tables come with mixed-case headers and rows implicitly numbered from
//! zero. [`CsvTable`] lowercases every header on load (the pipeline's naming
//! convention) and exposes 1-based row numbers, so required columns can be
//! checked up front and every parse failure names the file, column and row.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cats_core::CatsError;
use csv::StringRecord;

/// Required columns per input table.
pub const BUS_COLUMNS: &[&str] = &["lat", "lon"];
pub const LINE_COLUMNS: &[&str] = &["f_bus", "t_bus", "r", "x", "b", "rate_a"];
pub const GENERATOR_COLUMNS: &[&str] = &[
    "bus", "fueltype", "pg", "pmax", "pmin", "qg", "qmax", "qmin",
];
pub const COST_COLUMNS: &[&str] = &["startup", "shutdown", "n", "c2", "c1", "c0"];

/// A fully loaded CSV table with lowercase headers.
#[derive(Debug, Clone)]
pub struct CsvTable {
    pub path: PathBuf,
    pub headers: Vec<String>,
    pub records: Vec<StringRecord>,
}

impl CsvTable {
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);
        let headers = reader
            .headers()
            .with_context(|| format!("reading header of {}", path.display()))?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();
        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("reading {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            records,
        })
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    pub fn column(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    /// Index of a column that must be present.
    pub fn require(&self, column: &str) -> Result<usize, CatsError> {
        self.column(column).ok_or_else(|| CatsError::MissingColumn {
            table: self.name(),
            column: column.to_string(),
        })
    }

    /// Fail fast on the first missing column of `columns`.
    pub fn require_all(&self, columns: &[&str]) -> Result<(), CatsError> {
        for column in columns {
            self.require(column)?;
        }
        Ok(())
    }

    pub fn text<'a>(&self, record: &'a StringRecord, col: usize) -> &'a str {
        record.get(col).unwrap_or("")
    }

    /// Parse a float cell; `row` is the 1-based data row.
    pub fn float(&self, record: &StringRecord, col: usize, row: usize) -> Result<f64, CatsError> {
        let raw = self.text(record, col);
        raw.parse::<f64>().map_err(|_| {
            CatsError::Parse(format!(
                "{}: column '{}' row {row}: '{raw}' is not a number",
                self.name(),
                self.headers[col]
            ))
        })
    }

    /// Parse a positive integer id cell (accepts `12` and `12.0`).
    pub fn id(&self, record: &StringRecord, col: usize, row: usize) -> Result<usize, CatsError> {
        let value = self.float(record, col, row)?;
        if value < 1.0 || value.fract() != 0.0 {
            return Err(CatsError::Parse(format!(
                "{}: column '{}' row {row}: '{}' is not a 1-based id",
                self.name(),
                self.headers[col],
                self.text(record, col)
            )));
        }
        Ok(value as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn headers_are_lowercased() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buses.csv");
        fs::write(&path, "Bus,Lat,LON\n1,32.7,-117.1\n").unwrap();
        let table = CsvTable::read(&path).unwrap();
        assert_eq!(table.headers, vec!["bus", "lat", "lon"]);
        assert!(table.require_all(BUS_COLUMNS).is_ok());
    }

    #[test]
    fn missing_column_names_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lines.csv");
        fs::write(&path, "f_bus,t_bus,r,x\n1,2,0.1,0.2\n").unwrap();
        let table = CsvTable::read(&path).unwrap();
        let err = table.require_all(LINE_COLUMNS).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Schema error: lines.csv is missing required column 'b'"
        );
    }

    #[test]
    fn parse_errors_point_at_cell() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gens.csv");
        fs::write(&path, "bus,pmax\n2,abc\n0,1\n").unwrap();
        let table = CsvTable::read(&path).unwrap();
        let pmax = table.require("pmax").unwrap();
        let bus = table.require("bus").unwrap();
        let err = table.float(&table.records[0], pmax, 1).unwrap_err();
        assert!(err.to_string().contains("column 'pmax' row 1"));
        assert!(table.id(&table.records[1], bus, 2).is_err());
        assert_eq!(table.id(&table.records[0], bus, 1).unwrap(), 2);
    }
}
