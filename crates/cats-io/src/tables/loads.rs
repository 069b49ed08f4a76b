use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use cats_core::TimeSeriesTable;
use cats_ts::{hourly_labels, CATS_YEAR_HOURS, CATS_YEAR_START};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// On-disk layout of the load input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadFormat {
    /// Headerless complex matrix, one row per bus
    #[default]
    Cats,
    /// Wide CSV with a `bus` key column and timestamp headers
    Table,
}

/// Load bus demand in either layout.
pub fn load_loads(path: &Path, format: LoadFormat) -> Result<TimeSeriesTable> {
    match format {
        LoadFormat::Cats => load_cats_loads(path),
        LoadFormat::Table => cats_ts::read_series(path, "bus"),
    }
}

/// Load the raw CATS load matrix.
///
/// The file has no header; row *i* is bus *i* and each cell is a complex
/// power `p+qi` of which only the real part is kept. Columns are labelled
/// with consecutive hours starting at [`CATS_YEAR_START`].
pub fn load_cats_loads(path: &Path) -> Result<TimeSeriesTable> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading {}", path.display()))?;
        let values = record
            .iter()
            .enumerate()
            .map(|(col, cell)| {
                parse_real_part(cell).with_context(|| {
                    format!("{}: row {} column {}", path.display(), idx + 1, col + 1)
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(values);
    }

    let width = rows.first().map(Vec::len).unwrap_or(CATS_YEAR_HOURS);
    if width > CATS_YEAR_HOURS {
        bail!(
            "{} has {width} columns; the CATS load year has {CATS_YEAR_HOURS} hours",
            path.display()
        );
    }
    let mut table = TimeSeriesTable::new("bus", hourly_labels(CATS_YEAR_START, width)?);
    for (idx, values) in rows.into_iter().enumerate() {
        table.push(idx + 1, values)?;
    }
    Ok(table)
}

/// Real part of a complex cell such as `12.5+3.1i` (plain reals pass through).
pub fn parse_real_part(cell: &str) -> Result<f64> {
    let compact: String = cell.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .parse::<Complex64>()
        .map(|value| value.re)
        .map_err(|_| anyhow!("'{cell}' is not a complex number"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn real_part_of_complex_cells() {
        assert_eq!(parse_real_part("12.5+3.1i").unwrap(), 12.5);
        assert_eq!(parse_real_part("12.5-3.1i").unwrap(), 12.5);
        assert_eq!(parse_real_part("-4+0j").unwrap(), -4.0);
        assert_eq!(parse_real_part("7").unwrap(), 7.0);
        assert!(parse_real_part("n/a").is_err());
    }

    #[test]
    fn rows_are_buses_columns_are_hours() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loads.csv");
        fs::write(&path, "1000+10i,2000+20i,3000+0i\n0+0i,500+1i,0+0i\n").unwrap();
        let table = load_cats_loads(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.width(), 3);
        assert_eq!(table.timestamps[0], "2018-01-01 01:00:00-05:00");
        assert_eq!(table.row(1).unwrap().values, vec![1000.0, 2000.0, 3000.0]);
        assert_eq!(table.row(2).unwrap().values[1], 500.0);
    }

    #[test]
    fn table_layout_uses_bus_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loads.csv");
        fs::write(&path, "bus,t0,t1\n4,1.5,2.5\n9,0.0,3.0\n").unwrap();
        let table = load_loads(&path, LoadFormat::Table).unwrap();
        assert_eq!(table.keys().collect::<Vec<_>>(), vec![4, 9]);
        assert_eq!(table.timestamps, vec!["t0".to_string(), "t1".to_string()]);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("loads.csv");
        fs::write(&path, "1+0i,2+0i\n3+0i\n").unwrap();
        assert!(load_cats_loads(&path).is_err());
    }
}
