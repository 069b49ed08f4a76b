//! Time-series helpers for loads and capacity factors.
//!
//! Standardized series are CSV frames with one key column (`bus` or `gen_id`)
//! followed by one column per hourly timestamp. Reading and writing go through
//! polars; the reducers only ever see [`TimeSeriesTable`].

use std::{
    fs::{self, File},
    path::Path,
};

use anyhow::{anyhow, bail, Context, Result};
use cats_core::TimeSeriesTable;
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Label format of the CATS hourly columns, e.g. `2018-01-01 01:00:00-05:00`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// First hour of the CATS 2018 load year.
pub const CATS_YEAR_START: &str = "2018-01-01 01:00:00-05:00";

/// Hours in the CATS load year (2018-01-01 01:00 through 2019-01-01 00:00).
pub const CATS_YEAR_HOURS: usize = 8760;

/// `count` hourly labels starting at `start` (formatted with [`TIMESTAMP_FORMAT`]).
pub fn hourly_labels(start: &str, count: usize) -> Result<Vec<String>> {
    let first = DateTime::parse_from_str(start, TIMESTAMP_FORMAT)
        .with_context(|| format!("parsing start timestamp '{start}'"))?;
    Ok((0..count)
        .map(|hour| (first + Duration::hours(hour as i64)).format(TIMESTAMP_FORMAT).to_string())
        .collect())
}

fn parse_label(label: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_str(label, TIMESTAMP_FORMAT).ok()
}

/// A fixed window standing in for a season's typical demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepresentativeDay {
    /// Short name used in the output file (`loads_24h_{name}.csv`)
    pub name: String,
    /// Local wall-clock time of the first hour, `YYYY-MM-DDTHH:MM:SS`
    pub start: String,
    #[serde(default = "default_window_hours")]
    pub hours: usize,
}

fn default_window_hours() -> usize {
    24
}

impl RepresentativeDay {
    pub fn new(name: &str, start: &str) -> Self {
        Self {
            name: name.to_string(),
            start: start.to_string(),
            hours: default_window_hours(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("loads_24h_{}.csv", self.name)
    }
}

/// The seasonal days used for the San Diego test system
/// (spring, summer, fall, winter).
pub fn default_representative_days() -> Vec<RepresentativeDay> {
    vec![
        RepresentativeDay::new("sp", "2018-04-02T01:00:00"),
        RepresentativeDay::new("su", "2018-08-11T01:00:00"),
        RepresentativeDay::new("fa", "2018-10-22T01:00:00"),
        RepresentativeDay::new("wi", "2018-12-07T01:00:00"),
    ]
}

/// Columns of `table` covering `day`: the column whose local time equals
/// `day.start` and the `day.hours - 1` columns after it.
pub fn extract_window(table: &TimeSeriesTable, day: &RepresentativeDay) -> Result<TimeSeriesTable> {
    let start = NaiveDateTime::parse_from_str(&day.start, "%Y-%m-%dT%H:%M:%S")
        .with_context(|| format!("parsing representative day start '{}'", day.start))?;
    let position = table
        .timestamps
        .iter()
        .position(|label| parse_label(label).is_some_and(|ts| ts.naive_local() == start))
        .ok_or_else(|| {
            anyhow!(
                "representative day '{}' starts at {} which is not a column of the load table",
                day.name,
                day.start
            )
        })?;
    let end = position + day.hours;
    if end > table.width() {
        bail!(
            "representative day '{}' needs {} hours from {} but the load table ends after {}",
            day.name,
            day.hours,
            day.start,
            table.width() - position
        );
    }
    Ok(table.slice_columns(position, end)?)
}

/// Read a standardized series frame.
///
/// When the frame has a column named `index_name` it provides the keys;
/// otherwise rows are keyed by their 1-based position, matching the CATS
/// convention that row *i* describes bus *i*.
pub fn read_series(path: &Path, index_name: &str) -> Result<TimeSeriesTable> {
    let df = read_frame(path)?;
    frame_to_table(&df, index_name).with_context(|| format!("reading {}", path.display()))
}

fn frame_to_table(df: &DataFrame, index_name: &str) -> Result<TimeSeriesTable> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    let has_index = names.iter().any(|name| name == index_name);

    let keys: Vec<usize> = if has_index {
        let key_series = df
            .column(index_name)?
            .cast(&DataType::Int64)
            .with_context(|| format!("casting {index_name} column to Int64"))?;
        key_series
            .i64()?
            .into_iter()
            .enumerate()
            .map(|(row, key)| match key {
                Some(key) if key > 0 => Ok(key as usize),
                _ => Err(anyhow!("row {} has no valid {index_name} key", row + 1)),
            })
            .collect::<Result<_>>()?
    } else {
        (1..=df.height()).collect()
    };

    let value_names: Vec<String> = names.into_iter().filter(|name| name != index_name).collect();
    let mut columns = Vec::with_capacity(value_names.len());
    for name in &value_names {
        let series = df
            .column(name)?
            .cast(&DataType::Float64)
            .with_context(|| format!("casting column '{name}' to Float64"))?;
        let values: Vec<f64> = series
            .f64()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                value.ok_or_else(|| anyhow!("missing value in column '{name}' at row {}", row + 1))
            })
            .collect::<Result<_>>()?;
        columns.push(values);
    }

    let mut table = TimeSeriesTable::new(index_name, value_names);
    for (row, key) in keys.into_iter().enumerate() {
        let values = columns.iter().map(|column| column[row]).collect();
        table.push(key, values)?;
    }
    Ok(table)
}

/// Write `table` as CSV with the key column first.
pub fn write_series(table: &TimeSeriesTable, path: &Path) -> Result<()> {
    let mut df = table_to_frame(table)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    CsvWriter::new(&mut file)
        .finish(&mut df)
        .with_context(|| format!("writing {}", path.display()))
}

fn table_to_frame(table: &TimeSeriesTable) -> Result<DataFrame> {
    let keys: Vec<i64> = table.rows.iter().map(|row| row.key as i64).collect();
    let mut columns = Vec::with_capacity(table.width() + 1);
    columns.push(Series::new(table.index_name.as_str(), keys));
    for (col, label) in table.timestamps.iter().enumerate() {
        let values: Vec<f64> = table.rows.iter().map(|row| row.values[col]).collect();
        columns.push(Series::new(label.as_str(), values));
    }
    DataFrame::new(columns).context("assembling series frame")
}

fn read_frame(path: &Path) -> Result<DataFrame> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    let mut file = File::open(path).with_context(|| format!("opening {}", path.display()))?;

    match extension.as_str() {
        "csv" => {
            let reader = CsvReader::new(&mut file);
            reader.has_header(true).finish().context("reading CSV file")
        }
        _ => Err(anyhow!(
            "unsupported file extension '{}' for {}; use .csv",
            extension,
            path.display()
        )),
    }
}
