//! Wide hourly time-series tables.
//!
//! Loads and capacity factors are both stored as one row per key (bus id or
//! generator id) and one column per timestamp label. Labels are kept as the
//! strings the source used so the output columns match the input exactly.

use crate::{CatsError, CatsResult};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub key: usize,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    /// Name of the key column ("bus" or "gen_id")
    pub index_name: String,
    pub timestamps: Vec<String>,
    pub rows: Vec<SeriesRow>,
}

impl TimeSeriesTable {
    pub fn new(index_name: impl Into<String>, timestamps: Vec<String>) -> Self {
        Self {
            index_name: index_name.into(),
            timestamps,
            rows: Vec::new(),
        }
    }

    /// Append a row, rejecting widths that disagree with the header.
    pub fn push(&mut self, key: usize, values: Vec<f64>) -> CatsResult<()> {
        if values.len() != self.timestamps.len() {
            return Err(CatsError::Validation(format!(
                "{} {} has {} values but the table has {} timestamps",
                self.index_name,
                key,
                values.len(),
                self.timestamps.len()
            )));
        }
        self.rows.push(SeriesRow { key, values });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.timestamps.len()
    }

    pub fn row(&self, key: usize) -> Option<&SeriesRow> {
        self.rows.iter().find(|row| row.key == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.iter().map(|row| row.key)
    }

    /// First row per key, in table order.
    pub fn index_by_key(&self) -> HashMap<usize, &SeriesRow> {
        let mut index = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            index.entry(row.key).or_insert(row);
        }
        index
    }

    pub fn position(&self, timestamp: &str) -> Option<usize> {
        self.timestamps.iter().position(|ts| ts == timestamp)
    }

    /// Copy of the columns `start..end`.
    pub fn slice_columns(&self, start: usize, end: usize) -> CatsResult<TimeSeriesTable> {
        if start > end || end > self.width() {
            return Err(CatsError::Validation(format!(
                "column range {start}..{end} outside table of width {}",
                self.width()
            )));
        }
        Ok(TimeSeriesTable {
            index_name: self.index_name.clone(),
            timestamps: self.timestamps[start..end].to_vec(),
            rows: self
                .rows
                .iter()
                .map(|row| SeriesRow {
                    key: row.key,
                    values: row.values[start..end].to_vec(),
                })
                .collect(),
        })
    }

    pub fn scale(&mut self, factor: f64) {
        for row in &mut self.rows {
            for value in &mut row.values {
                *value *= factor;
            }
        }
    }
}
