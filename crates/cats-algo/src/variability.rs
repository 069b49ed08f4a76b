//! Capacity-factor reconciliation (extended variant).
//!
//! Resource series are keyed by bus. After scoping them to `N` and moving
//! them onto the new bus ids, each generator picks the first series with the
//! same bus and fuel type; generators with no series get a constant 1.
//!
//! Wind rows are de-duplicated per (bus, values) rather than by values alone,
//! so identical profiles at two different buses both survive.

use std::collections::{HashMap, HashSet};

use cats_core::{BusId, CatsError, CatsResult, FuelType, Generator, SeriesRow, TimeSeriesTable};
use tracing::info;

use crate::area::AreaSelection;
use crate::reindex::BusIndexMap;

/// A capacity-factor table for one resource, tagged with the fuel type it
/// applies to.
#[derive(Debug, Clone)]
pub struct ResourceSeries {
    pub name: String,
    pub fuel: FuelType,
    pub table: TimeSeriesTable,
    /// Drop rows that repeat an earlier (bus, values) pair
    pub dedup: bool,
}

impl ResourceSeries {
    pub fn new(name: impl Into<String>, fuel: FuelType, table: TimeSeriesTable) -> Self {
        Self {
            name: name.into(),
            fuel,
            table,
            dedup: false,
        }
    }

    pub fn deduplicated(mut self) -> Self {
        self.dedup = true;
        self
    }
}

/// Rows for buses in `N`, relabelled with new bus ids.
pub fn scope_series(
    series: &ResourceSeries,
    selection: &AreaSelection,
    map: &BusIndexMap,
) -> CatsResult<ResourceSeries> {
    let source = &series.table;
    let mut table = TimeSeriesTable::new("bus", source.timestamps.clone());
    let mut seen: HashSet<(usize, Vec<u64>)> = HashSet::new();
    for row in &source.rows {
        let bus = BusId::new(row.key);
        if !selection.contains(bus) {
            continue;
        }
        let new_bus = map.remap(bus, &series.name)?;
        if series.dedup {
            let fingerprint = row.values.iter().map(|v| v.to_bits()).collect();
            if !seen.insert((new_bus.value(), fingerprint)) {
                continue;
            }
        }
        table.push(new_bus.value(), row.values.clone())?;
    }
    Ok(ResourceSeries {
        name: series.name.clone(),
        fuel: series.fuel.clone(),
        table,
        dedup: series.dedup,
    })
}

/// One row per generator keyed by `gen_id`, in generator order.
///
/// Timestamp columns come from the first resource with rows; every other
/// non-empty resource must use the same columns.
pub fn reconcile_capacity_factors(
    gens: &[Generator],
    resources: &[ResourceSeries],
) -> CatsResult<TimeSeriesTable> {
    let reference = resources
        .iter()
        .find(|res| !res.table.is_empty())
        .or_else(|| resources.first());
    let timestamps = reference
        .map(|res| res.table.timestamps.clone())
        .unwrap_or_default();

    for res in resources.iter().filter(|res| !res.table.is_empty()) {
        if res.table.timestamps != timestamps {
            return Err(CatsError::Validation(format!(
                "capacity factors '{}' use different timestamp columns than '{}'",
                res.name,
                reference.map(|r| r.name.as_str()).unwrap_or_default()
            )));
        }
    }

    let indexed: Vec<(&FuelType, HashMap<usize, &SeriesRow>)> = resources
        .iter()
        .map(|res| (&res.fuel, res.table.index_by_key()))
        .collect();

    let mut table = TimeSeriesTable::new("gen_id", timestamps);
    let mut matched = 0;
    for gen in gens {
        let series = indexed
            .iter()
            .filter(|(fuel, _)| **fuel == gen.fuel)
            .find_map(|(_, rows)| rows.get(&gen.bus.value()).copied());
        let values = match series {
            Some(row) => {
                matched += 1;
                row.values.clone()
            }
            None => vec![1.0; table.width()],
        };
        table.push(gen.id.value(), values)?;
    }
    info!(
        "Capacity factors for {} generators ({} variable)",
        table.len(),
        matched
    );
    Ok(table)
}
