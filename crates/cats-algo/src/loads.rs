//! Load reduction.

use anyhow::Result;
use cats_core::{BusId, CatsResult, SeriesRow, TimeSeriesTable};
use cats_ts::{extract_window, RepresentativeDay};
use tracing::{debug, info};

use crate::area::AreaSelection;

/// Divisor taking raw CATS loads to MW in the base variant.
pub const DEFAULT_LOAD_SCALE: f64 = 1000.0;

/// First-hour load above which a bus's representative-day series is scaled down.
pub const DEFAULT_LOAD_CLIP: f64 = 30.0;

/// Rows for buses in `N` (table order), divided by `scale` when given, with
/// every import bus row zeroed.
pub fn subset_loads(
    loads: &TimeSeriesTable,
    selection: &AreaSelection,
    scale: Option<f64>,
) -> CatsResult<TimeSeriesTable> {
    let mut reduced = TimeSeriesTable::new(loads.index_name.clone(), loads.timestamps.clone());
    let mut zeroed = 0;
    for row in &loads.rows {
        let bus = BusId::new(row.key);
        if !selection.contains(bus) {
            continue;
        }
        let values = if selection.is_import(bus) {
            zeroed += 1;
            vec![0.0; row.values.len()]
        } else {
            match scale {
                Some(divisor) => row.values.iter().map(|v| v / divisor).collect(),
                None => row.values.clone(),
            }
        };
        reduced.push(row.key, values)?;
    }
    info!(
        "Kept {} load rows ({} import rows zeroed)",
        reduced.len(),
        zeroed
    );
    Ok(reduced)
}

/// Retained buses without a load row.
pub fn missing_load_buses(loads: &TimeSeriesTable, selection: &AreaSelection) -> Vec<BusId> {
    let present: std::collections::HashSet<usize> = loads.keys().collect();
    selection
        .retained
        .iter()
        .filter(|bus| !present.contains(&bus.value()))
        .copied()
        .collect()
}

/// Per-row factor `threshold / l0` when the first value `l0` exceeds
/// `threshold`, otherwise 1.
pub fn clip_factor(row: &SeriesRow, threshold: f64) -> f64 {
    match row.values.first() {
        Some(&first) if first > threshold => threshold / first,
        _ => 1.0,
    }
}

/// Apply [`clip_factor`] (computed on the full series) to each window.
pub fn representative_loads(
    loads: &TimeSeriesTable,
    days: &[RepresentativeDay],
    threshold: f64,
) -> Result<Vec<(RepresentativeDay, TimeSeriesTable)>> {
    let factors: Vec<f64> = loads
        .rows
        .iter()
        .map(|row| clip_factor(row, threshold))
        .collect();
    let clipped = factors.iter().filter(|alpha| **alpha < 1.0).count();
    debug!(clipped, threshold, "buses scaled down by the first-hour clip");

    let mut windows = Vec::with_capacity(days.len());
    for day in days {
        let mut window = extract_window(loads, day)?;
        for (row, alpha) in window.rows.iter_mut().zip(&factors) {
            for value in &mut row.values {
                *value *= alpha;
            }
        }
        windows.push((day.clone(), window));
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cats_ts::hourly_labels;
    use std::collections::BTreeSet;

    fn selection() -> AreaSelection {
        AreaSelection {
            retained: [1, 2, 3, 7].into_iter().map(BusId::new).collect(),
            imports: [7].into_iter().map(BusId::new).collect::<BTreeSet<_>>(),
            isolated: Vec::new(),
            selected_lines: 0,
        }
    }

    fn loads() -> TimeSeriesTable {
        let mut table = TimeSeriesTable::new("bus", vec!["t0".into(), "t1".into()]);
        table.push(1, vec![1000.0, 2000.0]).unwrap();
        table.push(2, vec![80_000.0, 40_000.0]).unwrap();
        table.push(5, vec![9.0, 9.0]).unwrap();
        table.push(7, vec![500.0, 700.0]).unwrap();
        table
    }

    #[test]
    fn base_loads_are_scaled_and_imports_zeroed() {
        let reduced = subset_loads(&loads(), &selection(), Some(DEFAULT_LOAD_SCALE)).unwrap();
        assert_eq!(reduced.keys().collect::<Vec<_>>(), vec![1, 2, 7]);
        assert_eq!(reduced.row(1).unwrap().values, vec![1.0, 2.0]);
        assert_eq!(reduced.row(7).unwrap().values, vec![0.0, 0.0]);
    }

    #[test]
    fn extended_loads_keep_units() {
        let reduced = subset_loads(&loads(), &selection(), None).unwrap();
        assert_eq!(reduced.row(2).unwrap().values, vec![80_000.0, 40_000.0]);
        assert!(reduced.row(7).unwrap().values.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn buses_without_rows_are_listed() {
        assert_eq!(missing_load_buses(&loads(), &selection()), vec![BusId::new(3)]);
    }

    #[test]
    fn clip_only_above_threshold() {
        let high = SeriesRow { key: 1, values: vec![60.0, 90.0] };
        let low = SeriesRow { key: 2, values: vec![30.0, 90.0] };
        assert_eq!(clip_factor(&high, 30.0), 0.5);
        assert_eq!(clip_factor(&low, 30.0), 1.0);
    }

    #[test]
    fn representative_windows_are_clipped_by_first_hour() {
        let labels = hourly_labels("2018-04-01 23:00:00-07:00", 30).unwrap();
        let mut table = TimeSeriesTable::new("bus", labels);
        table.push(1, vec![60.0; 30]).unwrap();
        table.push(2, (0..30).map(|h| h as f64).collect()).unwrap();

        let day = RepresentativeDay::new("sp", "2018-04-02T01:00:00");
        let windows = representative_loads(&table, &[day], DEFAULT_LOAD_CLIP).unwrap();
        let (day, window) = &windows[0];
        assert_eq!(day.file_name(), "loads_24h_sp.csv");
        assert_eq!(window.width(), 24);
        assert_eq!(window.timestamps[0], "2018-04-02 01:00:00-07:00");
        assert!(window.row(1).unwrap().values.iter().all(|v| *v == 30.0));
        assert_eq!(window.row(2).unwrap().values[0], 2.0);
    }
}
