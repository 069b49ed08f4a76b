//! Bus renumbering.
//!
//! Retained buses are numbered `1..=|N|` in bus-table order. The same map
//! relabels every table that refers to a bus; an id the map does not know is
//! a referential-integrity violation.

use std::collections::HashMap;

use cats_core::{
    AggregatedLine, BusId, BusTable, CatsError, CatsResult, Generator, Line, TimeSeriesTable,
};

use crate::area::AreaSelection;

#[derive(Debug, Clone, Default)]
pub struct BusIndexMap {
    map: HashMap<BusId, BusId>,
}

impl BusIndexMap {
    /// Number the buses of `table` in row order.
    pub fn from_buses(table: &BusTable) -> Self {
        let map = table
            .buses
            .iter()
            .enumerate()
            .map(|(idx, bus)| (bus.id, BusId::new(idx + 1)))
            .collect();
        Self { map }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, old: BusId) -> Option<BusId> {
        self.map.get(&old).copied()
    }

    /// New id of `old`, or an integrity error naming `table`.
    pub fn remap(&self, old: BusId, table: &str) -> CatsResult<BusId> {
        self.get(old).ok_or_else(|| {
            CatsError::Integrity(format!(
                "{table} refers to bus {} which is not in the reduced bus table",
                old.value()
            ))
        })
    }
}

/// Buses in `N`, in source table order.
pub fn retain_buses(table: &BusTable, selection: &AreaSelection) -> BusTable {
    BusTable {
        attr_columns: table.attr_columns.clone(),
        layout: table.layout.clone(),
        buses: table
            .buses
            .iter()
            .filter(|bus| selection.contains(bus.id))
            .cloned()
            .collect(),
    }
}

/// Tables whose bus references are rewritten by a [`BusIndexMap`].
pub trait Reindex {
    fn reindex(&mut self, map: &BusIndexMap) -> CatsResult<()>;
}

impl Reindex for BusTable {
    fn reindex(&mut self, map: &BusIndexMap) -> CatsResult<()> {
        for bus in &mut self.buses {
            bus.id = map.remap(bus.id, "buses")?;
        }
        Ok(())
    }
}

impl Reindex for Vec<Line> {
    fn reindex(&mut self, map: &BusIndexMap) -> CatsResult<()> {
        for line in self.iter_mut() {
            line.f_bus = map.remap(line.f_bus, "lines")?;
            line.t_bus = map.remap(line.t_bus, "lines")?;
        }
        Ok(())
    }
}

impl Reindex for Vec<AggregatedLine> {
    fn reindex(&mut self, map: &BusIndexMap) -> CatsResult<()> {
        for line in self.iter_mut() {
            line.f_bus = map.remap(line.f_bus, "lines")?;
            line.t_bus = map.remap(line.t_bus, "lines")?;
        }
        Ok(())
    }
}

impl Reindex for Vec<Generator> {
    fn reindex(&mut self, map: &BusIndexMap) -> CatsResult<()> {
        for gen in self.iter_mut() {
            gen.bus = map.remap(gen.bus, "generators")?;
        }
        Ok(())
    }
}

/// Load tables keyed by bus.
impl Reindex for TimeSeriesTable {
    fn reindex(&mut self, map: &BusIndexMap) -> CatsResult<()> {
        let table = format!("{} series", self.index_name);
        for row in &mut self.rows {
            row.key = map.remap(BusId::new(row.key), &table)?.value();
        }
        Ok(())
    }
}

/// Check that every reference in already-renumbered tables lies in `1..=bus_count`.
pub fn verify_references<'a>(
    bus_count: usize,
    table: &str,
    buses: impl IntoIterator<Item = &'a BusId>,
) -> CatsResult<()> {
    for bus in buses {
        if bus.value() == 0 || bus.value() > bus_count {
            return Err(CatsError::Integrity(format!(
                "{table} refers to bus {} but the reduced network has {bus_count} buses",
                bus.value()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cats_core::{Bus, GenId, FuelType, LineId};
    use std::collections::BTreeSet;

    fn buses() -> BusTable {
        BusTable::new(vec![
            Bus::new(BusId::new(7), 0.0, 0.0),
            Bus::new(BusId::new(1), 0.0, 0.0),
            Bus::new(BusId::new(4), 0.0, 0.0),
            Bus::new(BusId::new(3), 0.0, 0.0),
        ])
    }

    #[test]
    fn numbering_follows_table_order() {
        let selection = AreaSelection {
            retained: [1, 3, 7].into_iter().map(BusId::new).collect(),
            imports: BTreeSet::new(),
            isolated: Vec::new(),
            selected_lines: 0,
        };
        let mut kept = retain_buses(&buses(), &selection);
        let map = BusIndexMap::from_buses(&kept);
        assert_eq!(map.get(BusId::new(7)), Some(BusId::new(1)));
        assert_eq!(map.get(BusId::new(1)), Some(BusId::new(2)));
        assert_eq!(map.get(BusId::new(3)), Some(BusId::new(3)));
        assert_eq!(map.get(BusId::new(4)), None);

        kept.reindex(&map).unwrap();
        let ids: Vec<usize> = kept.buses.iter().map(|b| b.id.value()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn unknown_reference_is_an_integrity_error() {
        let map = BusIndexMap::from_buses(&buses());
        let mut lines = vec![Line::new(LineId::new(1), BusId::new(7), BusId::new(99))];
        let err = lines.reindex(&map).unwrap_err();
        assert!(matches!(err, CatsError::Integrity(_)));
        assert!(err.to_string().contains("bus 99"));
    }

    #[test]
    fn generators_and_series_are_relabelled() {
        let map = BusIndexMap::from_buses(&buses());
        let mut gens = vec![Generator::new(GenId::new(1), BusId::new(3), FuelType::Import)];
        gens.reindex(&map).unwrap();
        assert_eq!(gens[0].bus, BusId::new(4));

        let mut loads = TimeSeriesTable::new("bus", vec!["t0".into()]);
        loads.push(4, vec![1.0]).unwrap();
        loads.reindex(&map).unwrap();
        assert_eq!(loads.keys().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn verify_rejects_out_of_range() {
        let refs = [BusId::new(1), BusId::new(3)];
        assert!(verify_references(3, "lines", refs.iter()).is_ok());
        assert!(verify_references(2, "lines", refs.iter()).is_err());
    }
}
