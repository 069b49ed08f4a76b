use std::path::Path;

use anyhow::Result;
use cats_core::{Bus, BusId, BusTable, CatsError};
use std::collections::HashSet;

use crate::schema::{CsvTable, BUS_COLUMNS};

/// Columns interpreted by the loader; everything else is passed through.
const RESERVED: &[&str] = &["bus", "lat", "lon", "geometry"];

/// Load the bus table.
///
/// Bus ids come from the `bus` column when present, otherwise from the
/// 1-based row position.
pub fn load_buses(path: &Path) -> Result<BusTable> {
    let table = CsvTable::read(path)?;
    table.require_all(BUS_COLUMNS)?;
    let lat = table.require("lat")?;
    let lon = table.require("lon")?;
    let id_col = table.column("bus");

    let passthrough: Vec<usize> = (0..table.headers.len())
        .filter(|&col| !RESERVED.contains(&table.headers[col].as_str()))
        .collect();

    let mut seen = HashSet::with_capacity(table.len());
    let mut buses = Vec::with_capacity(table.len());
    for (idx, record) in table.records.iter().enumerate() {
        let row = idx + 1;
        let id = match id_col {
            Some(col) => table.id(record, col, row)?,
            None => row,
        };
        if !seen.insert(id) {
            return Err(CatsError::Validation(format!(
                "{}: bus {id} appears more than once",
                table.name()
            ))
            .into());
        }
        buses.push(Bus {
            id: BusId::new(id),
            lat: table.float(record, lat, row)?,
            lon: table.float(record, lon, row)?,
            attrs: passthrough
                .iter()
                .map(|&col| table.text(record, col).to_string())
                .collect(),
        });
    }

    let mut layout: Vec<String> = table
        .headers
        .iter()
        .filter(|h| h.as_str() != "geometry")
        .cloned()
        .collect();
    if id_col.is_none() {
        layout.insert(0, "bus".to_string());
    }

    Ok(BusTable {
        attr_columns: passthrough
            .iter()
            .map(|&col| table.headers[col].clone())
            .collect(),
        layout,
        buses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn ids_default_to_row_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buses.csv");
        fs::write(&path, "Lat,Lon,kV\n32.7,-117.1,230\n32.8,-117.2,69\n").unwrap();
        let table = load_buses(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.buses[1].id, BusId::new(2));
        assert_eq!(table.attr_columns, vec!["kv".to_string()]);
        assert_eq!(table.buses[1].attrs, vec!["69".to_string()]);
        assert_eq!(table.layout, vec!["bus", "lat", "lon", "kv"]);
    }

    #[test]
    fn layout_keeps_source_order_without_geometry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buses.csv");
        fs::write(
            &path,
            "Zone,geometry,Bus,Lon,Lat\nSDGE,POINT (-117.1 32.7),4,-117.1,32.7\n",
        )
        .unwrap();
        let table = load_buses(&path).unwrap();
        assert_eq!(table.layout, vec!["zone", "bus", "lon", "lat"]);
        assert_eq!(table.attr_columns, vec!["zone"]);
        assert_eq!(table.buses[0].id, BusId::new(4));
    }

    #[test]
    fn explicit_bus_column_and_duplicates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buses.csv");
        fs::write(&path, "bus,lat,lon\n7,32.7,-117.1\n7,32.8,-117.2\n").unwrap();
        let err = load_buses(&path).unwrap_err();
        assert!(err.to_string().contains("bus 7 appears more than once"));
    }

    #[test]
    fn missing_coordinates_fail_fast() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buses.csv");
        fs::write(&path, "bus,lat\n1,32.7\n").unwrap();
        let err = load_buses(&path).unwrap_err();
        assert!(err.to_string().contains("missing required column 'lon'"));
    }
}
