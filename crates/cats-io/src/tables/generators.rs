use std::path::Path;

use anyhow::{bail, Result};
use cats_core::{BusId, CostCurve, FuelType, GenId, Generator};

use crate::schema::{CsvTable, COST_COLUMNS, GENERATOR_COLUMNS};

/// Load the generator table.
///
/// Cost columns are read from the generator table itself unless `costs` is
/// given, in which case row *i* of `costs` belongs to generator row *i*.
pub fn load_generators(path: &Path, costs: Option<&[CostCurve]>) -> Result<Vec<Generator>> {
    let table = CsvTable::read(path)?;
    table.require_all(GENERATOR_COLUMNS)?;
    if costs.is_none() {
        table.require_all(COST_COLUMNS)?;
    }
    if let Some(costs) = costs {
        if costs.len() != table.len() {
            bail!(
                "{} has {} generators but the cost table has {} rows",
                table.name(),
                table.len(),
                costs.len()
            );
        }
    }

    let bus = table.require("bus")?;
    let fueltype = table.require("fueltype")?;
    let pg = table.require("pg")?;
    let pmax = table.require("pmax")?;
    let pmin = table.require("pmin")?;
    let qg = table.require("qg")?;
    let qmax = table.require("qmax")?;
    let qmin = table.require("qmin")?;
    let id_col = table.column("id");

    let mut gens = Vec::with_capacity(table.len());
    for (idx, record) in table.records.iter().enumerate() {
        let row = idx + 1;
        let id = match id_col {
            Some(col) => table.id(record, col, row)?,
            None => row,
        };
        let cost = match costs {
            Some(costs) => costs[idx],
            None => CostCurve {
                startup: table.float(record, table.require("startup")?, row)?,
                shutdown: table.float(record, table.require("shutdown")?, row)?,
                n: table.float(record, table.require("n")?, row)?,
                c2: table.float(record, table.require("c2")?, row)?,
                c1: table.float(record, table.require("c1")?, row)?,
                c0: table.float(record, table.require("c0")?, row)?,
            },
        };
        let fuel = FuelType::from(table.text(record, fueltype));
        gens.push(Generator {
            id: GenId::new(id),
            bus: BusId::new(table.id(record, bus, row)?),
            fuel,
            cost,
            pg: table.float(record, pg, row)?,
            pmax: table.float(record, pmax, row)?,
            pmin: table.float(record, pmin, row)?,
            qg: table.float(record, qg, row)?,
            qmax: table.float(record, qmax, row)?,
            qmin: table.float(record, qmin, row)?,
            ess: false,
            candidate: false,
        });
    }
    Ok(gens)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const HEADER: &str = "bus,fueltype,pg,pmax,pmin,qg,qmax,qmin";

    #[test]
    fn inline_costs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gens.csv");
        fs::write(
            &path,
            format!(
                "{HEADER},startup,shutdown,n,c2,c1,c0\n\
                 2,Solar Photovoltaic,1,5,0,0,0,0,0,0,3,0,0,0\n\
                 9,IMPORT,0,500,0,0,100,-100,0,0,3,0,30,0\n"
            ),
        )
        .unwrap();
        let gens = load_generators(&path, None).unwrap();
        assert_eq!(gens.len(), 2);
        assert_eq!(gens[0].fuel, FuelType::SolarPhotovoltaic);
        assert_eq!(gens[1].id, GenId::new(2));
        assert!(gens[1].is_import());
        assert_eq!(gens[1].cost.c1, 30.0);
    }

    #[test]
    fn separate_cost_table_must_match_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gens.csv");
        fs::write(&path, format!("{HEADER}\n2,Batteries,0,10,0,0,0,0\n")).unwrap();

        let costs = vec![CostCurve::quadratic(0.0, 12.0, 0.0)];
        let gens = load_generators(&path, Some(&costs)).unwrap();
        assert_eq!(gens[0].cost.c1, 12.0);

        let err = load_generators(&path, Some(&[])).unwrap_err();
        assert!(err.to_string().contains("cost table has 0 rows"));
    }

    #[test]
    fn costs_required_without_cost_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gens.csv");
        fs::write(&path, format!("{HEADER}\n2,Batteries,0,10,0,0,0,0\n")).unwrap();
        let err = load_generators(&path, None).unwrap_err();
        assert!(err.to_string().contains("missing required column 'startup'"));
    }
}
