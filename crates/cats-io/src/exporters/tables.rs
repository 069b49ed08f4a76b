use std::path::Path;

use anyhow::{anyhow, Context, Result};
use cats_core::{AggregatedLine, BusTable, Generator, Line};

pub const BUSES_FILE: &str = "buses.csv";
pub const LINES_FILE: &str = "lines.csv";
pub const GENS_FILE: &str = "gens.csv";
pub const GENERATORS_FILE: &str = "generators.csv";
pub const LOADS_FILE: &str = "loads.csv";
pub const VARIABILITY_FILE: &str = "variability.csv";

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

enum BusCell {
    Id,
    Lat,
    Lon,
    Attr(usize),
}

/// Bus table in the column order it was read with, geometry excluded.
pub fn write_buses(table: &BusTable, path: &Path) -> Result<()> {
    let header = table.output_columns();
    let cells = header
        .iter()
        .map(|column| match column.as_str() {
            "bus" => Ok(BusCell::Id),
            "lat" => Ok(BusCell::Lat),
            "lon" => Ok(BusCell::Lon),
            other => table
                .attr_columns
                .iter()
                .position(|attr| attr == other)
                .map(BusCell::Attr)
                .ok_or_else(|| anyhow!("bus column '{other}' has no values")),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut wtr = writer(path)?;
    wtr.write_record(&header)?;
    for bus in &table.buses {
        let record: Vec<String> = cells
            .iter()
            .map(|cell| match cell {
                BusCell::Id => bus.id.value().to_string(),
                BusCell::Lat => bus.lat.to_string(),
                BusCell::Lon => bus.lon.to_string(),
                BusCell::Attr(idx) => bus.attrs.get(*idx).cloned().unwrap_or_default(),
            })
            .collect();
        wtr.write_record(&record)
            .with_context(|| format!("writing bus {} to {}", bus.id.value(), path.display()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Base line table: `id,f_bus,t_bus,r,x,b,rate_a,kv`.
pub fn write_lines(lines: &[Line], path: &Path) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record(["id", "f_bus", "t_bus", "r", "x", "b", "rate_a", "kv"])?;
    for line in lines {
        wtr.write_record(&[
            line.id.value().to_string(),
            line.f_bus.value().to_string(),
            line.t_bus.value().to_string(),
            line.r.to_string(),
            line.x.to_string(),
            line.b.to_string(),
            line.rate_a.to_string(),
            line.kv.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Aggregated corridors: `f_bus,t_bus,rate_a,sus`.
pub fn write_aggregated_lines(lines: &[AggregatedLine], path: &Path) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record(["f_bus", "t_bus", "rate_a", "sus"])?;
    for line in lines {
        wtr.write_record(&[
            line.f_bus.value().to_string(),
            line.t_bus.value().to_string(),
            line.rate_a.to_string(),
            line.sus.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Base generator table (`gens.csv`).
pub fn write_gens(gens: &[Generator], path: &Path) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record([
        "id", "bus", "startup", "shutdown", "n", "c2", "c1", "c0", "fueltype", "pg", "pmax",
        "pmin", "qg", "qmax", "qmin",
    ])?;
    for gen in gens {
        wtr.write_record(&[
            gen.id.value().to_string(),
            gen.bus.value().to_string(),
            gen.cost.startup.to_string(),
            gen.cost.shutdown.to_string(),
            gen.cost.n.to_string(),
            gen.cost.c2.to_string(),
            gen.cost.c1.to_string(),
            gen.cost.c0.to_string(),
            gen.fuel.as_str().to_string(),
            gen.pg.to_string(),
            gen.pmax.to_string(),
            gen.pmin.to_string(),
            gen.qg.to_string(),
            gen.qmax.to_string(),
            gen.qmin.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Extended generator table (`generators.csv`); the generator id is the
/// `gen_id` column.
pub fn write_generators(gens: &[Generator], path: &Path) -> Result<()> {
    let mut wtr = writer(path)?;
    wtr.write_record(["bus", "fueltype", "c2", "c1", "c0", "pmax", "ess", "canidate", "gen_id"])?;
    for gen in gens {
        wtr.write_record([
            gen.bus.value().to_string().as_str(),
            gen.fuel.as_str(),
            gen.cost.c2.to_string().as_str(),
            gen.cost.c1.to_string().as_str(),
            gen.cost.c0.to_string().as_str(),
            gen.pmax.to_string().as_str(),
            flag(gen.ess),
            flag(gen.candidate),
            gen.id.value().to_string().as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
