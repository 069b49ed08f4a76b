use std::io::{self, Write};
use std::path::Path;

use anyhow::{anyhow, Result};
use cats_cli::cli::StudyArgs;
use cats_io::{
    load_buses, load_gencost, load_generators, load_lines, load_loads, load_service_area,
};
use cats_ts::read_series;
use tabwriter::TabWriter;

struct InputReport {
    name: &'static str,
    path: String,
    status: Result<String>,
}

impl InputReport {
    fn new(name: &'static str, path: &Path, status: Result<String>) -> Self {
        Self {
            name,
            path: path.display().to_string(),
            status,
        }
    }
}

pub fn handle(study: &StudyArgs) -> Result<()> {
    let config = study.resolve()?;
    let inputs = &config.inputs;
    let mut reports = vec![
        InputReport::new(
            "buses",
            &inputs.buses,
            load_buses(&inputs.buses).map(|t| format!("{} rows", t.len())),
        ),
        InputReport::new(
            "lines",
            &inputs.lines,
            load_lines(&inputs.lines).map(|t| format!("{} rows", t.len())),
        ),
    ];
    let costs = inputs.gencost.as_deref().map(load_gencost);
    if let (Some(path), Some(costs)) = (&inputs.gencost, &costs) {
        let status = match costs {
            Ok(curves) => Ok(format!("{} rows", curves.len())),
            Err(err) => Err(anyhow!("{err:#}")),
        };
        reports.push(InputReport::new("gencost", path, status));
    }
    let curves = match &costs {
        Some(Ok(curves)) => Some(curves.as_slice()),
        _ => None,
    };
    reports.push(InputReport::new(
        "generators",
        &inputs.generators,
        load_generators(&inputs.generators, curves).map(|t| format!("{} rows", t.len())),
    ));
    reports.push(InputReport::new(
        "loads",
        &inputs.loads,
        load_loads(&inputs.loads, inputs.load_format)
            .map(|t| format!("{} rows x {} hours", t.len(), t.width())),
    ));
    reports.push(InputReport::new(
        "area",
        &inputs.area,
        load_service_area(&inputs.area).map(|a| format!("'{}'", a.name)),
    ));
    let series = [
        ("solar_gen_cf", &inputs.solar_gen_cf),
        ("solar_demand_cf", &inputs.solar_demand_cf),
        ("wind_cf", &inputs.wind_cf),
    ];
    for (name, path) in series {
        if let Some(path) = path {
            reports.push(InputReport::new(
                name,
                path,
                read_series(path, "bus").map(|t| format!("{} rows x {} hours", t.len(), t.width())),
            ));
        }
    }

    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "INPUT\tPATH\tSTATUS")?;
    let mut failures = 0;
    for report in &reports {
        let status = match &report.status {
            Ok(summary) => summary.clone(),
            Err(err) => {
                failures += 1;
                format!("error: {err:#}")
            }
        };
        writeln!(writer, "{}\t{}\t{}", report.name, report.path, status)?;
    }
    writer.flush()?;

    if failures > 0 {
        return Err(anyhow!("{failures} input(s) could not be loaded"));
    }
    Ok(())
}
