//! End-to-end subsetting run.
//!
//! [`run_study`] loads the inputs named by a [`StudyConfig`], runs every
//! reduction stage, checks referential integrity and only then writes the
//! output tables through an [`OutputStage`]. Any error aborts the run before
//! a single output file appears, and names the stage that failed.

use std::path::{Path, PathBuf};

use cats_core::{
    AggregatedLine, BusId, BusTable, CatsError, CatsResult, FuelType, Generator, Line,
    RunDiagnostics, Stage, TimeSeriesTable,
};
use cats_io::exporters::{self, OutputStage};
use cats_io::{
    load_buses, load_gencost, load_generators, load_lines, load_loads, load_service_area,
    ServiceArea,
};
use cats_ts::{read_series, write_series, RepresentativeDay};
use serde::Serialize;
use tracing::{info, warn};

use crate::area::{select_area, AreaSelection, SpatialFilter};
use crate::config::{InputConfig, ReductionConfig, StudyConfig, Variant};
use crate::gens::{add_candidates, assign_gen_ids, merge_generators, subset_gens};
use crate::lines::{aggregate_lines, subset_lines};
use crate::loads::{missing_load_buses, representative_loads, subset_loads};
use crate::reindex::{retain_buses, verify_references, BusIndexMap, Reindex};
use crate::variability::{reconcile_capacity_factors, scope_series, ResourceSeries};

/// Every table a run reads, before any reduction.
#[derive(Debug, Clone)]
pub struct InputTables {
    pub buses: BusTable,
    pub lines: Vec<Line>,
    pub generators: Vec<Generator>,
    pub loads: TimeSeriesTable,
    pub solar_gen_cf: Option<TimeSeriesTable>,
    pub solar_demand_cf: Option<TimeSeriesTable>,
    pub wind_cf: Option<TimeSeriesTable>,
}

/// Read the tables and the service area named in `inputs`.
pub fn load_inputs(inputs: &InputConfig) -> CatsResult<(InputTables, ServiceArea)> {
    read_inputs(inputs).map_err(|err| err.in_stage(Stage::Load))
}

fn read_inputs(inputs: &InputConfig) -> CatsResult<(InputTables, ServiceArea)> {
    let buses = load_buses(&inputs.buses)?;
    let lines = load_lines(&inputs.lines)?;
    let costs = inputs.gencost.as_deref().map(load_gencost).transpose()?;
    let generators = load_generators(&inputs.generators, costs.as_deref())?;
    let loads = load_loads(&inputs.loads, inputs.load_format)?;
    let read_cf = |path: &Option<PathBuf>| -> CatsResult<Option<TimeSeriesTable>> {
        Ok(path
            .as_deref()
            .map(|path| read_series(path, "bus"))
            .transpose()?)
    };
    let tables = InputTables {
        buses,
        lines,
        generators,
        loads,
        solar_gen_cf: read_cf(&inputs.solar_gen_cf)?,
        solar_demand_cf: read_cf(&inputs.solar_demand_cf)?,
        wind_cf: read_cf(&inputs.wind_cf)?,
    };
    let area = load_service_area(&inputs.area)?;
    info!(
        "Loaded {} buses, {} lines, {} generators, {} load rows",
        tables.buses.len(),
        tables.lines.len(),
        tables.generators.len(),
        tables.loads.len()
    );
    Ok((tables, area))
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineOutput {
    /// Base variant: source lines plus their mirrors
    Mirrored(Vec<Line>),
    /// Extended variant: one corridor per ordered bus pair
    Aggregated(Vec<AggregatedLine>),
}

impl LineOutput {
    pub fn len(&self) -> usize {
        match self {
            LineOutput::Mirrored(lines) => lines.len(),
            LineOutput::Aggregated(lines) => lines.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The renumbered, self-consistent test system.
#[derive(Debug, Clone)]
pub struct ReducedSystem {
    pub variant: Variant,
    pub selection: AreaSelection,
    pub buses: BusTable,
    pub lines: LineOutput,
    pub generators: Vec<Generator>,
    pub loads: TimeSeriesTable,
    pub variability: Option<TimeSeriesTable>,
    pub representative_days: Vec<(RepresentativeDay, TimeSeriesTable)>,
}

/// Run every reduction stage on in-memory inputs.
pub fn reduce<A: SpatialFilter + ?Sized>(
    inputs: &InputTables,
    area: &A,
    params: &ReductionConfig,
    run: &mut RunDiagnostics,
) -> CatsResult<ReducedSystem> {
    let extended = params.variant == Variant::Extended;

    let selection = select_area(area, &inputs.lines, &inputs.buses)
        .map_err(|err| err.in_stage(Stage::AreaSelection))?;
    if !selection.isolated.is_empty() {
        run.diagnostics.add_warning(
            "topology",
            &format!(
                "dropped {} isolated buses in {} smaller components",
                selection.isolated_bus_count(),
                selection.isolated.len()
            ),
        );
    }

    let mirrored = subset_lines(&inputs.lines, &selection);
    let mut lines = if extended {
        let aggregation = aggregate_lines(&mirrored, params.base_mva);
        for (f_bus, t_bus) in &aggregation.non_finite {
            run.diagnostics.add_warning_with_entity(
                "electrical",
                "susceptance is not finite (r = x = 0)",
                &format!("Line {} -> {}", f_bus.value(), t_bus.value()),
            );
        }
        LineOutput::Aggregated(aggregation.lines)
    } else {
        LineOutput::Mirrored(mirrored)
    };

    let reduction = subset_gens(&inputs.generators, &selection);
    for bus in &reduction.uncovered_imports {
        run.diagnostics.add_warning_with_entity(
            "import",
            "import bus has no IMPORT generator",
            &bus.to_string(),
        );
    }
    run.stats.import_generators = reduction.import_generators;
    let mut generators = if extended {
        merge_generators(reduction.generators, params.import_cap)
    } else {
        reduction.generators
    };

    let mut buses = retain_buses(&inputs.buses, &selection);
    let map = BusIndexMap::from_buses(&buses);
    reindex_network(&map, &mut buses, &mut lines, &mut generators)
        .map_err(|err| err.in_stage(Stage::Reindex))?;

    let scale = (!extended).then_some(params.load_scale);
    let loads = subset_loads(&inputs.loads, &selection, scale)
        .and_then(|mut loads| {
            loads.reindex(&map)?;
            Ok(loads)
        })
        .map_err(|err| err.in_stage(Stage::LoadReduction))?;
    for bus in missing_load_buses(&inputs.loads, &selection) {
        warn!(bus = bus.value(), "retained bus has no load row");
        run.diagnostics
            .add_warning_with_entity("load", "retained bus has no load row", &bus.to_string());
    }
    let representative_days = if extended {
        Vec::new()
    } else {
        representative_loads(&loads, &params.representative_days, params.load_clip)
            .map_err(|err| CatsError::from(err).in_stage(Stage::LoadReduction))?
    };

    let variability = if extended {
        let table = capacity_factors(inputs, &selection, &map, params, &mut generators)
            .map_err(|err| err.in_stage(Stage::Variability))?;
        Some(table)
    } else {
        None
    };
    let system = ReducedSystem {
        variant: params.variant,
        selection,
        buses,
        lines,
        generators,
        loads,
        variability,
        representative_days,
    };
    check_integrity(&system).map_err(|err| err.in_stage(Stage::Reindex))?;

    run.stats.buses = system.buses.len();
    run.stats.import_buses = system.selection.imports.len();
    run.stats.isolated_buses = system.selection.isolated_bus_count();
    run.stats.lines = system.lines.len();
    run.stats.generators = system.generators.len();
    run.stats.load_rows = system.loads.len();
    run.stats.variability_rows = system.variability.as_ref().map_or(0, TimeSeriesTable::len);
    Ok(system)
}

fn reindex_network(
    map: &BusIndexMap,
    buses: &mut BusTable,
    lines: &mut LineOutput,
    generators: &mut Vec<Generator>,
) -> CatsResult<()> {
    buses.reindex(map)?;
    match lines {
        LineOutput::Mirrored(lines) => lines.reindex(map)?,
        LineOutput::Aggregated(lines) => lines.reindex(map)?,
    }
    generators.reindex(map)
}

fn capacity_factors(
    inputs: &InputTables,
    selection: &AreaSelection,
    map: &BusIndexMap,
    params: &ReductionConfig,
    generators: &mut Vec<Generator>,
) -> CatsResult<TimeSeriesTable> {
    let sources = [
        ("solar_gen_cf", FuelType::SolarPhotovoltaic, &inputs.solar_gen_cf, false),
        ("solar_demand_cf", FuelType::SolarPhotovoltaic, &inputs.solar_demand_cf, false),
        ("wind_cf", FuelType::OnshoreWind, &inputs.wind_cf, true),
    ];
    let mut resources = Vec::with_capacity(sources.len());
    for (name, fuel, table, dedup) in sources {
        let Some(table) = table else {
            continue;
        };
        let mut series = ResourceSeries::new(name, fuel, table.clone());
        series.dedup = dedup;
        resources.push(scope_series(&series, selection, map)?);
    }

    if params.candidates {
        let sites: Vec<_> = resources
            .iter()
            .find(|res| res.name == "solar_demand_cf")
            .map(|res| res.table.keys().map(BusId::new).collect())
            .unwrap_or_default();
        add_candidates(generators, &sites);
        info!("Added {} candidate units", sites.len() * 2);
    }
    assign_gen_ids(generators);
    reconcile_capacity_factors(generators, &resources)
}

/// Every bus reference lies in `1..=|buses|` and each output table has the
/// shape its variant promises.
pub fn check_integrity(system: &ReducedSystem) -> CatsResult<()> {
    let count = system.buses.len();
    let bus_ids: Vec<_> = system.buses.buses.iter().map(|bus| bus.id).collect();
    verify_references(count, "buses", bus_ids.iter())?;
    match &system.lines {
        LineOutput::Mirrored(lines) => verify_references(
            count,
            "lines",
            lines.iter().flat_map(|line| [&line.f_bus, &line.t_bus]),
        )?,
        LineOutput::Aggregated(lines) => verify_references(
            count,
            "lines",
            lines.iter().flat_map(|line| [&line.f_bus, &line.t_bus]),
        )?,
    }
    verify_references(count, "generators", system.generators.iter().map(|gen| &gen.bus))?;
    let load_buses: Vec<_> = system.loads.keys().map(BusId::new).collect();
    verify_references(count, "loads", load_buses.iter())?;

    if let Some(cf) = &system.variability {
        if cf.len() != system.generators.len() {
            return Err(CatsError::Integrity(format!(
                "variability has {} rows for {} generators",
                cf.len(),
                system.generators.len()
            )));
        }
    }
    Ok(())
}

/// Stage every output table, then move them into `out_dir` together.
pub fn write_outputs(system: &ReducedSystem, out_dir: &Path) -> CatsResult<Vec<PathBuf>> {
    stage_outputs(system, out_dir)
        .map_err(CatsError::from)
        .map_err(|err| err.in_stage(Stage::Write))
}

fn stage_outputs(system: &ReducedSystem, out_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut stage = OutputStage::new(out_dir)?;
    exporters::write_buses(&system.buses, &stage.path(exporters::BUSES_FILE))?;
    match &system.lines {
        LineOutput::Mirrored(lines) => {
            exporters::write_lines(lines, &stage.path(exporters::LINES_FILE))?
        }
        LineOutput::Aggregated(lines) => {
            exporters::write_aggregated_lines(lines, &stage.path(exporters::LINES_FILE))?
        }
    }
    match system.variant {
        Variant::Base => {
            exporters::write_gens(&system.generators, &stage.path(exporters::GENS_FILE))?
        }
        Variant::Extended => exporters::write_generators(
            &system.generators,
            &stage.path(exporters::GENERATORS_FILE),
        )?,
    }
    write_series(&system.loads, &stage.path(exporters::LOADS_FILE))?;
    if let Some(cf) = &system.variability {
        write_series(cf, &stage.path(exporters::VARIABILITY_FILE))?;
    }
    for (day, window) in &system.representative_days {
        write_series(window, &stage.path(&day.file_name()))?;
    }
    let written = stage.commit()?;
    info!("Wrote {} tables to {}", written.len(), out_dir.display());
    Ok(written)
}

/// What a run produced, for printing or JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct SubsetSummary {
    pub variant: Variant,
    pub area: String,
    pub output_dir: PathBuf,
    pub outputs: Vec<PathBuf>,
    #[serde(flatten)]
    pub run: RunDiagnostics,
}

impl SubsetSummary {
    pub fn to_json(&self) -> CatsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl std::fmt::Display for SubsetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} system for '{}' written to {}",
            self.variant,
            self.area,
            self.output_dir.display()
        )?;
        write!(f, "{}", self.run)
    }
}

/// Load, reduce, check and write the study described by `config`.
pub fn run_study(config: &StudyConfig) -> CatsResult<SubsetSummary> {
    config.validate()?;
    let (inputs, area) = load_inputs(&config.inputs)?;
    let mut run = RunDiagnostics::new();
    let system = reduce(&inputs, &area, &config.reduction, &mut run)?;
    let outputs = write_outputs(&system, &config.output.dir)?;
    if run.diagnostics.has_warnings() {
        warn!("{}", run.diagnostics.summary());
    }
    Ok(SubsetSummary {
        variant: config.reduction.variant,
        area: area.name.clone(),
        output_dir: config.output.dir.clone(),
        outputs,
        run,
    })
}
