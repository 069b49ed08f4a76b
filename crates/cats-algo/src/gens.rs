//! Generator reduction.
//!
//! Generators at retained buses are kept as-is. Synthetic import units are
//! drawn from the source `IMPORT` rows, one per import bus. The extended
//! variant then drops units with no active capacity, merges identical units
//! at a bus and tags storage and expansion candidates.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use cats_core::{BusId, CostCurve, FuelType, GenId, Generator};
use tracing::{info, warn};

use crate::area::AreaSelection;

/// Default pmax cap (MW) applied to import units in the extended variant.
///
/// A fixed modeling simplification; it does not depend on the ratings of the
/// lines that actually reach the import bus.
pub const DEFAULT_IMPORT_CAP: f64 = 200.0;

/// Cost curve of candidate battery units.
pub const CANDIDATE_BATTERY_COST: CostCurve = CostCurve {
    startup: 0.0,
    shutdown: 0.0,
    n: 0.0,
    c2: 0.06757,
    c1: 16.371712,
    c0: 401.19412,
};

#[derive(Debug, Clone, Default)]
pub struct GeneratorReduction {
    pub generators: Vec<Generator>,
    pub import_generators: usize,
    /// Import buses left without an import unit
    pub uncovered_imports: Vec<BusId>,
}

/// Generators at buses in `N`, then one `IMPORT` unit per import bus.
///
/// Import units are the first `|N_import|` `IMPORT` rows in source order,
/// assigned to import buses in ascending id order.
pub fn subset_gens(gens: &[Generator], selection: &AreaSelection) -> GeneratorReduction {
    let mut generators: Vec<Generator> = gens
        .iter()
        .filter(|gen| selection.contains(gen.bus))
        .cloned()
        .collect();
    let native = generators.len();

    let mut import_buses = selection.imports.iter().copied();
    let mut import_generators = 0;
    for (source, bus) in gens
        .iter()
        .filter(|gen| gen.is_import())
        .zip(import_buses.by_ref())
    {
        let mut unit = source.clone();
        unit.bus = bus;
        generators.push(unit);
        import_generators += 1;
    }
    let uncovered_imports: Vec<BusId> = import_buses.collect();
    if !uncovered_imports.is_empty() {
        warn!(
            covered = import_generators,
            import_buses = selection.imports.len(),
            "fewer IMPORT generators than import buses; {} import buses have no import unit",
            uncovered_imports.len()
        );
    }

    info!(
        "Kept {native} of {} generators and added {import_generators} import units",
        gens.len()
    );
    GeneratorReduction {
        generators,
        import_generators,
        uncovered_imports,
    }
}

/// Merge key `(bus, fueltype, c2, c1, c0)` with a total order on the costs.
#[derive(Debug, Clone, PartialEq)]
struct UnitKey {
    bus: BusId,
    fuel: FuelType,
    costs: [f64; 3],
}

impl Eq for UnitKey {}

impl Ord for UnitKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bus
            .cmp(&other.bus)
            .then_with(|| self.fuel.cmp(&other.fuel))
            .then_with(|| {
                self.costs
                    .iter()
                    .zip(other.costs.iter())
                    .map(|(a, b)| a.total_cmp(b))
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            })
    }
}

impl PartialOrd for UnitKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&Generator> for UnitKey {
    fn from(gen: &Generator) -> Self {
        UnitKey {
            bus: gen.bus,
            fuel: gen.fuel.clone(),
            costs: [gen.cost.c2, gen.cost.c1, gen.cost.c0],
        }
    }
}

fn absorb(acc: &mut Generator, unit: &Generator) {
    acc.pg += unit.pg;
    acc.pmax += unit.pmax;
    acc.pmin += unit.pmin;
    acc.qg += unit.qg;
    acc.qmax += unit.qmax;
    acc.qmin += unit.qmin;
    acc.cost.startup += unit.cost.startup;
    acc.cost.shutdown += unit.cost.shutdown;
    acc.cost.n += unit.cost.n;
}

/// Extended-variant consolidation.
///
/// Drops `pmax <= 0`, merges units sharing `(bus, fueltype, c2, c1, c0)`
/// (sorted by that key; the merged unit keeps the first member's id), tags
/// `ess`/`candidate` from the fuel type and caps import units at
/// `import_cap`.
pub fn merge_generators(gens: Vec<Generator>, import_cap: f64) -> Vec<Generator> {
    let before = gens.len();
    let mut groups: BTreeMap<UnitKey, Generator> = BTreeMap::new();
    for gen in gens.into_iter().filter(|gen| gen.pmax > 0.0) {
        match groups.get_mut(&UnitKey::from(&gen)) {
            Some(acc) => absorb(acc, &gen),
            None => {
                groups.insert(UnitKey::from(&gen), gen);
            }
        }
    }

    let merged: Vec<Generator> = groups
        .into_values()
        .map(|mut gen| {
            gen.ess = gen.fuel.is_storage();
            gen.candidate = gen.fuel.is_expansion_candidate();
            if gen.is_import() {
                gen.pmax = import_cap;
            }
            gen
        })
        .collect();
    info!("Merged {before} generators into {} units", merged.len());
    merged
}

/// Append a candidate solar and a candidate battery unit at each bus, all
/// solar units first. Candidates carry no existing capacity.
pub fn add_candidates(gens: &mut Vec<Generator>, buses: &[BusId]) {
    gens.reserve(buses.len() * 2);
    for bus in buses {
        let mut solar = Generator::new(GenId::new(0), *bus, FuelType::SolarPhotovoltaic);
        solar.candidate = true;
        gens.push(solar);
    }
    for bus in buses {
        let mut battery = Generator::new(GenId::new(0), *bus, FuelType::Batteries)
            .with_cost(CANDIDATE_BATTERY_COST);
        battery.ess = true;
        battery.candidate = true;
        gens.push(battery);
    }
}

/// Number the final table `1..=n`.
pub fn assign_gen_ids(gens: &mut [Generator]) {
    for (idx, gen) in gens.iter_mut().enumerate() {
        gen.id = GenId::new(idx + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn selection(retained: &[usize], imports: &[usize]) -> AreaSelection {
        AreaSelection {
            retained: retained.iter().copied().map(BusId::new).collect(),
            imports: imports.iter().copied().map(BusId::new).collect::<BTreeSet<_>>(),
            isolated: Vec::new(),
            selected_lines: 0,
        }
    }

    fn gen(id: usize, bus: usize, fuel: &str, pmax: f64) -> Generator {
        Generator::new(GenId::new(id), BusId::new(bus), FuelType::from(fuel)).with_pmax(pmax)
    }

    #[test]
    fn import_units_go_to_import_buses_in_order() {
        let gens = vec![
            gen(1, 2, "Natural Gas", 50.0),
            gen(2, 40, "IMPORT", 500.0),
            gen(3, 41, "IMPORT", 600.0),
            gen(4, 42, "IMPORT", 700.0),
            gen(5, 99, "Natural Gas", 80.0),
        ];
        let reduced = subset_gens(&gens, &selection(&[2, 7, 9], &[9, 7]));
        let placed: Vec<(usize, usize)> = reduced
            .generators
            .iter()
            .map(|g| (g.id.value(), g.bus.value()))
            .collect();
        assert_eq!(placed, vec![(1, 2), (2, 7), (3, 9)]);
        assert_eq!(reduced.import_generators, 2);
        assert!(reduced.uncovered_imports.is_empty());
    }

    #[test]
    fn missing_import_rows_leave_buses_uncovered() {
        let gens = vec![gen(1, 40, "IMPORT", 500.0)];
        let reduced = subset_gens(&gens, &selection(&[3, 7, 8], &[7, 8]));
        assert_eq!(reduced.import_generators, 1);
        assert_eq!(reduced.uncovered_imports, vec![BusId::new(8)]);
    }

    #[test]
    fn identical_solar_units_are_merged() {
        let gens = vec![
            gen(1, 2, "Solar Photovoltaic", 5.0),
            gen(2, 2, "Solar Photovoltaic", 10.0),
        ];
        let merged = merge_generators(gens, DEFAULT_IMPORT_CAP);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].bus, BusId::new(2));
        assert_eq!(merged[0].pmax, 15.0);
        assert_eq!(merged[0].id, GenId::new(1));
        assert!(merged[0].candidate);
        assert!(!merged[0].ess);
    }

    #[test]
    fn different_costs_stay_separate() {
        let cheap = gen(1, 2, "Natural Gas", 5.0).with_cost(CostCurve::quadratic(0.0, 10.0, 0.0));
        let dear = gen(2, 2, "Natural Gas", 5.0).with_cost(CostCurve::quadratic(0.0, 20.0, 0.0));
        assert_eq!(merge_generators(vec![dear, cheap], DEFAULT_IMPORT_CAP).len(), 2);
    }

    #[test]
    fn import_pmax_is_capped() {
        let merged = merge_generators(vec![gen(1, 7, "IMPORT", 500.0)], DEFAULT_IMPORT_CAP);
        assert_eq!(merged[0].pmax, 200.0);
    }

    #[test]
    fn zero_capacity_units_are_dropped_and_storage_tagged() {
        let gens = vec![
            gen(1, 3, "Synchronous Condenser", 0.0),
            gen(2, 3, "Hydroelectric Pumped Storage", 40.0),
            gen(3, 4, "Batteries", 10.0),
        ];
        let merged = merge_generators(gens, DEFAULT_IMPORT_CAP);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|g| g.ess));
        assert!(!merged[0].candidate);
        assert!(merged[1].candidate);
    }

    #[test]
    fn candidates_are_appended_then_numbered() {
        let mut gens = vec![gen(10, 1, "Natural Gas", 50.0)];
        add_candidates(&mut gens, &[BusId::new(2), BusId::new(3)]);
        assign_gen_ids(&mut gens);
        let summary: Vec<(usize, usize, &str, bool)> = gens
            .iter()
            .map(|g| (g.id.value(), g.bus.value(), g.fuel.as_str(), g.ess))
            .collect();
        assert_eq!(
            summary,
            vec![
                (1, 1, "Natural Gas", false),
                (2, 2, "Solar Photovoltaic", false),
                (3, 3, "Solar Photovoltaic", false),
                (4, 2, "Batteries", true),
                (5, 3, "Batteries", true),
            ]
        );
        assert_eq!(gens[3].cost.c0, 401.19412);
        assert_eq!(gens[1].pmax, 0.0);
    }
}
