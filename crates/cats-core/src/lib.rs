//! # cats-core: Grid Subsetting Core
//!
//! Element types and shared infrastructure for carving a self-consistent test
//! system out of the CATS synthetic grid.
//!
//! ## Design Philosophy
//!
//! Every table the pipeline touches (buses, lines, generators, loads and
//! capacity factors) is a plain `Vec` of typed rows keyed by 1-based integer
//! identifiers. Foreign keys (`bus`, `f_bus`, `t_bus`) are newtype IDs so a
//! generator id can never be substituted for a bus id while renumbering.
//!
//! The topology is only materialized as a graph when it is needed for
//! connectivity queries (see [`graph_utils`]); the reducers themselves work
//! on the row vectors directly.
//!
//! ## Core Data Structures
//!
//! - [`Bus`] / [`BusTable`] - buses with coordinates and passthrough columns
//! - [`Line`] / [`AggregatedLine`] - raw and parallel-combined transmission lines
//! - [`Generator`] - generator record with cost curve and capacity limits
//! - [`FuelType`] - categorical fuel type, including the `IMPORT` sentinel
//! - [`TimeSeriesTable`] - wide hourly series (loads, capacity factors)
//!
//! ## Modules
//!
//! - [`diagnostics`] - warning collection for a pipeline run
//! - [`error`] - the [`CatsError`] type and the [`Stage`] labels
//! - [`graph_utils`] - connected components over line endpoint pairs
//! - [`timeseries`] - wide time-series table

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod diagnostics;
pub mod error;
pub mod graph_utils;
pub mod timeseries;

pub use diagnostics::{Diagnostics, ReductionStats, RunDiagnostics, Warning};
pub use error::{CatsError, CatsResult, Stage};
pub use graph_utils::*;
pub use timeseries::{SeriesRow, TimeSeriesTable};

/// System MVA base used by the CATS case.
pub const BASE_MVA: f64 = 100.0;

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenId(usize);

impl BusId {
    #[inline]
    pub fn new(value: usize) -> Self {
        BusId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl LineId {
    #[inline]
    pub fn new(value: usize) -> Self {
        LineId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl GenId {
    #[inline]
    pub fn new(value: usize) -> Self {
        GenId(value)
    }
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bus {}", self.0)
    }
}

impl fmt::Display for GenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gen {}", self.0)
    }
}

/// Fuel type of a generator as spelled in the CATS generator table.
///
/// Only the categories the reducers branch on get their own variant; every
/// other label round-trips through [`FuelType::Other`] unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FuelType {
    /// Synthetic tie to the grid outside the study area.
    Import,
    SolarPhotovoltaic,
    OnshoreWind,
    Batteries,
    PumpedStorage,
    Other(String),
}

impl FuelType {
    pub fn as_str(&self) -> &str {
        match self {
            FuelType::Import => "IMPORT",
            FuelType::SolarPhotovoltaic => "Solar Photovoltaic",
            FuelType::OnshoreWind => "Onshore Wind Turbine",
            FuelType::Batteries => "Batteries",
            FuelType::PumpedStorage => "Hydroelectric Pumped Storage",
            FuelType::Other(label) => label.as_str(),
        }
    }

    /// Energy storage technologies (`ess` flag).
    pub fn is_storage(&self) -> bool {
        matches!(self, FuelType::PumpedStorage | FuelType::Batteries)
    }

    /// Technologies eligible for capacity expansion (`canidate` flag).
    pub fn is_expansion_candidate(&self) -> bool {
        matches!(self, FuelType::Batteries | FuelType::SolarPhotovoltaic)
    }
}

impl From<&str> for FuelType {
    fn from(label: &str) -> Self {
        match label.trim() {
            "IMPORT" => FuelType::Import,
            "Solar Photovoltaic" => FuelType::SolarPhotovoltaic,
            "Onshore Wind Turbine" => FuelType::OnshoreWind,
            "Batteries" => FuelType::Batteries,
            "Hydroelectric Pumped Storage" => FuelType::PumpedStorage,
            other => FuelType::Other(other.to_string()),
        }
    }
}

impl FromStr for FuelType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(FuelType::from(s))
    }
}

// Ordered by label so grouped output sorts the way the CATS tables read.
impl Ord for FuelType {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl PartialOrd for FuelType {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FuelType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FuelType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(FuelType::from(raw.as_str()))
    }
}

/// A bus with its geographic location.
///
/// Columns of the source table that the pipeline does not interpret are kept
/// verbatim in `attrs`, aligned with [`BusTable::attr_columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    pub id: BusId,
    pub lat: f64,
    pub lon: f64,
    pub attrs: Vec<String>,
}

impl Bus {
    pub fn new(id: BusId, lat: f64, lon: f64) -> Self {
        Self {
            id,
            lat,
            lon,
            attrs: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BusTable {
    pub attr_columns: Vec<String>,
    /// Column order of the source table (without geometry); empty means
    /// `bus,lat,lon` followed by `attr_columns`.
    pub layout: Vec<String>,
    pub buses: Vec<Bus>,
}

impl BusTable {
    pub fn new(buses: Vec<Bus>) -> Self {
        Self {
            attr_columns: Vec::new(),
            layout: Vec::new(),
            buses,
        }
    }

    /// Columns to write, in order.
    pub fn output_columns(&self) -> Vec<String> {
        if !self.layout.is_empty() {
            return self.layout.clone();
        }
        let mut columns = vec!["bus".to_string(), "lat".to_string(), "lon".to_string()];
        columns.extend(self.attr_columns.iter().cloned());
        columns
    }

    pub fn len(&self) -> usize {
        self.buses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
    }

    pub fn get(&self, id: BusId) -> Option<&Bus> {
        self.buses.iter().find(|bus| bus.id == id)
    }
}

/// A transmission line as listed in the source table.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub id: LineId,
    pub f_bus: BusId,
    pub t_bus: BusId,
    /// Series resistance (per-unit)
    pub r: f64,
    /// Series reactance (per-unit)
    pub x: f64,
    /// Total line charging susceptance (per-unit)
    pub b: f64,
    /// Long-term thermal rating (per-unit of [`BASE_MVA`])
    pub rate_a: f64,
    pub kv: f64,
    /// Polyline in (lon, lat) order; empty when the source carries no geometry.
    pub path: Vec<[f64; 2]>,
}

impl Line {
    pub fn new(id: LineId, f_bus: BusId, t_bus: BusId) -> Self {
        Self {
            id,
            f_bus,
            t_bus,
            r: 0.0,
            x: 0.0,
            b: 0.0,
            rate_a: 0.0,
            kv: 0.0,
            path: Vec::new(),
        }
    }

    pub fn with_impedance(mut self, r: f64, x: f64) -> Self {
        self.r = r;
        self.x = x;
        self
    }

    pub fn with_rating(mut self, rate_a: f64) -> Self {
        self.rate_a = rate_a;
        self
    }

    /// The same line traversed from `t_bus` to `f_bus`.
    pub fn reversed(&self) -> Self {
        let mut line = self.clone();
        std::mem::swap(&mut line.f_bus, &mut line.t_bus);
        line
    }

    /// DC susceptance `baseMVA * x / (r^2 + x^2)`.
    pub fn susceptance(&self, base_mva: f64) -> f64 {
        base_mva * self.x / (self.r * self.r + self.x * self.x)
    }
}

/// One record per ordered bus pair after parallel lines have been combined.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedLine {
    pub f_bus: BusId,
    pub t_bus: BusId,
    /// Summed thermal rating in MVA
    pub rate_a: f64,
    /// Summed susceptance
    pub sus: f64,
    pub path: Vec<[f64; 2]>,
}

/// Quadratic cost curve `c2 * p^2 + c1 * p + c0` plus commitment costs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostCurve {
    pub startup: f64,
    pub shutdown: f64,
    pub n: f64,
    pub c2: f64,
    pub c1: f64,
    pub c0: f64,
}

impl CostCurve {
    pub fn quadratic(c2: f64, c1: f64, c0: f64) -> Self {
        Self {
            c2,
            c1,
            c0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub id: GenId,
    pub bus: BusId,
    pub fuel: FuelType,
    pub cost: CostCurve,
    /// Active power output (MW)
    pub pg: f64,
    pub pmax: f64,
    pub pmin: f64,
    /// Reactive power output (MVAr)
    pub qg: f64,
    pub qmax: f64,
    pub qmin: f64,
    /// Energy storage system
    pub ess: bool,
    /// Eligible for capacity expansion
    pub candidate: bool,
}

impl Generator {
    pub fn new(id: GenId, bus: BusId, fuel: FuelType) -> Self {
        Self {
            id,
            bus,
            fuel,
            cost: CostCurve::default(),
            pg: 0.0,
            pmax: 0.0,
            pmin: 0.0,
            qg: 0.0,
            qmax: 0.0,
            qmin: 0.0,
            ess: false,
            candidate: false,
        }
    }

    pub fn with_pmax(mut self, pmax: f64) -> Self {
        self.pmax = pmax;
        self
    }

    pub fn with_cost(mut self, cost: CostCurve) -> Self {
        self.cost = cost;
        self
    }

    pub fn is_import(&self) -> bool {
        self.fuel == FuelType::Import
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuel_type_round_trips_known_and_unknown_labels() {
        for label in [
            "IMPORT",
            "Solar Photovoltaic",
            "Onshore Wind Turbine",
            "Batteries",
            "Hydroelectric Pumped Storage",
            "Natural Gas Fired Combined Cycle",
        ] {
            assert_eq!(FuelType::from(label).as_str(), label);
        }
        assert_eq!("IMPORT".parse::<FuelType>().unwrap(), FuelType::Import);
        assert_eq!(FuelType::from(" Batteries "), FuelType::Batteries);
    }

    #[test]
    fn storage_and_candidate_flags() {
        assert!(FuelType::Batteries.is_storage());
        assert!(FuelType::PumpedStorage.is_storage());
        assert!(!FuelType::SolarPhotovoltaic.is_storage());

        assert!(FuelType::Batteries.is_expansion_candidate());
        assert!(FuelType::SolarPhotovoltaic.is_expansion_candidate());
        assert!(!FuelType::PumpedStorage.is_expansion_candidate());
        assert!(!FuelType::Import.is_expansion_candidate());
    }

    #[test]
    fn reversed_line_swaps_endpoints_only() {
        let line = Line::new(LineId::new(4), BusId::new(1), BusId::new(2))
            .with_impedance(0.01, 0.1)
            .with_rating(2.5);
        let rev = line.reversed();
        assert_eq!(rev.f_bus, BusId::new(2));
        assert_eq!(rev.t_bus, BusId::new(1));
        assert_eq!(rev.id, line.id);
        assert_eq!(rev.rate_a, line.rate_a);
    }

    #[test]
    fn susceptance_uses_base_mva() {
        let line = Line::new(LineId::new(1), BusId::new(1), BusId::new(2)).with_impedance(0.0, 0.1);
        assert!((line.susceptance(BASE_MVA) - 1000.0).abs() < 1e-9);
    }
}
