//! Service-area selection.
//!
//! Lines and buses are clipped against the boundary geometrically: a line is
//! kept when any part of its path touches the area, even if both endpoints
//! are outside. The retained network `N` is the largest connected component
//! of the clipped line graph; members of `N` whose own location is outside
//! the area become import buses.

use std::borrow::Cow;
use std::collections::{BTreeSet, HashMap};

use cats_core::{find_islands, BusGraph, BusId, BusTable, CatsError, CatsResult, Island, Line};
use cats_io::ServiceArea;
use tracing::{debug, info};

/// Point and path predicates against a service boundary.
pub trait SpatialFilter {
    fn contains_point(&self, lon: f64, lat: f64) -> bool;
    fn intersects_path(&self, path: &[[f64; 2]]) -> bool;
}

impl SpatialFilter for ServiceArea {
    fn contains_point(&self, lon: f64, lat: f64) -> bool {
        ServiceArea::contains_point(self, lon, lat)
    }

    fn intersects_path(&self, path: &[[f64; 2]]) -> bool {
        ServiceArea::intersects_path(self, path)
    }
}

/// Lines whose path touches the area.
#[derive(Debug, Clone, Default)]
pub struct ClippedLines<'a> {
    pub selected: Vec<&'a Line>,
    /// Lines with no geometry whose endpoints are missing from the bus table
    pub unresolved: usize,
}

impl ClippedLines<'_> {
    pub fn graph(&self) -> BusGraph {
        BusGraph::from_edges(self.selected.iter().map(|line| (line.f_bus, line.t_bus)))
    }
}

/// `N`, `N_import` and what was dropped to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSelection {
    pub retained: BTreeSet<BusId>,
    pub imports: BTreeSet<BusId>,
    /// Smaller components of the clipped graph
    pub isolated: Vec<Island>,
    pub selected_lines: usize,
}

impl AreaSelection {
    pub fn contains(&self, bus: BusId) -> bool {
        self.retained.contains(&bus)
    }

    pub fn is_import(&self, bus: BusId) -> bool {
        self.imports.contains(&bus)
    }

    pub fn isolated_bus_count(&self) -> usize {
        self.isolated.iter().map(Island::node_count).sum()
    }
}

/// Buses whose location lies inside (or on) the boundary.
pub fn joined_buses<A: SpatialFilter + ?Sized>(area: &A, buses: &BusTable) -> BTreeSet<BusId> {
    buses
        .buses
        .iter()
        .filter(|bus| area.contains_point(bus.lon, bus.lat))
        .map(|bus| bus.id)
        .collect()
}

/// Lines whose geometry intersects the boundary.
///
/// Lines without a path fall back to the straight segment between their
/// endpoint buses.
pub fn clip_lines<'a, A: SpatialFilter + ?Sized>(
    area: &A,
    lines: &'a [Line],
    buses: &BusTable,
) -> ClippedLines<'a> {
    let coords: HashMap<BusId, [f64; 2]> = buses
        .buses
        .iter()
        .map(|bus| (bus.id, [bus.lon, bus.lat]))
        .collect();

    let mut clipped = ClippedLines::default();
    for line in lines {
        match line_path(line, &coords) {
            Some(path) if area.intersects_path(&path) => clipped.selected.push(line),
            Some(_) => {}
            None => clipped.unresolved += 1,
        }
    }
    clipped
}

fn line_path<'a>(line: &'a Line, coords: &HashMap<BusId, [f64; 2]>) -> Option<Cow<'a, [[f64; 2]]>> {
    if !line.path.is_empty() {
        return Some(Cow::Borrowed(&line.path));
    }
    let from = coords.get(&line.f_bus)?;
    let to = coords.get(&line.t_bus)?;
    Some(Cow::Owned(vec![*from, *to]))
}

/// Every component of the clipped line graph, largest first.
pub fn area_islands<A: SpatialFilter + ?Sized>(
    area: &A,
    lines: &[Line],
    buses: &BusTable,
) -> Vec<Island> {
    find_islands(&clip_lines(area, lines, buses).graph())
}

/// Keep the first (largest) island; everything in it that was not spatially
/// joined is an import bus.
pub fn select_component(
    islands: Vec<Island>,
    joined: &BTreeSet<BusId>,
    selected_lines: usize,
) -> CatsResult<AreaSelection> {
    let mut islands = islands.into_iter();
    let main = islands.next().ok_or_else(|| {
        CatsError::Config(
            "the service area intersects no transmission lines; no connected network to keep"
                .to_string(),
        )
    })?;
    let isolated: Vec<Island> = islands.collect();

    let retained: BTreeSet<BusId> = main.buses.into_iter().collect();
    let imports: BTreeSet<BusId> = retained.difference(joined).copied().collect();

    Ok(AreaSelection {
        retained,
        imports,
        isolated,
        selected_lines,
    })
}

/// Compute (`N`, `N_import`) for `area`.
pub fn select_area<A: SpatialFilter + ?Sized>(
    area: &A,
    lines: &[Line],
    buses: &BusTable,
) -> CatsResult<AreaSelection> {
    let clipped = clip_lines(area, lines, buses);
    if clipped.unresolved > 0 {
        debug!(
            unresolved = clipped.unresolved,
            "lines without geometry or endpoint coordinates were skipped"
        );
    }
    let joined = joined_buses(area, buses);
    let islands = find_islands(&clipped.graph());
    let selection = select_component(islands, &joined, clipped.selected.len())?;

    info!(
        "Created a system with {} buses ({} import). Removed {} isolated buses.",
        selection.retained.len(),
        selection.imports.len(),
        selection.isolated_bus_count()
    );
    Ok(selection)
}
