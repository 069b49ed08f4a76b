//! Line reduction: filter to the retained network, add reverse directions and
//! (extended variant) combine parallel circuits into one corridor per
//! ordered bus pair.

use std::collections::BTreeMap;

use cats_core::{AggregatedLine, BusId, Line};
use tracing::{info, warn};

use crate::area::AreaSelection;

/// Lines with both endpoints in `N`, followed by a mirrored copy of each.
pub fn subset_lines(lines: &[Line], selection: &AreaSelection) -> Vec<Line> {
    let kept: Vec<&Line> = lines
        .iter()
        .filter(|line| selection.contains(line.f_bus) && selection.contains(line.t_bus))
        .collect();
    let mut reduced: Vec<Line> = kept.iter().map(|line| (*line).clone()).collect();
    reduced.extend(kept.iter().map(|line| line.reversed()));
    info!(
        "Kept {} of {} lines ({} records with mirrors)",
        kept.len(),
        lines.len(),
        reduced.len()
    );
    reduced
}

/// Corridors plus the pairs whose susceptance came out non-finite.
#[derive(Debug, Clone, Default)]
pub struct LineAggregation {
    pub lines: Vec<AggregatedLine>,
    pub non_finite: Vec<(BusId, BusId)>,
}

/// Compute `sus = baseMVA * x / (r^2 + x^2)`, merge parallel lines, then
/// convert the summed rating to MVA.
///
/// A line with `r = x = 0` has no finite susceptance; the value is kept and
/// the pair is reported.
pub fn aggregate_lines(lines: &[Line], base_mva: f64) -> LineAggregation {
    let per_line: Vec<AggregatedLine> = lines
        .iter()
        .map(|line| AggregatedLine {
            f_bus: line.f_bus,
            t_bus: line.t_bus,
            rate_a: line.rate_a,
            sus: line.susceptance(base_mva),
            path: line.path.clone(),
        })
        .collect();

    let mut merged = merge_parallel(&per_line);
    let mut non_finite = Vec::new();
    for line in &mut merged {
        line.rate_a *= base_mva;
        if !line.sus.is_finite() {
            warn!(
                f_bus = line.f_bus.value(),
                t_bus = line.t_bus.value(),
                "line susceptance is not finite (r = x = 0)"
            );
            non_finite.push((line.f_bus, line.t_bus));
        }
    }
    LineAggregation {
        lines: merged,
        non_finite,
    }
}

/// Sum `rate_a` and `sus` per ordered `(f_bus, t_bus)`, keeping the first
/// path. Output is sorted by the pair.
pub fn merge_parallel(lines: &[AggregatedLine]) -> Vec<AggregatedLine> {
    let mut groups: BTreeMap<(BusId, BusId), AggregatedLine> = BTreeMap::new();
    for line in lines {
        groups
            .entry((line.f_bus, line.t_bus))
            .and_modify(|acc| {
                acc.rate_a += line.rate_a;
                acc.sus += line.sus;
            })
            .or_insert_with(|| line.clone());
    }
    groups.into_values().collect()
}
