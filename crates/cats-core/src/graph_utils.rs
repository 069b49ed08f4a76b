use crate::BusId;
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::{HashMap, HashSet, VecDeque};

/// Undirected topology over bus ids, one edge per line record.
#[derive(Debug, Default)]
pub struct BusGraph {
    pub graph: UnGraph<BusId, ()>,
    index: HashMap<BusId, NodeIndex>,
}

impl BusGraph {
    /// Build the graph from `(f_bus, t_bus)` pairs; vertices are exactly the
    /// buses that appear as an endpoint.
    pub fn from_edges<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = (BusId, BusId)>,
    {
        let mut topology = BusGraph::default();
        for (from, to) in edges {
            let a = topology.node(from);
            let b = topology.node(to);
            topology.graph.add_edge(a, b, ());
        }
        topology
    }

    fn node(&mut self, bus: BusId) -> NodeIndex {
        if let Some(idx) = self.index.get(&bus) {
            return *idx;
        }
        let idx = self.graph.add_node(bus);
        self.index.insert(bus, idx);
        idx
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, bus: BusId) -> bool {
        self.index.contains_key(&bus)
    }
}

/// A connected set of buses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Island {
    /// Position after ranking (0 = the island the area selector keeps)
    pub island_id: usize,
    /// Members sorted by bus id
    pub buses: Vec<BusId>,
}

impl Island {
    pub fn node_count(&self) -> usize {
        self.buses.len()
    }

    pub fn min_bus(&self) -> Option<BusId> {
        self.buses.first().copied()
    }
}

/// Island summary for CLI reporting.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IslandSummary {
    pub island_id: usize,
    pub node_count: usize,
    pub min_bus: usize,
}

impl From<&Island> for IslandSummary {
    fn from(island: &Island) -> Self {
        IslandSummary {
            island_id: island.island_id,
            node_count: island.node_count(),
            min_bus: island.min_bus().map(|b| b.value()).unwrap_or(0),
        }
    }
}

/// Labels connected components (breadth-first search) and ranks them by
/// size descending, ties broken by the smallest member bus id ascending.
///
/// The ranking does not depend on edge order, so the largest island is the
/// same however the line table happens to be sorted.
pub fn find_islands(topology: &BusGraph) -> Vec<Island> {
    let graph = &topology.graph;
    let mut visited = HashSet::new();
    let mut islands = Vec::new();
    for start in graph.node_indices() {
        if visited.contains(&start) {
            continue;
        }
        let mut queue = VecDeque::new();
        queue.push_back(start);
        let mut members = Vec::new();
        while let Some(node) = queue.pop_front() {
            if !visited.insert(node) {
                continue;
            }
            members.push(graph[node]);
            for neighbor in graph.neighbors(node) {
                if !visited.contains(&neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }
        if members.is_empty() {
            continue;
        }
        members.sort();
        islands.push(Island {
            island_id: 0,
            buses: members,
        });
    }
    islands.sort_by(|a, b| {
        b.node_count()
            .cmp(&a.node_count())
            .then_with(|| a.min_bus().cmp(&b.min_bus()))
    });
    for (rank, island) in islands.iter_mut().enumerate() {
        island.island_id = rank;
    }
    islands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus(id: usize) -> BusId {
        BusId::new(id)
    }

    #[test]
    fn graph_vertices_are_line_endpoints() {
        let topology = BusGraph::from_edges([(bus(1), bus(2)), (bus(2), bus(3))]);
        assert_eq!(topology.node_count(), 3);
        assert_eq!(topology.edge_count(), 2);
        assert!(topology.contains(bus(3)));
        assert!(!topology.contains(bus(4)));
    }

    #[test]
    fn islands_ranked_by_size() {
        let topology = BusGraph::from_edges([
            (bus(10), bus(11)),
            (bus(1), bus(2)),
            (bus(2), bus(3)),
            (bus(3), bus(7)),
        ]);
        let islands = find_islands(&topology);
        assert_eq!(islands.len(), 2);
        assert_eq!(islands[0].buses, vec![bus(1), bus(2), bus(3), bus(7)]);
        assert_eq!(islands[0].island_id, 0);
        assert_eq!(islands[1].buses, vec![bus(10), bus(11)]);
    }

    #[test]
    fn equal_size_islands_break_ties_on_min_bus() {
        let first = find_islands(&BusGraph::from_edges([(bus(8), bus(9)), (bus(4), bus(5))]));
        let second = find_islands(&BusGraph::from_edges([(bus(4), bus(5)), (bus(8), bus(9))]));
        assert_eq!(first[0].min_bus(), Some(bus(4)));
        assert_eq!(first, second);
    }

    #[test]
    fn self_loops_and_parallel_edges_form_single_island() {
        let topology = BusGraph::from_edges([(bus(1), bus(1)), (bus(1), bus(2)), (bus(2), bus(1))]);
        let islands = find_islands(&topology);
        assert_eq!(islands.len(), 1);
        assert_eq!(islands[0].node_count(), 2);
    }

    #[test]
    fn empty_graph_has_no_islands() {
        let topology = BusGraph::from_edges(std::iter::empty());
        assert!(find_islands(&topology).is_empty());
    }
}
