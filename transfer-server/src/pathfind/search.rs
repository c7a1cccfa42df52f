//! Multi-source, multi-sink shortest path over a [`WalkableGraph`].
//!
//! Conceptually a virtual source joins every origin anchor and a virtual
//! sink joins every destination anchor with zero-weight edges; in practice
//! all origins start in the queue at distance zero and the search stops at
//! the first destination it settles.
//!
//! Edge weights are haversine lengths. If an edge the filter lets through
//! and that is reachable from either anchor set has no length, the search
//! falls back to breadth-first hop counting and reports
//! [`DistanceMode::Hops`]. Components the anchors cannot reach do not
//! matter.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet, VecDeque};

use ordered_float::OrderedFloat;
use serde::Serialize;
use tracing::trace;

use crate::domain::WayClass;
use crate::graph::{EdgeIdx, GraphEdge, NodeIdx, WalkableGraph};

use super::budget::SearchBudget;

/// Interrupt checks happen every this many settled nodes.
const CHECK_EVERY: usize = 64;

/// Which edges a search may traverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeFilter {
    All,
    Classes(Vec<WayClass>),
}

impl EdgeFilter {
    /// Platform, platform edge and crossing edges only.
    pub fn buffer() -> Self {
        EdgeFilter::Classes(vec![
            WayClass::Platform,
            WayClass::PlatformEdge,
            WayClass::Crossing,
        ])
    }

    pub fn allows(&self, edge: &GraphEdge) -> bool {
        match self {
            EdgeFilter::All => true,
            EdgeFilter::Classes(classes) => classes.contains(&edge.class),
        }
    }
}

/// Unit of a path distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMode {
    Meters,
    /// Uniform edge weight; not a physical distance.
    Hops,
}

/// Why no path was returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnreachableReason {
    /// One of the anchor sets was empty.
    EmptyAnchors,
    /// The anchor sets are in different components.
    NoPath,
    /// The explored-node budget ran out.
    BudgetExhausted,
    /// The deadline passed or the search was cancelled.
    Cancelled,
}

/// A found path.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundPath {
    pub distance: f64,
    pub mode: DistanceMode,
    /// Traversed edges from an origin anchor to a destination anchor.
    pub edges: Vec<EdgeIdx>,
    /// Nodes settled during the search.
    pub explored: usize,
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    Reachable(FoundPath),
    Unreachable(UnreachableReason),
}

impl PathOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, PathOutcome::Reachable(_))
    }

    pub fn path(&self) -> Option<&FoundPath> {
        match self {
            PathOutcome::Reachable(p) => Some(p),
            PathOutcome::Unreachable(_) => None,
        }
    }
}

/// Distance mode of a search between `origins` and `destinations`.
///
/// Metric unless some edge allowed by `filter` in the components of the
/// anchors lacks a length.
pub fn distance_mode(
    graph: &WalkableGraph,
    origins: &[NodeIdx],
    destinations: &[NodeIdx],
    filter: &EdgeFilter,
) -> DistanceMode {
    let mut seen = vec![false; graph.node_count()];
    let mut stack = Vec::new();
    for &n in origins.iter().chain(destinations) {
        if !seen[n.index()] {
            seen[n.index()] = true;
            stack.push(n);
        }
    }

    while let Some(node) = stack.pop() {
        for &e in graph.incident(node) {
            let edge = graph.edge(e);
            if !filter.allows(edge) {
                continue;
            }
            if edge.length_m.is_none() {
                return DistanceMode::Hops;
            }
            let next = edge.other(node);
            if !seen[next.index()] {
                seen[next.index()] = true;
                stack.push(next);
            }
        }
    }
    DistanceMode::Meters
}

/// Shortest path from any node in `origins` to any node in `destinations`.
pub fn shortest_path(
    graph: &WalkableGraph,
    origins: &[NodeIdx],
    destinations: &[NodeIdx],
    filter: &EdgeFilter,
    budget: &SearchBudget,
) -> PathOutcome {
    if origins.is_empty() || destinations.is_empty() {
        return PathOutcome::Unreachable(UnreachableReason::EmptyAnchors);
    }
    if budget.interrupted() {
        return PathOutcome::Unreachable(UnreachableReason::Cancelled);
    }

    let mode = distance_mode(graph, origins, destinations, filter);
    let targets: HashSet<NodeIdx> = destinations.iter().copied().collect();
    if origins.iter().any(|o| targets.contains(o)) {
        return PathOutcome::Reachable(FoundPath {
            distance: 0.0,
            mode,
            edges: Vec::new(),
            explored: 0,
        });
    }

    let outcome = match mode {
        DistanceMode::Meters => dijkstra(graph, origins, &targets, filter, budget),
        DistanceMode::Hops => bfs(graph, origins, &targets, filter, budget),
    };
    trace!(
        station = %graph.station(),
        reachable = outcome.is_reachable(),
        "path search finished"
    );
    outcome
}

/// Per-node search state shared by both algorithms.
struct Frontier {
    settled: Vec<bool>,
    pred: Vec<Option<EdgeIdx>>,
    explored: usize,
}

impl Frontier {
    fn new(n: usize) -> Self {
        Self {
            settled: vec![false; n],
            pred: vec![None; n],
            explored: 0,
        }
    }

    /// Count a settled node and check limits.
    fn settle(&mut self, node: NodeIdx, budget: &SearchBudget) -> Result<(), UnreachableReason> {
        self.settled[node.index()] = true;
        self.explored += 1;
        if self.explored > budget.max_explored {
            return Err(UnreachableReason::BudgetExhausted);
        }
        if self.explored % CHECK_EVERY == 0 && budget.interrupted() {
            return Err(UnreachableReason::Cancelled);
        }
        Ok(())
    }

    fn path_to(&self, graph: &WalkableGraph, mut node: NodeIdx) -> Vec<EdgeIdx> {
        let mut edges = Vec::new();
        while let Some(e) = self.pred[node.index()] {
            edges.push(e);
            node = graph.edge(e).other(node);
        }
        edges.reverse();
        edges
    }
}

fn dijkstra(
    graph: &WalkableGraph,
    origins: &[NodeIdx],
    targets: &HashSet<NodeIdx>,
    filter: &EdgeFilter,
    budget: &SearchBudget,
) -> PathOutcome {
    let n = graph.node_count();
    let mut state = Frontier::new(n);
    let mut dist = vec![f64::INFINITY; n];
    let mut heap = BinaryHeap::new();

    for &o in origins {
        dist[o.index()] = 0.0;
        heap.push(Reverse((OrderedFloat(0.0), o)));
    }

    while let Some(Reverse((OrderedFloat(d), node))) = heap.pop() {
        if state.settled[node.index()] || d > dist[node.index()] {
            continue;
        }
        if let Err(reason) = state.settle(node, budget) {
            return PathOutcome::Unreachable(reason);
        }
        if targets.contains(&node) {
            return PathOutcome::Reachable(FoundPath {
                distance: d,
                mode: DistanceMode::Meters,
                edges: state.path_to(graph, node),
                explored: state.explored,
            });
        }

        for &e in graph.incident(node) {
            let edge = graph.edge(e);
            if !filter.allows(edge) {
                continue;
            }
            let next = edge.other(node);
            if state.settled[next.index()] {
                continue;
            }
            let nd = d + edge.length_m.unwrap_or(1.0);
            if nd < dist[next.index()] {
                dist[next.index()] = nd;
                state.pred[next.index()] = Some(e);
                heap.push(Reverse((OrderedFloat(nd), next)));
            }
        }
    }

    PathOutcome::Unreachable(UnreachableReason::NoPath)
}

fn bfs(
    graph: &WalkableGraph,
    origins: &[NodeIdx],
    targets: &HashSet<NodeIdx>,
    filter: &EdgeFilter,
    budget: &SearchBudget,
) -> PathOutcome {
    let n = graph.node_count();
    let mut state = Frontier::new(n);
    let mut hops = vec![usize::MAX; n];
    let mut queue = VecDeque::new();

    let mut starts: Vec<NodeIdx> = origins.to_vec();
    starts.sort_unstable();
    starts.dedup();
    for o in starts {
        hops[o.index()] = 0;
        queue.push_back(o);
    }

    while let Some(node) = queue.pop_front() {
        if let Err(reason) = state.settle(node, budget) {
            return PathOutcome::Unreachable(reason);
        }
        if targets.contains(&node) {
            return PathOutcome::Reachable(FoundPath {
                distance: hops[node.index()] as f64,
                mode: DistanceMode::Hops,
                edges: state.path_to(graph, node),
                explored: state.explored,
            });
        }

        for &e in graph.incident(node) {
            let edge = graph.edge(e);
            if !filter.allows(edge) {
                continue;
            }
            let next = edge.other(node);
            if hops[next.index()] == usize::MAX {
                hops[next.index()] = hops[node.index()] + 1;
                state.pred[next.index()] = Some(e);
                queue.push_back(next);
            }
        }
    }

    PathOutcome::Unreachable(UnreachableReason::NoPath)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{Coord, NodeId, StationId, WayId};
    use crate::graph::GraphBuilder;
    use crate::snapshot::fixtures::tags;
    use proptest::prelude::*;
    use std::collections::HashMap;

    /// Random graph over up to 25 nodes. A few nodes lose their coordinates
    /// so hop mode gets exercised too.
    fn arb_graph() -> impl Strategy<Value = WalkableGraph> {
        (2usize..25)
            .prop_flat_map(|n| {
                (
                    Just(n),
                    prop::collection::vec((0..n, 0..n), 1..60),
                    prop::collection::vec((0.0f64..0.005, 0.0f64..0.005), n),
                    prop::collection::vec(prop::bool::weighted(0.1), n),
                )
            })
            .prop_map(|(_, pairs, offsets, holes)| {
                let coords: HashMap<NodeId, Coord> = offsets
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| !holes[*i])
                    .map(|(i, (dlat, dlon))| {
                        (NodeId(i as i64), Coord::new(48.0 + dlat, 7.0 + dlon))
                    })
                    .collect();
                let mut b = GraphBuilder::new(StationId(1), coords);
                b.add_way(WayId(1), tags(&[("highway", "footway")]), true);
                for (x, y) in pairs {
                    b.add_segment(WayId(1), NodeId(x as i64), NodeId(y as i64));
                }
                b.finish(&HashMap::new())
            })
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(g in arb_graph(), a in 0usize..25, b in 0usize..25) {
            let a = g.index_of(NodeId(a as i64));
            let b = g.index_of(NodeId(b as i64));
            prop_assume!(a.is_some() && b.is_some());
            let (a, b) = (vec![a.unwrap()], vec![b.unwrap()]);

            let budget = SearchBudget::default();
            let ab = shortest_path(&g, &a, &b, &EdgeFilter::All, &budget);
            let ba = shortest_path(&g, &b, &a, &EdgeFilter::All, &budget);
            match (ab, ba) {
                (PathOutcome::Reachable(x), PathOutcome::Reachable(y)) => {
                    prop_assert_eq!(x.mode, y.mode);
                    prop_assert!((x.distance - y.distance).abs() <= 1e-6 * x.distance.max(1.0));
                }
                (x, y) => prop_assert_eq!(x, y),
            }
        }

        #[test]
        fn path_length_matches_distance(g in arb_graph(), a in 0usize..25, b in 0usize..25) {
            let a = g.index_of(NodeId(a as i64));
            let b = g.index_of(NodeId(b as i64));
            prop_assume!(a.is_some() && b.is_some());

            let out = shortest_path(&g, &[a.unwrap()], &[b.unwrap()], &EdgeFilter::All, &SearchBudget::default());
            if let PathOutcome::Reachable(p) = out {
                let sum: f64 = match p.mode {
                    DistanceMode::Meters => p.edges.iter().map(|e| g.edge(*e).length_m.unwrap_or(0.0)).sum(),
                    DistanceMode::Hops => p.edges.len() as f64,
                };
                prop_assert!((sum - p.distance).abs() <= 1e-6 * sum.max(1.0));
            }
        }
    }
}
