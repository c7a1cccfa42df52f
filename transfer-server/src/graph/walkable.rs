//! Per-station walkable graph.
//!
//! Nodes and edges live in flat arenas and refer to each other by index.
//! Edges are undirected: each edge appears in the adjacency list of both of
//! its endpoints.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;

use crate::domain::{Coord, NodeId, StationId, Tags, WayClass, WayId, classify, haversine_m};

/// Index of a node in [`WalkableGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIdx(pub u32);

/// Index of an edge in [`WalkableGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIdx(pub u32);

impl NodeIdx {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeIdx {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A graph node.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub osm: NodeId,
    pub coord: Option<Coord>,
}

/// An undirected edge between two consecutive nodes of a way.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdge {
    pub a: NodeIdx,
    pub b: NodeIdx,
    pub way: WayId,
    pub class: WayClass,
    /// Haversine length, when both endpoints have coordinates.
    pub length_m: Option<f64>,
}

impl GraphEdge {
    /// The endpoint opposite `from`.
    pub fn other(&self, from: NodeIdx) -> NodeIdx {
        if self.a == from { self.b } else { self.a }
    }
}

/// Metadata of a way included in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct WayInfo {
    pub id: WayId,
    pub class: WayClass,
    pub tags: Tags,
    /// Graph nodes of the way, in way order.
    pub nodes: Vec<NodeIdx>,
    /// Whether the way is a direct member of the station relation.
    pub member: bool,
}

impl WayInfo {
    /// Value of a tag, if present.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// Walking network of one station.
///
/// An empty graph is valid: it means nothing is known about the station's
/// layout and every transfer there resolves through the fallback tier.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkableGraph {
    station: StationId,
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    adjacency: Vec<Vec<EdgeIdx>>,
    node_index: HashMap<NodeId, NodeIdx>,
    /// Sorted by way id.
    ways: Vec<WayInfo>,
}

impl WalkableGraph {
    /// A graph with no nodes.
    pub fn empty(station: StationId) -> Self {
        Self {
            station,
            nodes: Vec::new(),
            edges: Vec::new(),
            adjacency: Vec::new(),
            node_index: HashMap::new(),
            ways: Vec::new(),
        }
    }

    pub fn station(&self) -> StationId {
        self.station
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, idx: NodeIdx) -> &GraphNode {
        &self.nodes[idx.index()]
    }

    pub fn edge(&self, idx: EdgeIdx) -> &GraphEdge {
        &self.edges[idx.index()]
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Edges incident to a node.
    pub fn incident(&self, idx: NodeIdx) -> &[EdgeIdx] {
        &self.adjacency[idx.index()]
    }

    /// Graph index of an OSM node, if the node is in the graph.
    pub fn index_of(&self, node: NodeId) -> Option<NodeIdx> {
        self.node_index.get(&node).copied()
    }

    /// Included ways, sorted by id.
    pub fn ways(&self) -> &[WayInfo] {
        &self.ways
    }

    pub fn way(&self, id: WayId) -> Option<&WayInfo> {
        self.ways
            .binary_search_by_key(&id, |w| w.id)
            .ok()
            .map(|i| &self.ways[i])
    }

    /// Returns true if every edge has a metric length.
    pub fn is_metric(&self) -> bool {
        self.edges.iter().all(|e| e.length_m.is_some())
    }

    /// Counts for diagnostics.
    pub fn summary(&self) -> GraphSummary {
        let mut classes = BTreeMap::new();
        for way in &self.ways {
            *classes.entry(way.class).or_insert(0) += 1;
        }
        GraphSummary {
            station: self.station,
            nodes: self.nodes.len(),
            edges: self.edges.len(),
            ways: self.ways.len(),
            member_ways: self.ways.iter().filter(|w| w.member).count(),
            metric: self.is_metric(),
            classes,
        }
    }
}

/// Size and composition of a graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphSummary {
    pub station: StationId,
    pub nodes: usize,
    pub edges: usize,
    pub ways: usize,
    pub member_ways: usize,
    pub metric: bool,
    pub classes: BTreeMap<WayClass, usize>,
}

/// Incremental arena construction.
///
/// Insertion order determines indices, so callers feed ways and segments in
/// a fixed order to get identical graphs from identical input.
#[derive(Debug)]
pub struct GraphBuilder {
    graph: WalkableGraph,
    coords: HashMap<NodeId, Coord>,
    seen: HashSet<(NodeIdx, NodeIdx, WayId)>,
    classes: HashMap<WayId, WayClass>,
}

impl GraphBuilder {
    pub fn new(station: StationId, coords: HashMap<NodeId, Coord>) -> Self {
        Self {
            graph: WalkableGraph::empty(station),
            coords,
            seen: HashSet::new(),
            classes: HashMap::new(),
        }
    }

    /// Register a way's metadata. Must be called before its segments are
    /// added; segments of unregistered ways are classed `Other`.
    pub fn add_way(&mut self, id: WayId, tags: Tags, member: bool) {
        let class = classify(&tags);
        self.classes.insert(id, class);
        self.graph.ways.push(WayInfo {
            id,
            class,
            tags,
            nodes: Vec::new(),
            member,
        });
    }

    fn node(&mut self, osm: NodeId) -> NodeIdx {
        if let Some(idx) = self.graph.node_index.get(&osm) {
            return *idx;
        }
        let idx = NodeIdx(self.graph.nodes.len() as u32);
        self.graph.nodes.push(GraphNode {
            osm,
            coord: self.coords.get(&osm).copied(),
        });
        self.graph.adjacency.push(Vec::new());
        self.graph.node_index.insert(osm, idx);
        idx
    }

    /// Add an undirected edge. Self-loops and repeats of the same node pair
    /// on the same way are ignored. Returns true if an edge was added.
    pub fn add_segment(&mut self, way: WayId, from: NodeId, to: NodeId) -> bool {
        if from == to {
            return false;
        }
        let a = self.node(from);
        let b = self.node(to);
        let key = (a.min(b), a.max(b), way);
        if !self.seen.insert(key) {
            return false;
        }

        let length_m = match (self.graph.nodes[a.index()].coord, self.graph.nodes[b.index()].coord) {
            (Some(ca), Some(cb)) => Some(haversine_m(ca, cb)),
            _ => None,
        };
        let class = self.classes.get(&way).copied().unwrap_or(WayClass::Other);
        let idx = EdgeIdx(self.graph.edges.len() as u32);
        self.graph.edges.push(GraphEdge {
            a,
            b,
            way,
            class,
            length_m,
        });
        self.graph.adjacency[a.index()].push(idx);
        self.graph.adjacency[b.index()].push(idx);
        true
    }

    /// Finish the graph, filling in per-way node lists from `way_nodes`.
    pub fn finish(mut self, way_nodes: &HashMap<WayId, Vec<NodeId>>) -> WalkableGraph {
        self.graph.ways.sort_by_key(|w| w.id);
        let index = &self.graph.node_index;
        for way in &mut self.graph.ways {
            if let Some(nodes) = way_nodes.get(&way.id) {
                way.nodes = nodes.iter().filter_map(|n| index.get(n).copied()).collect();
            }
        }
        self.graph
    }
}
