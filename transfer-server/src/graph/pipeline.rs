//! Staged station graph build.
//!
//! ```text
//! MemberStage -> ExpandedStage -> SegmentStage -> WalkableGraph
//! ```
//!
//! Each stage is a function of the previous stage and the snapshot. Ways
//! are kept sorted by id throughout so the assembled graph does not depend on
//! store iteration order.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use crate::domain::{NodeId, StationId, WayId};
use crate::snapshot::{SnapshotStore, StoreError, Way, WaySegment};

use super::config::GraphConfig;
use super::walkable::{GraphBuilder, WalkableGraph};

/// Direct member ways of a station relation.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberStage {
    pub station: StationId,
    pub ways: Vec<Way>,
}

/// Member ways plus adjoining walkable ways.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedStage {
    pub station: StationId,
    pub members: HashSet<WayId>,
    /// Sorted by id.
    pub ways: Vec<Way>,
}

/// Expanded ways split into consecutive node pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentStage {
    pub station: StationId,
    pub members: HashSet<WayId>,
    /// Sorted by id.
    pub ways: Vec<Way>,
    /// Sorted by `(way, from, to)`.
    pub segments: Vec<WaySegment>,
}

/// Stage 1: direct member ways.
pub fn member_stage(
    store: &dyn SnapshotStore,
    station: StationId,
) -> Result<MemberStage, StoreError> {
    let ways = store.station_members(station)?;
    Ok(MemberStage { station, ways })
}

/// Stage 2: add `hops` rounds of adjoining walkable ways.
///
/// Each round seeds from the nodes of the ways added in the previous round.
pub fn expanded_stage(
    store: &dyn SnapshotStore,
    stage: MemberStage,
    hops: u8,
) -> Result<ExpandedStage, StoreError> {
    let members: HashSet<WayId> = stage.ways.iter().map(|w| w.id).collect();
    let mut included: BTreeMap<WayId, Way> = stage.ways.into_iter().map(|w| (w.id, w)).collect();
    let mut frontier: HashSet<NodeId> = included
        .values()
        .flat_map(|w| w.nodes.iter().copied())
        .collect();

    for hop in 0..hops {
        if frontier.is_empty() {
            break;
        }
        let exclude: HashSet<WayId> = included.keys().copied().collect();
        let added = store.adjoining_walkable_ways(&frontier, &exclude)?;
        debug!(station = %stage.station, hop, added = added.len(), "expanded");

        frontier = added.iter().flat_map(|w| w.nodes.iter().copied()).collect();
        for way in added {
            included.insert(way.id, way);
        }
    }

    Ok(ExpandedStage {
        station: stage.station,
        members,
        ways: included.into_values().collect(),
    })
}

/// Stage 3: consecutive node pairs of every included way.
///
/// With a single expansion hop the store's precomputed segments describe
/// the same set and are used when available.
pub fn segment_stage(
    store: &dyn SnapshotStore,
    stage: ExpandedStage,
    hops: u8,
) -> Result<SegmentStage, StoreError> {
    let precomputed = if hops == 1 {
        store.precomputed_segments(stage.station)?
    } else {
        None
    };

    let mut segments = match precomputed {
        Some(segments) => {
            debug!(station = %stage.station, count = segments.len(), "using precomputed segments");
            segments
        }
        None => stage.ways.iter().flat_map(way_segments).collect(),
    };
    segments.sort_unstable();
    segments.dedup();

    Ok(SegmentStage {
        station: stage.station,
        members: stage.members,
        ways: stage.ways,
        segments,
    })
}

/// Consecutive node pairs of one way. Ways with fewer than two nodes have
/// none.
pub fn way_segments(way: &Way) -> impl Iterator<Item = WaySegment> + '_ {
    way.nodes.windows(2).map(move |pair| WaySegment {
        way: way.id,
        from: pair[0],
        to: pair[1],
    })
}

/// Stage 4: assemble the arena graph with node coordinates.
pub fn assemble(
    store: &dyn SnapshotStore,
    stage: SegmentStage,
) -> Result<WalkableGraph, StoreError> {
    let mut ways: BTreeMap<WayId, Way> = stage.ways.into_iter().map(|w| (w.id, w)).collect();

    // Precomputed segments may mention ways the expansion didn't return.
    let missing: Vec<WayId> = stage
        .segments
        .iter()
        .map(|s| s.way)
        .filter(|id| !ways.contains_key(id))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    for id in missing {
        match store.way(id)? {
            Some(way) => {
                ways.insert(id, way);
            }
            None => warn!(station = %stage.station, way = %id, "segment refers to unknown way"),
        }
    }

    let mut node_ids: Vec<NodeId> = stage
        .segments
        .iter()
        .flat_map(|s| [s.from, s.to])
        .collect();
    node_ids.sort_unstable();
    node_ids.dedup();
    let coords = store.node_coordinates(&node_ids)?;

    let mut builder = GraphBuilder::new(stage.station, coords);
    let mut way_nodes = HashMap::with_capacity(ways.len());
    for (id, way) in ways {
        builder.add_way(id, way.tags, stage.members.contains(&id));
        way_nodes.insert(id, way.nodes);
    }
    for segment in &stage.segments {
        builder.add_segment(segment.way, segment.from, segment.to);
    }
    Ok(builder.finish(&way_nodes))
}

/// Run all stages for a station.
///
/// # Errors
///
/// Returns `Err` if any store query fails.
pub fn try_build_station_graph(
    store: &dyn SnapshotStore,
    station: StationId,
    config: &GraphConfig,
) -> Result<WalkableGraph, StoreError> {
    let hops = config.expansion_hops;
    let members = member_stage(store, station)?;
    if members.ways.is_empty() {
        debug!(station = %station, "no member ways");
        return Ok(WalkableGraph::empty(station));
    }
    let expanded = expanded_stage(store, members, hops)?;
    let segments = segment_stage(store, expanded, hops)?;
    assemble(store, segments)
}

/// Build a station graph, degrading to an empty graph on store errors.
pub fn build_station_graph(
    store: &dyn SnapshotStore,
    station: StationId,
    config: &GraphConfig,
) -> WalkableGraph {
    match try_build_station_graph(store, station, config) {
        Ok(graph) => {
            debug!(
                station = %station,
                nodes = graph.node_count(),
                edges = graph.edge_count(),
                "built station graph"
            );
            graph
        }
        Err(e) => {
            warn!(station = %station, error = %e, "graph build failed, using empty graph");
            WalkableGraph::empty(station)
        }
    }
}
