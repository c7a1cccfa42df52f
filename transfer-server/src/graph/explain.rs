//! Why is (or isn't) a way part of a station graph?

use std::collections::HashSet;

use serde::Serialize;

use crate::domain::{NodeId, StationId, Walkability, WayClass, WayId, classify, walkability};
use crate::snapshot::{SnapshotStore, StoreError};

use super::config::GraphConfig;
use super::pipeline::try_build_station_graph;

/// Diagnostic report for one way at one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WayExplanation {
    pub station: StationId,
    pub way: WayId,
    /// The way exists in the snapshot.
    pub exists: bool,
    pub node_count: usize,
    pub class: Option<WayClass>,
    pub walkability: Option<Walkability>,
    /// The way is a direct member of the station relation.
    pub member: bool,
    /// Nodes the way shares with member ways.
    pub shared_member_nodes: Vec<NodeId>,
    /// The way ends up in the built graph.
    pub in_graph: bool,
    /// Human-readable findings, in check order.
    pub notes: Vec<String>,
}

/// Explain how the graph builder treats `way` for `station`.
pub fn explain_way(
    store: &dyn SnapshotStore,
    station: StationId,
    way: WayId,
    config: &GraphConfig,
) -> Result<WayExplanation, StoreError> {
    let mut report = WayExplanation {
        station,
        way,
        exists: false,
        node_count: 0,
        class: None,
        walkability: None,
        member: false,
        shared_member_nodes: Vec::new(),
        in_graph: false,
        notes: Vec::new(),
    };

    let Some(record) = store.way(way)? else {
        report.notes.push(format!("way {way} is not in the snapshot"));
        return Ok(report);
    };
    report.exists = true;
    report.node_count = record.nodes.len();
    report.class = Some(classify(&record.tags));
    let walk = walkability(&record.tags);
    report.walkability = Some(walk);

    if store.station(station)?.is_none() {
        report.notes.push(format!("station {station} is not in the snapshot"));
        return Ok(report);
    }

    let members = store.station_members(station)?;
    report.member = members.iter().any(|m| m.id == way);
    let member_nodes: HashSet<NodeId> = members
        .iter()
        .filter(|m| m.id != way)
        .flat_map(|m| m.nodes.iter().copied())
        .collect();
    let mut shared: Vec<NodeId> = record
        .nodes
        .iter()
        .copied()
        .filter(|n| member_nodes.contains(n))
        .collect();
    shared.sort_unstable();
    shared.dedup();
    report.shared_member_nodes = shared;

    if report.member {
        report.notes.push("member of the station relation".to_string());
    } else {
        report.notes.push("not a member of the station relation".to_string());
        match walk {
            Walkability::Walkable => report.notes.push("tags are walkable".to_string()),
            Walkability::Private => report.notes.push("walkable tags but access=private".to_string()),
            Walkability::NotWalkable => report.notes.push(
                "no walkable highway, railway or conveying tag".to_string(),
            ),
        }
        if report.shared_member_nodes.is_empty() {
            report
                .notes
                .push("shares no node with any member way".to_string());
        }
    }
    if record.nodes.len() < 2 {
        report
            .notes
            .push("fewer than two nodes, so no segments".to_string());
    }

    let graph = try_build_station_graph(store, station, config)?;
    report.in_graph = graph.way(way).is_some();
    if !report.in_graph
        && !report.member
        && walk == Walkability::Walkable
        && report.shared_member_nodes.is_empty()
    {
        report.notes.push(format!(
            "not reachable within {} expansion hop(s)",
            config.expansion_hops
        ));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotIndex;
    use crate::snapshot::fixtures::{two_platform_station, way};

    fn index() -> SnapshotIndex {
        let mut data = two_platform_station();
        data.ways.push(way(500, &[3, 40], &[("highway", "footway"), ("access", "private")]));
        data.ways.push(way(501, &[10, 41], &[("highway", "footway")]));
        SnapshotIndex::build(data).unwrap()
    }

    fn explain(id: i64) -> WayExplanation {
        explain_way(&index(), StationId(100), WayId(id), &GraphConfig::default()).unwrap()
    }

    #[test]
    fn member_way() {
        let r = explain(1);
        assert!(r.exists && r.member && r.in_graph);
        assert_eq!(r.class, Some(WayClass::PlatformEdge));
    }

    #[test]
    fn adjoining_walkable_way() {
        let r = explain(300);
        assert!(!r.member && r.in_graph);
        assert_eq!(r.shared_member_nodes, vec![NodeId(3), NodeId(4)]);
        assert_eq!(r.walkability, Some(Walkability::Walkable));
    }

    #[test]
    fn road_is_excluded() {
        let r = explain(400);
        assert!(!r.in_graph);
        assert_eq!(r.walkability, Some(Walkability::NotWalkable));
        assert!(r.notes.iter().any(|n| n.contains("no walkable")));
    }

    #[test]
    fn private_way_is_excluded() {
        let r = explain(500);
        assert!(!r.in_graph);
        assert_eq!(r.walkability, Some(Walkability::Private));
    }

    #[test]
    fn two_hops_away() {
        let r = explain(501);
        assert!(!r.in_graph);
        assert!(r.notes.iter().any(|n| n.contains("expansion hop")));
    }

    #[test]
    fn unknown_way() {
        let r = explain(9999);
        assert!(!r.exists);
        assert_eq!(r.notes.len(), 1);
    }
}
