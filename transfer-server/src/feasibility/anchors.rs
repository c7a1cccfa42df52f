//! Platform anchors: the graph nodes where a platform can be entered.

use std::collections::BTreeSet;

use crate::domain::{WayClass, WayId};
use crate::graph::{NodeIdx, WalkableGraph, WayInfo};

/// Tags that carry platform or track numbers, in lookup order.
const REF_KEYS: &[&str] = &["ref", "local_ref", "railway:track_ref"];

/// Canonical form of a platform label for comparison: trimmed, lowercase,
/// without spaces and without a leading "platform"/"track"/"gleis"/"voie".
pub fn normalize_platform(label: &str) -> String {
    let mut s: String = label
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    for prefix in ["platform", "track", "gleis", "voie", "binario", "quai"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            if !rest.is_empty() {
                s = rest.to_string();
            }
            break;
        }
    }
    s
}

/// Same platform after normalization. Empty labels never match.
pub fn same_platform(a: &str, b: &str) -> bool {
    let a = normalize_platform(a);
    !a.is_empty() && a == normalize_platform(b)
}

/// Platform label without a trailing sector letter (`"7a"` → `"7"`).
fn without_sector(label: &str) -> Option<&str> {
    let trimmed = label.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    (trimmed.len() < label.len() && !trimmed.is_empty()).then_some(trimmed)
}

/// Normalized refs a way declares (`ref=7;8` declares both).
fn way_refs(way: &WayInfo) -> impl Iterator<Item = String> + '_ {
    REF_KEYS
        .iter()
        .filter_map(|k| way.tag(k))
        .flat_map(|v| v.split([';', '/', ',']))
        .map(normalize_platform)
        .filter(|r| !r.is_empty())
}

/// Entry nodes for one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformAnchor {
    pub platform: String,
    /// Sorted and deduplicated.
    pub nodes: Vec<NodeIdx>,
    /// Platform ways the nodes come from.
    pub ways: Vec<WayId>,
}

impl PlatformAnchor {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True if this anchor and `other` share a node.
    pub fn touches(&self, other: &PlatformAnchor) -> bool {
        // both sorted
        let (mut i, mut j) = (0, 0);
        while i < self.nodes.len() && j < other.nodes.len() {
            match self.nodes[i].cmp(&other.nodes[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => return true,
            }
        }
        false
    }
}

/// Find the anchor for `platform` in `graph`.
///
/// Platform-edge ways whose refs match are preferred; platform areas are
/// used only when no edge matches. A label with a sector letter falls back
/// to the bare number. Returns `None` if no platform way matches.
pub fn find_anchor(graph: &WalkableGraph, platform: &str) -> Option<PlatformAnchor> {
    let label = normalize_platform(platform);
    if label.is_empty() {
        return None;
    }
    anchor_for_label(graph, &label)
        .or_else(|| without_sector(&label).and_then(|bare| anchor_for_label(graph, bare)))
        .map(|mut anchor| {
            anchor.platform = label.clone();
            anchor
        })
}

fn anchor_for_label(graph: &WalkableGraph, label: &str) -> Option<PlatformAnchor> {
    let matching = |class: WayClass| -> Vec<&WayInfo> {
        graph
            .ways()
            .iter()
            .filter(|w| w.class == class && way_refs(w).any(|r| r == label))
            .collect()
    };

    let mut ways = matching(WayClass::PlatformEdge);
    if ways.is_empty() {
        ways = matching(WayClass::Platform);
    }

    let nodes: BTreeSet<NodeIdx> = ways.iter().flat_map(|w| w.nodes.iter().copied()).collect();
    if nodes.is_empty() {
        return None;
    }
    Some(PlatformAnchor {
        platform: label.to_string(),
        nodes: nodes.into_iter().collect(),
        ways: ways.iter().map(|w| w.id).collect(),
    })
}

/// Whether two platforms directly adjoin: they share a node, or a single
/// platform-class way contains nodes of both (the two faces of an island
/// platform).
pub fn adjoining(graph: &WalkableGraph, a: &PlatformAnchor, b: &PlatformAnchor) -> bool {
    if a.touches(b) {
        return true;
    }
    graph
        .ways()
        .iter()
        .filter(|w| w.class.is_platform())
        .any(|w| {
            w.nodes.iter().any(|n| a.nodes.binary_search(n).is_ok())
                && w.nodes.iter().any(|n| b.nodes.binary_search(n).is_ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphConfig, build_station_graph};
    use crate::snapshot::SnapshotIndex;
    use crate::snapshot::fixtures::{station, two_platform_station, way};
    use crate::domain::StationId;

    fn graph() -> WalkableGraph {
        let idx = SnapshotIndex::build(two_platform_station()).unwrap();
        build_station_graph(&idx, StationId(100), &GraphConfig::default())
    }

    #[test]
    fn normalization() {
        assert_eq!(normalize_platform(" Gleis 7 "), "7");
        assert_eq!(normalize_platform("Voie 12A"), "12a");
        assert_eq!(normalize_platform("Platform"), "platform");
        assert!(same_platform("7", "gleis 7"));
        assert!(!same_platform("7", "8"));
        assert!(!same_platform(" ", " "));
    }

    #[test]
    fn finds_edge_anchor() {
        let g = graph();
        let a = find_anchor(&g, "1").unwrap();
        assert_eq!(a.ways, vec![WayId(1)]);
        assert_eq!(a.nodes.len(), 3);
        assert!(find_anchor(&g, "9").is_none());
        assert!(find_anchor(&g, "").is_none());
    }

    #[test]
    fn sector_falls_back_to_number() {
        let g = graph();
        let a = find_anchor(&g, "2b").unwrap();
        assert_eq!(a.ways, vec![WayId(2)]);
        assert_eq!(a.platform, "2b");
    }

    #[test]
    fn separate_platforms_do_not_adjoin() {
        let g = graph();
        let a = find_anchor(&g, "1").unwrap();
        let b = find_anchor(&g, "2").unwrap();
        assert!(!a.touches(&b));
        assert!(!adjoining(&g, &a, &b));
    }

    #[test]
    fn island_platform_adjoins() {
        // edges 1 (ref 7) and 2 (ref 8) both lie on platform area 3
        let mut data = two_platform_station();
        data.stations.push(station(200, "Island", &[11, 12, 13]));
        data.ways.push(way(11, &[50, 51], &[("railway", "platform_edge"), ("ref", "7")]));
        data.ways.push(way(12, &[52, 53], &[("railway", "platform_edge"), ("ref", "8")]));
        data.ways.push(way(13, &[50, 51, 53, 52, 50], &[("railway", "platform"), ("ref", "7;8")]));
        let idx = SnapshotIndex::build(data).unwrap();
        let g = build_station_graph(&idx, StationId(200), &GraphConfig::default());

        let a = find_anchor(&g, "7").unwrap();
        let b = find_anchor(&g, "8").unwrap();
        assert_eq!(a.ways, vec![WayId(11)]);
        assert!(!a.touches(&b));
        assert!(adjoining(&g, &a, &b));
    }

    #[test]
    fn platform_area_used_without_edges() {
        let mut data = two_platform_station();
        data.stations.push(station(200, "Simple", &[13]));
        data.ways.push(way(13, &[50, 51, 52], &[("public_transport", "platform"), ("ref", "3;4")]));
        let idx = SnapshotIndex::build(data).unwrap();
        let g = build_station_graph(&idx, StationId(200), &GraphConfig::default());
        let a = find_anchor(&g, "4").unwrap();
        assert_eq!(a.ways, vec![WayId(13)]);
    }
}
