//! Immutable, indexed snapshot.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::{Hash, Hasher};

use tracing::warn;

use crate::domain::{Coord, NodeId, StationId, Walkability, WayId, haversine_m, walkability};
use crate::stations::normalize;

use super::error::StoreError;
use super::store::{SnapshotStore, SnapshotVersion};
use super::types::{SnapshotData, StationRelation, Way, WaySegment};

/// A loaded snapshot with lookup indices.
///
/// Built once from [`SnapshotData`] and never mutated; a reload builds a new
/// index and swaps it in.
#[derive(Debug)]
pub struct SnapshotIndex {
    version: SnapshotVersion,
    stations: HashMap<StationId, StationRelation>,
    ways: HashMap<WayId, Way>,
    coords: HashMap<NodeId, Coord>,
    /// Node → ways containing it, sorted by way id.
    node_ways: HashMap<NodeId, Vec<WayId>>,
    segments: HashMap<StationId, Vec<WaySegment>>,
    /// Normalized station name → ids, sorted.
    by_name: HashMap<String, Vec<StationId>>,
}

impl SnapshotIndex {
    /// Index snapshot data, deriving the version from its content unless
    /// the data carries an explicit one.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a station or way id appears twice.
    pub fn build(data: SnapshotData) -> Result<Self, StoreError> {
        let version = match data.version {
            Some(v) => SnapshotVersion(v),
            None => SnapshotVersion(content_hash(&data)?),
        };
        Self::build_with_version(data, version)
    }

    pub(super) fn build_with_version(
        data: SnapshotData,
        version: SnapshotVersion,
    ) -> Result<Self, StoreError> {
        let mut coords = HashMap::with_capacity(data.nodes.len());
        for node in &data.nodes {
            let coord = Coord::new(node.lat, node.lon);
            if coord.is_valid() {
                coords.insert(node.id, coord);
            } else {
                warn!(node = %node.id, "dropping node with invalid coordinates");
            }
        }

        let mut ways = HashMap::with_capacity(data.ways.len());
        let mut node_ways: HashMap<NodeId, Vec<WayId>> = HashMap::new();
        for way in data.ways {
            let distinct: BTreeSet<NodeId> = way.nodes.iter().copied().collect();
            for node in distinct {
                node_ways.entry(node).or_default().push(way.id);
            }
            if let Some(prev) = ways.insert(way.id, way) {
                return Err(StoreError::Invalid(format!("way {} listed twice", prev.id)));
            }
        }
        for list in node_ways.values_mut() {
            list.sort_unstable();
        }

        let mut stations = HashMap::with_capacity(data.stations.len());
        let mut by_name: HashMap<String, Vec<StationId>> = HashMap::new();
        for mut station in data.stations {
            if station.centroid.is_none() {
                station.centroid = member_centroid(&station, &ways, &coords);
            }
            by_name
                .entry(normalize(&station.name))
                .or_default()
                .push(station.id);
            if let Some(prev) = stations.insert(station.id, station) {
                return Err(StoreError::Invalid(format!(
                    "station {} listed twice",
                    prev.id
                )));
            }
        }
        for ids in by_name.values_mut() {
            ids.sort_unstable();
        }

        let segments = data
            .segments
            .into_iter()
            .map(|p| (p.station, p.segments))
            .collect();

        Ok(Self {
            version,
            stations,
            ways,
            coords,
            node_ways,
            segments,
            by_name,
        })
    }

    /// Number of stations in the snapshot.
    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    /// Ways containing `node`, sorted by id.
    pub fn ways_at(&self, node: NodeId) -> &[WayId] {
        self.node_ways.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn content_hash(data: &SnapshotData) -> Result<u64, StoreError> {
    let bytes = serde_json::to_vec(data)?;
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    Ok(hasher.finish())
}

/// Mean position of all member-way nodes that have coordinates.
fn member_centroid(
    station: &StationRelation,
    ways: &HashMap<WayId, Way>,
    coords: &HashMap<NodeId, Coord>,
) -> Option<Coord> {
    let points: Vec<Coord> = station
        .member_way_ids()
        .filter_map(|id| ways.get(&id))
        .flat_map(|w| w.nodes.iter())
        .filter_map(|n| coords.get(n).copied())
        .collect();
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let lat = points.iter().map(|c| c.lat).sum::<f64>() / n;
    let lon = points.iter().map(|c| c.lon).sum::<f64>() / n;
    Some(Coord::new(lat, lon))
}

impl SnapshotStore for SnapshotIndex {
    fn version(&self) -> SnapshotVersion {
        self.version
    }

    fn station(&self, id: StationId) -> Result<Option<StationRelation>, StoreError> {
        Ok(self.stations.get(&id).cloned())
    }

    fn station_members(&self, id: StationId) -> Result<Vec<Way>, StoreError> {
        let Some(station) = self.stations.get(&id) else {
            return Ok(Vec::new());
        };
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for way_id in station.member_way_ids() {
            if !seen.insert(way_id) {
                continue;
            }
            match self.ways.get(&way_id) {
                Some(way) => members.push(way.clone()),
                None => warn!(station = %id, way = %way_id, "member way missing from snapshot"),
            }
        }
        Ok(members)
    }

    fn adjoining_walkable_ways(
        &self,
        nodes: &HashSet<NodeId>,
        exclude: &HashSet<WayId>,
    ) -> Result<Vec<Way>, StoreError> {
        let candidates: BTreeSet<WayId> = nodes
            .iter()
            .flat_map(|n| self.ways_at(*n).iter().copied())
            .filter(|id| !exclude.contains(id))
            .collect();

        Ok(candidates
            .into_iter()
            .filter_map(|id| self.ways.get(&id))
            .filter(|w| walkability(&w.tags) == Walkability::Walkable)
            .cloned()
            .collect())
    }

    fn precomputed_segments(&self, id: StationId) -> Result<Option<Vec<WaySegment>>, StoreError> {
        Ok(self.segments.get(&id).cloned())
    }

    fn node_coordinates(&self, nodes: &[NodeId]) -> Result<HashMap<NodeId, Coord>, StoreError> {
        Ok(nodes
            .iter()
            .filter_map(|n| self.coords.get(n).map(|c| (*n, *c)))
            .collect())
    }

    fn way(&self, id: WayId) -> Result<Option<Way>, StoreError> {
        Ok(self.ways.get(&id).cloned())
    }

    fn find_station(
        &self,
        name: &str,
        near: Option<Coord>,
        radius_m: f64,
    ) -> Result<Option<StationId>, StoreError> {
        let key = normalize(name);
        if let Some(ids) = self.by_name.get(&key) {
            let best = match near {
                // Several stop areas can share a name; take the closest one.
                Some(at) => ids.iter().copied().min_by(|a, b| {
                    let da = self.distance_to(*a, at);
                    let db = self.distance_to(*b, at);
                    da.total_cmp(&db)
                }),
                None => ids.first().copied(),
            };
            if best.is_some() {
                return Ok(best);
            }
        }

        let Some(at) = near else {
            return Ok(None);
        };
        let mut nearest: Option<(f64, StationId)> = None;
        for station in self.stations.values() {
            let Some(c) = station.centroid else { continue };
            let d = haversine_m(c, at);
            if d > radius_m {
                continue;
            }
            let closer = match nearest {
                None => true,
                Some((best, best_id)) => d < best || (d == best && station.id < best_id),
            };
            if closer {
                nearest = Some((d, station.id));
            }
        }
        Ok(nearest.map(|(_, id)| id))
    }
}

impl SnapshotIndex {
    fn distance_to(&self, id: StationId, at: Coord) -> f64 {
        self.stations
            .get(&id)
            .and_then(|s| s.centroid)
            .map(|c| haversine_m(c, at))
            .unwrap_or(f64::INFINITY)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small hand-built snapshots shared by tests across the crate.

    use crate::domain::{NodeId, StationId, Tags, WayId};
    use crate::snapshot::{MemberType, RelationMember, SnapshotData, SnapshotNode, StationRelation, Way};

    pub fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    pub fn way(id: i64, nodes: &[i64], t: &[(&str, &str)]) -> Way {
        Way {
            id: WayId(id),
            nodes: nodes.iter().copied().map(NodeId).collect(),
            tags: tags(t),
        }
    }

    pub fn station(id: i64, name: &str, member_ways: &[i64]) -> StationRelation {
        StationRelation {
            id: StationId(id),
            name: name.to_string(),
            members: member_ways
                .iter()
                .map(|w| RelationMember {
                    member_ref: *w,
                    role: String::new(),
                    member_type: MemberType::Way,
                })
                .collect(),
            centroid: None,
        }
    }

    /// Nodes 1..=n laid out west to east, 0.0001° of longitude
    /// (about 7.4 m at 48°N) apart.
    pub fn line_nodes(ids: impl IntoIterator<Item = i64>) -> Vec<SnapshotNode> {
        ids.into_iter()
            .map(|i| SnapshotNode {
                id: NodeId(i),
                lat: 48.0,
                lon: 7.0 + 0.0001 * i as f64,
            })
            .collect()
    }

    /// A station with two platform edges (refs 1 and 2) joined by a
    /// footbridge made of steps.
    ///
    /// ```text
    /// edge ref=1: 1 - 2 - 3
    ///                     |
    ///               steps 3 - 10 - 4   (way 300, not a member)
    ///                              |
    /// edge ref=2:                  4 - 5 - 6
    /// ```
    pub fn two_platform_station() -> SnapshotData {
        SnapshotData {
            version: Some(1),
            stations: vec![station(100, "Strasbourg", &[1, 2])],
            ways: vec![
                way(1, &[1, 2, 3], &[("railway", "platform_edge"), ("ref", "1")]),
                way(2, &[4, 5, 6], &[("railway", "platform_edge"), ("ref", "2")]),
                way(300, &[3, 10, 4], &[("highway", "steps")]),
                way(400, &[6, 20], &[("highway", "primary")]),
            ],
            nodes: line_nodes([1, 2, 3, 4, 5, 6, 10, 20]),
            segments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::snapshot::SnapshotNode;

    fn index() -> SnapshotIndex {
        SnapshotIndex::build(two_platform_station()).unwrap()
    }

    #[test]
    fn explicit_version_is_kept() {
        assert_eq!(index().version(), SnapshotVersion(1));
    }

    #[test]
    fn content_hash_is_stable() {
        let mut data = two_platform_station();
        data.version = None;
        let a = SnapshotIndex::build(data.clone()).unwrap().version();
        let b = SnapshotIndex::build(data.clone()).unwrap().version();
        assert_eq!(a, b);

        data.ways.pop();
        let c = SnapshotIndex::build(data).unwrap().version();
        assert_ne!(a, c);
    }

    #[test]
    fn duplicate_way_rejected() {
        let mut data = two_platform_station();
        data.ways.push(way(1, &[7, 8], &[]));
        assert!(matches!(
            SnapshotIndex::build(data),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn members_in_relation_order() {
        let members = index().station_members(StationId(100)).unwrap();
        let ids: Vec<_> = members.iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![WayId(1), WayId(2)]);
        assert!(index().station_members(StationId(999)).unwrap().is_empty());
    }

    #[test]
    fn adjoining_excludes_members_and_non_walkable() {
        let idx = index();
        let nodes: HashSet<NodeId> = [1, 2, 3, 4, 5, 6].into_iter().map(NodeId).collect();
        let exclude: HashSet<WayId> = [WayId(1), WayId(2)].into_iter().collect();
        let ways = idx.adjoining_walkable_ways(&nodes, &exclude).unwrap();
        let ids: Vec<_> = ways.iter().map(|w| w.id).collect();
        // way 400 touches node 6 but is a road
        assert_eq!(ids, vec![WayId(300)]);
    }

    #[test]
    fn node_coordinates_skip_unknown() {
        let mut data = two_platform_station();
        data.nodes.push(SnapshotNode {
            id: NodeId(99),
            lat: 200.0,
            lon: 0.0,
        });
        let idx = SnapshotIndex::build(data).unwrap();
        let coords = idx
            .node_coordinates(&[NodeId(1), NodeId(99), NodeId(12345)])
            .unwrap();
        assert_eq!(coords.len(), 1);
        assert!(coords.contains_key(&NodeId(1)));
    }

    #[test]
    fn centroid_derived_from_members() {
        let station = index().station(StationId(100)).unwrap().unwrap();
        let c = station.centroid.unwrap();
        assert!((c.lat - 48.0).abs() < 1e-9);
        assert!(c.lon > 7.0 && c.lon < 7.001);
    }

    #[test]
    fn find_station_by_name_then_position() {
        let idx = index();
        assert_eq!(
            idx.find_station("  STRASBOURG ", None, 0.0).unwrap(),
            Some(StationId(100))
        );

        let near = Coord::new(48.0, 7.0003);
        assert_eq!(
            idx.find_station("Strasbourg Hbf", Some(near), 500.0).unwrap(),
            Some(StationId(100))
        );

        let far = Coord::new(49.0, 7.0);
        assert_eq!(idx.find_station("Strasbourg Hbf", Some(far), 500.0).unwrap(), None);
        assert_eq!(idx.find_station("Nowhere", None, 500.0).unwrap(), None);
    }
}
