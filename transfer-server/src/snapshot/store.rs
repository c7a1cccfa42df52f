//! The snapshot query interface.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::domain::{Coord, NodeId, StationId, WayId};

use super::error::StoreError;
use super::types::{StationRelation, Way, WaySegment};

/// Version token of a snapshot. Any change invalidates derived graphs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SnapshotVersion(pub u64);

impl fmt::Debug for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SnapshotVersion({:016x})", self.0)
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Queries the graph builder issues against a geospatial snapshot.
///
/// Implementations must be consistent for a given [`SnapshotVersion`]:
/// the same query returns the same answer until the version changes.
pub trait SnapshotStore: Send + Sync {
    /// Current version token.
    fn version(&self) -> SnapshotVersion;

    /// Look up a stop-area relation.
    fn station(&self, id: StationId) -> Result<Option<StationRelation>, StoreError>;

    /// Ways that are direct members of the relation.
    fn station_members(&self, id: StationId) -> Result<Vec<Way>, StoreError>;

    /// Walkable ways that share at least one node with `nodes`, excluding
    /// the ways in `exclude`. Sorted by way id.
    fn adjoining_walkable_ways(
        &self,
        nodes: &HashSet<NodeId>,
        exclude: &HashSet<WayId>,
    ) -> Result<Vec<Way>, StoreError>;

    /// Member plus one-hop walkable ways of a station, already split into
    /// consecutive node pairs. `None` when the store has not precomputed
    /// them.
    fn precomputed_segments(&self, id: StationId) -> Result<Option<Vec<WaySegment>>, StoreError>;

    /// Coordinates of the given nodes. Nodes without coordinates are absent.
    fn node_coordinates(&self, nodes: &[NodeId]) -> Result<HashMap<NodeId, Coord>, StoreError>;

    /// Look up a single way.
    fn way(&self, id: WayId) -> Result<Option<Way>, StoreError>;

    /// Find the stop area for a stop: by normalized name first, then the
    /// nearest relation centroid within `radius_m` of `near`.
    fn find_station(
        &self,
        name: &str,
        near: Option<Coord>,
        radius_m: f64,
    ) -> Result<Option<StationId>, StoreError>;
}

/// Source of the current snapshot.
///
/// Callers pin one snapshot for the duration of a graph build so every query
/// in the build sees the same version.
pub trait SnapshotProvider: Send + Sync {
    fn current(&self) -> Arc<dyn SnapshotStore>;
}
