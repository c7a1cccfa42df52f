//! Serialized snapshot records.

use serde::{Deserialize, Serialize};

use crate::domain::{Coord, NodeId, StationId, Tags, WayId};

/// Kind of a relation member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    Node,
    Way,
    Relation,
}

/// One member of a stop-area relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationMember {
    #[serde(rename = "ref")]
    pub member_ref: i64,
    #[serde(default)]
    pub role: String,
    #[serde(rename = "type")]
    pub member_type: MemberType,
}

/// A named stop area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationRelation {
    pub id: StationId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<RelationMember>,
    /// Representative position. Derived from member nodes when absent.
    #[serde(default)]
    pub centroid: Option<Coord>,
}

impl StationRelation {
    /// Ids of member ways, in member order.
    pub fn member_way_ids(&self) -> impl Iterator<Item = WayId> + '_ {
        self.members
            .iter()
            .filter(|m| m.member_type == MemberType::Way)
            .map(|m| WayId(m.member_ref))
    }
}

/// An ordered path of infrastructure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Way {
    pub id: WayId,
    pub nodes: Vec<NodeId>,
    #[serde(default)]
    pub tags: Tags,
}

impl Way {
    /// Value of a tag, if present.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }
}

/// A node with coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapshotNode {
    pub id: NodeId,
    pub lat: f64,
    pub lon: f64,
}

/// A consecutive node pair of a way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WaySegment {
    pub way: WayId,
    pub from: NodeId,
    pub to: NodeId,
}

/// Segments expanded server-side for one station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrecomputedSegments {
    pub station: StationId,
    pub segments: Vec<WaySegment>,
}

/// The whole snapshot as stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotData {
    /// Explicit version token. When absent, a content hash is used.
    #[serde(default)]
    pub version: Option<u64>,
    #[serde(default)]
    pub stations: Vec<StationRelation>,
    #[serde(default)]
    pub ways: Vec<Way>,
    #[serde(default)]
    pub nodes: Vec<SnapshotNode>,
    #[serde(default)]
    pub segments: Vec<PrecomputedSegments>,
}
