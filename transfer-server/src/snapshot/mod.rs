//! Geospatial snapshot store.
//!
//! The store is the read-only source of station relations, ways, node
//! coordinates and precomputed way segments that the graph builder queries.
//! [`SnapshotStore`] is the query interface; [`SnapshotIndex`] is an
//! immutable, indexed snapshot; [`JsonSnapshotStore`] holds the current
//! snapshot loaded from a JSON file and swaps it on reload.

mod error;
mod index;
mod json;
mod store;
mod types;

pub use error::StoreError;
pub use index::SnapshotIndex;
pub use json::JsonSnapshotStore;
pub use store::{SnapshotProvider, SnapshotStore, SnapshotVersion};
pub use types::{
    MemberType, PrecomputedSegments, RelationMember, SnapshotData, SnapshotNode, StationRelation,
    Way, WaySegment,
};

#[cfg(test)]
pub(crate) use index::fixtures;
