//! Station walking graphs.
//!
//! A station's graph is built from its relation's member ways plus adjoining
//! walkable ways (see [`pipeline`]), stored as an index arena
//! ([`WalkableGraph`]) and shared through a versioned cache
//! ([`GraphCache`]).

mod cache;
mod config;
mod explain;
pub mod pipeline;
mod walkable;

pub use cache::{GraphCache, GraphCacheConfig};
pub use config::{DEFAULT_EXPANSION_HOPS, GraphConfig};
pub use explain::{WayExplanation, explain_way};
pub use pipeline::{build_station_graph, try_build_station_graph};
pub use walkable::{
    EdgeIdx, GraphBuilder, GraphEdge, GraphNode, GraphSummary, NodeIdx, WalkableGraph, WayInfo,
};
