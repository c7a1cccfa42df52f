//! Shortest-path search between platform anchors.

mod budget;
mod search;

pub use budget::{CancelFlag, DEFAULT_MAX_EXPLORED, SearchBudget};
pub use search::{
    DistanceMode, EdgeFilter, FoundPath, PathOutcome, UnreachableReason, distance_mode,
    shortest_path,
};
