//! Journey assembly with transfer checks.
//!
//! Candidate itineraries come from a schedule source; this module applies
//! real-time data, checks every change against the station's walkable graph
//! and ranks what survives.

mod assemble;
mod config;
mod rank;

pub use assemble::{
    AssembleError, AssembleResult, AssessedJourney, JourneyAssembler, JourneyRequest,
    TransferAnnotation,
};
pub use config::AssemblerConfig;
pub use rank::{compare_journeys, deduplicate, rank_journeys};
