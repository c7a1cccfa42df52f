//! Domain types for the transfer-feasibility engine.
//!
//! This module contains the core domain model: OSM identifiers, coordinates,
//! the closed classification of way tags, and the journey/leg types produced
//! by the assembler. Types enforce their invariants at construction time, so
//! code that receives them can trust their validity.

mod coord;
mod error;
mod ids;
mod journey;
mod leg;
mod tags;
mod time;

pub use coord::{Coord, haversine_m};
pub use error::DomainError;
pub use ids::{InvalidId, NodeId, StationId, WayId};
pub use journey::{Journey, TransferPoint};
pub use leg::{DelayUpdate, Leg, LegMode, Stop, Stopover};
pub use tags::{Tags, WayClass, Walkability, classify, walkability};
pub use time::{TimeError, delay_seconds, parse_iso};
