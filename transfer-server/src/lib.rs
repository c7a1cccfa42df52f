//! Station connectivity and transfer-feasibility server.
//!
//! Answers: "can a passenger make this change in time?" Station layouts
//! come from an OpenStreetMap snapshot; itineraries and delays come from a
//! MOTIS-compatible schedule source. Each change is checked against the
//! walkable network between the two platforms and journeys that cannot be
//! made are dropped.

pub mod config;
pub mod domain;
pub mod feasibility;
pub mod graph;
pub mod pathfind;
pub mod planner;
pub mod pool;
pub mod schedule;
pub mod snapshot;
pub mod stations;
pub mod web;
