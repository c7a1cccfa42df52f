//! Web layer for the transfer-aware journey planner.
//!
//! Provides JSON endpoints for station autocomplete, journey search and
//! transfer diagnostics.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
