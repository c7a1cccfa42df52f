//! Station directory and name normalization.
//!
//! Provides station autocomplete and name → coordinates resolution, loaded
//! from a `;`-delimited stations CSV at startup and reloadable in place.

mod directory;
mod error;
mod normalize;

#[cfg(test)]
pub(crate) use directory::fixtures;
pub use directory::{StationDirectory, StationEntry};
pub use error::StationError;
pub use normalize::normalize;
