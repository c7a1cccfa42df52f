//! Schedule and real-time data.
//!
//! Candidate itineraries come from a MOTIS instance (Transitous by
//! default). MOTIS reports:
//! - times as RFC 3339 strings with an offset
//! - `startTime` as the real-time value, `scheduledStartTime` as planned
//! - `track` as the current platform, `scheduledTrack` as planned
//!
//! Conversion keeps legs on the schedule and hands the real-time values to
//! the [`RealtimeFeed`], so the assembler can fall back to the timetable if
//! the feed is unavailable.

mod client;
mod convert;
mod error;
mod mock;
mod source;
mod types;

pub use client::{TransitousClient, TransitousConfig};
pub use convert::{ConversionError, ConvertedPlan, WALK_MODES, convert_itinerary, convert_plan};
pub use error::ScheduleError;
pub use mock::{StaticRealtimeFeed, StaticSchedule};
pub use source::{ItineraryQuery, Place, RealtimeFeed, ScheduleSource};
pub use types::{ItineraryDto, LegDto, PlaceDto, PlanResponse};
