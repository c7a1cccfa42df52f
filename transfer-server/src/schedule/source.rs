//! Schedule and real-time interfaces.

use std::future::Future;

use chrono::{DateTime, FixedOffset};

use crate::domain::{Coord, DelayUpdate, Journey};

use super::error::ScheduleError;

/// A resolved end point of a journey query.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub coord: Coord,
}

/// Parameters for an itinerary search.
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryQuery {
    pub origin: Place,
    pub destination: Place,
    pub after: DateTime<FixedOffset>,
    pub max_transfers: usize,
    pub max_results: usize,
}

/// Source of candidate itineraries.
///
/// Legs come back with scheduled times and planned platforms; real-time
/// adjustments are applied separately from a [`RealtimeFeed`].
pub trait ScheduleSource: Send + Sync {
    fn itineraries(
        &self,
        query: &ItineraryQuery,
    ) -> impl Future<Output = Result<Vec<Journey>, ScheduleError>> + Send;
}

/// Current delays and platform changes per trip.
pub trait RealtimeFeed: Send + Sync {
    /// `Ok(None)` means the feed has nothing for the trip, which is treated
    /// as running to schedule.
    fn delay(
        &self,
        trip_id: &str,
    ) -> impl Future<Output = Result<Option<DelayUpdate>, ScheduleError>> + Send;
}
