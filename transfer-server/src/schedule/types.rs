//! MOTIS v5 plan response DTOs.
//!
//! Only the fields the converter reads are declared. Most are optional
//! because the API omits rather than nulls them.

use serde::Deserialize;

/// Response of `GET /api/v5/plan`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    #[serde(default)]
    pub itineraries: Vec<ItineraryDto>,
}

/// One itinerary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryDto {
    /// Total duration in seconds.
    pub duration: Option<i64>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub transfers: usize,
    #[serde(default)]
    pub legs: Vec<LegDto>,
}

/// One leg of an itinerary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegDto {
    /// e.g. `WALK`, `REGIONAL_RAIL`, `HIGHSPEED_RAIL`.
    #[serde(default)]
    pub mode: String,
    pub from: Option<PlaceDto>,
    pub to: Option<PlaceDto>,
    /// Real-time start, or scheduled when no real-time data exists.
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub scheduled_start_time: Option<String>,
    pub scheduled_end_time: Option<String>,
    #[serde(default)]
    pub real_time: bool,
    pub display_name: Option<String>,
    pub route_short_name: Option<String>,
    pub trip_id: Option<String>,
    /// Walking distance in meters.
    pub distance: Option<f64>,
    #[serde(default)]
    pub cancelled: bool,
    /// Stops between `from` and `to`, when requested.
    #[serde(default)]
    pub intermediate_stops: Vec<PlaceDto>,
}

/// A stop or place.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDto {
    pub name: Option<String>,
    pub stop_id: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Current track (platform).
    pub track: Option<String>,
    /// Planned track.
    pub scheduled_track: Option<String>,
    /// Arrival and departure times, set on stops of a transit leg.
    pub arrival: Option<String>,
    pub departure: Option<String>,
    pub scheduled_arrival: Option<String>,
    pub scheduled_departure: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
}
