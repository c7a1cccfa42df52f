//! Data transfer objects for web requests and responses.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::domain::{Journey, Leg, LegMode, Stop, Stopover};
use crate::planner::{AssembleResult, AssessedJourney, TransferAnnotation};
use crate::stations::StationEntry;

/// Query for station autocomplete.
#[derive(Debug, Deserialize)]
pub struct AutocompleteQuery {
    #[serde(default)]
    pub q: String,
}

/// A station suggestion.
#[derive(Debug, Serialize)]
pub struct StationResult {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Query for a journey search.
#[derive(Debug, Deserialize)]
pub struct JourneyQuery {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    /// ISO-8601 departure time; empty means now
    #[serde(default)]
    pub time: String,
}

/// Response for a journey search.
#[derive(Debug, Serialize)]
pub struct JourneysResponse {
    pub origin: StationResult,
    pub destination: StationResult,
    pub departure_time: String,
    /// Some candidates were not assessed before the deadline
    pub partial: bool,
    /// Real-time data was unavailable; times are scheduled
    pub stale: bool,
    /// Found journeys, best first
    pub journeys: Vec<JourneyResult>,
}

/// A journey option.
#[derive(Debug, Serialize)]
pub struct JourneyResult {
    pub id: String,
    /// Departure time from origin
    pub date: String,
    pub duration_s: i64,
    pub num_changes: usize,
    /// At least one change is within the safety buffer
    pub marginal: bool,
    pub legs: Vec<LegResult>,
    pub transfers: Vec<TransferAnnotation>,
}

/// A leg of a journey.
#[derive(Debug, Serialize)]
pub struct LegResult {
    /// `walking`, or the lowercase transport mode
    pub mode: String,
    pub train_name: Option<String>,
    pub origin: PlaceResult,
    pub destination: PlaceResult,
    pub departure: String,
    pub planned_departure: String,
    pub arrival: String,
    pub planned_arrival: String,
    pub departure_delay_s: Option<i64>,
    pub arrival_delay_s: Option<i64>,
    pub departure_platform: Option<String>,
    pub planned_departure_platform: Option<String>,
    pub arrival_platform: Option<String>,
    pub planned_arrival_platform: Option<String>,
    pub cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stopovers: Vec<StopoverResult>,
}

/// A stop the train calls at between the ends of a leg.
#[derive(Debug, Serialize)]
pub struct StopoverResult {
    pub station: PlaceResult,
    pub arrival: Option<String>,
    pub planned_arrival: Option<String>,
    pub departure: Option<String>,
    pub planned_departure: Option<String>,
    pub arrival_delay_s: Option<i64>,
    pub departure_delay_s: Option<i64>,
    pub platform: Option<String>,
    pub planned_platform: Option<String>,
    pub cancelled: bool,
}

/// One end of a leg.
#[derive(Debug, Serialize)]
pub struct PlaceResult {
    pub id: Option<String>,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Query for a single transfer check.
#[derive(Debug, Deserialize)]
pub struct TransferCheckQuery {
    /// Station relation id
    pub station: i64,
    pub arrival_platform: Option<String>,
    pub departure_platform: Option<String>,
    pub window_secs: i64,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Conversion implementations

impl StationResult {
    pub fn from_entry(entry: &StationEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            latitude: entry.latitude,
            longitude: entry.longitude,
            country: Some(entry.country.clone()).filter(|c| !c.is_empty()),
        }
    }
}

impl JourneysResponse {
    pub fn from_result(result: &AssembleResult) -> Self {
        Self {
            origin: StationResult::from_entry(&result.origin),
            destination: StationResult::from_entry(&result.destination),
            departure_time: format_time(&result.departure_time),
            partial: result.partial,
            stale: result.stale,
            journeys: result.journeys.iter().map(JourneyResult::from_assessed).collect(),
        }
    }
}

impl JourneyResult {
    pub fn from_assessed(assessed: &AssessedJourney) -> Self {
        let journey: &Journey = &assessed.journey;
        Self {
            id: journey.id().to_string(),
            date: format_time(&journey.departure_time()),
            duration_s: journey.total_duration().num_seconds(),
            num_changes: journey.change_count(),
            marginal: assessed.is_marginal(),
            legs: journey.legs().iter().map(LegResult::from_leg).collect(),
            transfers: assessed.transfers.clone(),
        }
    }
}

impl LegResult {
    pub fn from_leg(leg: &Leg) -> Self {
        let walking = leg.mode == LegMode::Walk;
        let mode = if walking {
            "walking".to_string()
        } else {
            leg.service_mode.clone().unwrap_or_else(|| "train".to_string())
        };
        Self {
            mode,
            train_name: if walking { None } else { leg.train_name.clone() },
            origin: PlaceResult::from_stop(&leg.origin),
            destination: PlaceResult::from_stop(&leg.destination),
            departure: format_time(&leg.actual_departure),
            planned_departure: format_time(&leg.scheduled_departure),
            arrival: format_time(&leg.actual_arrival),
            planned_arrival: format_time(&leg.scheduled_arrival),
            departure_delay_s: leg.departure_delay_secs(),
            arrival_delay_s: leg.arrival_delay_secs(),
            departure_platform: leg.departure_platform.clone(),
            planned_departure_platform: leg.planned_departure_platform.clone(),
            arrival_platform: leg.arrival_platform.clone(),
            planned_arrival_platform: leg.planned_arrival_platform.clone(),
            cancelled: leg.cancelled,
            distance_m: leg.distance_m.filter(|_| walking).map(|d| d as i64),
            stopovers: leg.stopovers.iter().map(StopoverResult::from_stopover).collect(),
        }
    }
}

impl StopoverResult {
    pub fn from_stopover(stop: &Stopover) -> Self {
        Self {
            station: PlaceResult::from_stop(&stop.station),
            arrival: stop.arrival.as_ref().map(format_time),
            planned_arrival: stop.planned_arrival.as_ref().map(format_time),
            departure: stop.departure.as_ref().map(format_time),
            planned_departure: stop.planned_departure.as_ref().map(format_time),
            arrival_delay_s: stop.arrival_delay_secs(),
            departure_delay_s: stop.departure_delay_secs(),
            platform: stop.platform.clone(),
            planned_platform: stop.planned_platform.clone(),
            cancelled: stop.cancelled,
        }
    }
}

impl PlaceResult {
    pub fn from_stop(stop: &Stop) -> Self {
        Self {
            id: stop.id.clone(),
            name: stop.name.clone(),
            latitude: stop.coord.map(|c| c.lat),
            longitude: stop.coord.map(|c| c.lon),
        }
    }
}

/// Format a time as RFC 3339.
fn format_time(time: &DateTime<FixedOffset>) -> String {
    time.to_rfc3339()
}
