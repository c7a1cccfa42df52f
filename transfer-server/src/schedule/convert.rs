//! Conversion from MOTIS DTOs to domain types.

use chrono::{DateTime, FixedOffset};
use tracing::warn;

use crate::domain::{
    Coord, DelayUpdate, DomainError, Journey, Leg, LegMode, Stop, Stopover, TimeError, parse_iso,
};

use super::types::{ItineraryDto, LegDto, PlaceDto, PlanResponse};

/// MOTIS modes that are self-propelled rather than scheduled.
pub const WALK_MODES: &[&str] = &[
    "WALK",
    "BIKE",
    "CAR",
    "BIKE_SHARING",
    "CAR_SHARING",
    "SCOOTER_SHARING",
];

/// Error when converting a DTO to domain types.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("itinerary has no legs")]
    NoLegs,

    #[error("leg {index}: missing {field}")]
    MissingField { index: usize, field: &'static str },

    #[error("leg {index}: {source}")]
    Time {
        index: usize,
        #[source]
        source: TimeError,
    },

    #[error("leg {index}: {source}")]
    Leg {
        index: usize,
        #[source]
        source: DomainError,
    },
}

/// Journeys plus the real-time observations found in a plan response.
#[derive(Debug, Clone, Default)]
pub struct ConvertedPlan {
    pub journeys: Vec<Journey>,
    /// Per trip id, the delay and track changes the response reported.
    pub realtime: Vec<(String, DelayUpdate)>,
    /// Itineraries dropped because they could not be converted.
    pub skipped: usize,
}

/// Convert a whole plan response. Itineraries that fail to convert are
/// skipped and logged.
pub fn convert_plan(response: &PlanResponse) -> ConvertedPlan {
    let mut plan = ConvertedPlan::default();
    for (i, itinerary) in response.itineraries.iter().enumerate() {
        match convert_itinerary(itinerary) {
            Ok((journey, realtime)) => {
                plan.journeys.push(journey);
                plan.realtime.extend(realtime);
            }
            Err(e) => {
                warn!(itinerary = i, error = %e, "skipping itinerary");
                plan.skipped += 1;
            }
        }
    }
    plan
}

/// Convert one itinerary.
///
/// Train legs carry scheduled times and planned tracks; the real-time
/// values are returned separately keyed by trip id. Walking legs take
/// their real-time values directly since no feed reports on them.
pub fn convert_itinerary(
    dto: &ItineraryDto,
) -> Result<(Journey, Vec<(String, DelayUpdate)>), ConversionError> {
    if dto.legs.is_empty() {
        return Err(ConversionError::NoLegs);
    }

    let mut legs = Vec::with_capacity(dto.legs.len());
    let mut realtime = Vec::new();
    for (index, leg) in dto.legs.iter().enumerate() {
        let (leg, update) = convert_leg(index, leg)?;
        if let (Some(trip), Some(update)) = (leg.trip_id.clone(), update) {
            realtime.push((trip, update));
        }
        legs.push(leg);
    }

    let first_start = dto.legs[0]
        .start_time
        .as_deref()
        .or(dto.start_time.as_deref())
        .unwrap_or_default();
    let id = format!("{first_start}_{}", dto.transfers);
    let journey = Journey::new(id, legs).map_err(|source| ConversionError::Leg { index: 0, source })?;
    Ok((journey, realtime))
}

fn time(index: usize, raw: Option<&str>, field: &'static str) -> Result<DateTime<FixedOffset>, ConversionError> {
    let raw = raw.ok_or(ConversionError::MissingField { index, field })?;
    parse_iso(raw).map_err(|source| ConversionError::Time { index, source })
}

fn optional_time(
    index: usize,
    raw: Option<&str>,
    field: &'static str,
) -> Result<Option<DateTime<FixedOffset>>, ConversionError> {
    raw.map(|raw| time(index, Some(raw), field)).transpose()
}

fn convert_stopover(index: usize, place: &PlaceDto) -> Result<Stopover, ConversionError> {
    let arrival = optional_time(index, place.arrival.as_deref(), "intermediateStops.arrival")?;
    let departure = optional_time(index, place.departure.as_deref(), "intermediateStops.departure")?;
    Ok(Stopover {
        station: convert_place(Some(place)),
        // Without a planned time the stop is taken to be on time.
        planned_arrival: optional_time(
            index,
            place.scheduled_arrival.as_deref(),
            "intermediateStops.scheduledArrival",
        )?
        .or(arrival),
        arrival,
        planned_departure: optional_time(
            index,
            place.scheduled_departure.as_deref(),
            "intermediateStops.scheduledDeparture",
        )?
        .or(departure),
        departure,
        planned_platform: place.scheduled_track.clone().or_else(|| place.track.clone()),
        platform: place.track.clone().or_else(|| place.scheduled_track.clone()),
        cancelled: place.cancelled,
    })
}

fn convert_place(place: Option<&PlaceDto>) -> Stop {
    let Some(place) = place else {
        return Stop::named("");
    };
    let coord = match (place.lat, place.lon) {
        (Some(lat), Some(lon)) => Some(Coord::new(lat, lon)).filter(Coord::is_valid),
        _ => None,
    };
    Stop {
        id: place.stop_id.clone(),
        name: place.name.clone().unwrap_or_default(),
        coord,
    }
}

/// The actual track if it differs from the planned one.
fn changed_track(place: Option<&PlaceDto>) -> Option<String> {
    let place = place?;
    match (&place.track, &place.scheduled_track) {
        (Some(actual), Some(planned)) if actual != planned => Some(actual.clone()),
        (Some(actual), None) => Some(actual.clone()),
        _ => None,
    }
}

fn convert_leg(index: usize, dto: &LegDto) -> Result<(Leg, Option<DelayUpdate>), ConversionError> {
    let start = time(index, dto.start_time.as_deref(), "startTime")?;
    let end = time(index, dto.end_time.as_deref(), "endTime")?;
    let sched_start = match dto.scheduled_start_time.as_deref() {
        Some(raw) => time(index, Some(raw), "scheduledStartTime")?,
        None => start,
    };
    let sched_end = match dto.scheduled_end_time.as_deref() {
        Some(raw) => time(index, Some(raw), "scheduledEndTime")?,
        None => end,
    };

    let walking = WALK_MODES.contains(&dto.mode.as_str());
    let mode = if walking { LegMode::Walk } else { LegMode::Train };
    let from = dto.from.as_ref();
    let to = dto.to.as_ref();

    let mut leg = Leg::new(mode, convert_place(from), convert_place(to), sched_start, sched_end)
        .map_err(|source| ConversionError::Leg { index, source })?
        .with_platforms(
            from.and_then(|p| p.scheduled_track.clone().or_else(|| p.track.clone())),
            to.and_then(|p| p.scheduled_track.clone().or_else(|| p.track.clone())),
        );
    leg.service_mode = Some(dto.mode.to_lowercase()).filter(|m| !m.is_empty());
    leg.cancelled = dto.cancelled;
    leg.stopovers = dto
        .intermediate_stops
        .iter()
        .map(|place| convert_stopover(index, place))
        .collect::<Result<_, _>>()?;

    let update = DelayUpdate {
        delay_secs: start.signed_duration_since(sched_start).num_seconds(),
        arrival_delay_secs: Some(end.signed_duration_since(sched_end).num_seconds()),
        platform_override: changed_track(from),
        arrival_platform_override: changed_track(to),
    };

    if walking {
        leg.distance_m = dto.distance;
        leg.apply_delay(&update);
        return Ok((leg, None));
    }

    if let Some(trip) = &dto.trip_id {
        let name = dto.display_name.clone().or_else(|| dto.route_short_name.clone());
        leg = leg.with_trip(trip.clone(), name);
    } else {
        leg.train_name = dto.display_name.clone().or_else(|| dto.route_short_name.clone());
    }
    Ok((leg, dto.trip_id.as_ref().map(|_| update)))
}
