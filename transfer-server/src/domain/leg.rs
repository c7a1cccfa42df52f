//! Journey leg type.
//!
//! A `Leg` is one segment of a journey: a ride on a train (or other public
//! transport) or a walk. It carries both the scheduled and the actual
//! (delay-adjusted) times and platforms, and the stops the train calls at
//! on the way.

use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;

use super::{Coord, DomainError, delay_seconds};

/// How a leg is travelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegMode {
    /// A scheduled public transport ride.
    Train,
    /// Walking (or another self-propelled mode).
    Walk,
}

/// A stop or place at one end of a leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stop {
    /// Stop identifier in the schedule source, if any.
    pub id: Option<String>,
    /// Display name.
    pub name: String,
    /// Position, if known.
    pub coord: Option<Coord>,
}

impl Stop {
    /// Create a stop with a name only.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            coord: None,
        }
    }
}

/// Real-time update for one trip.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelayUpdate {
    /// Delay in seconds. Applies to departure, and to arrival unless
    /// `arrival_delay_secs` is set.
    pub delay_secs: i64,
    /// Separate arrival delay, when the feed reports one.
    pub arrival_delay_secs: Option<i64>,
    /// Replacement departure platform.
    pub platform_override: Option<String>,
    /// Replacement arrival platform.
    pub arrival_platform_override: Option<String>,
}

/// A stop a train calls at between a leg's origin and destination.
///
/// Times and platforms are as the schedule source reported them. The first
/// stop of a line has no arrival and the last no departure.
#[derive(Debug, Clone, PartialEq)]
pub struct Stopover {
    pub station: Stop,
    pub planned_arrival: Option<DateTime<FixedOffset>>,
    pub arrival: Option<DateTime<FixedOffset>>,
    pub planned_departure: Option<DateTime<FixedOffset>>,
    pub departure: Option<DateTime<FixedOffset>>,
    pub planned_platform: Option<String>,
    pub platform: Option<String>,
    pub cancelled: bool,
}

impl Stopover {
    pub fn arrival_delay_secs(&self) -> Option<i64> {
        delay_seconds(self.arrival, self.planned_arrival)
    }

    pub fn departure_delay_secs(&self) -> Option<i64> {
        delay_seconds(self.departure, self.planned_departure)
    }
}

/// A leg of a journey.
///
/// # Invariants
///
/// - `scheduled_arrival >= scheduled_departure`
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub mode: LegMode,
    /// Raw transport mode reported by the source (e.g. `regional_rail`).
    pub service_mode: Option<String>,
    /// Trip identifier used for real-time lookups.
    pub trip_id: Option<String>,
    /// Display name of the train, e.g. `ICE 123`.
    pub train_name: Option<String>,
    pub origin: Stop,
    pub destination: Stop,
    pub scheduled_departure: DateTime<FixedOffset>,
    pub scheduled_arrival: DateTime<FixedOffset>,
    pub actual_departure: DateTime<FixedOffset>,
    pub actual_arrival: DateTime<FixedOffset>,
    pub planned_departure_platform: Option<String>,
    pub departure_platform: Option<String>,
    pub planned_arrival_platform: Option<String>,
    pub arrival_platform: Option<String>,
    pub cancelled: bool,
    /// Walking distance, for walk legs.
    pub distance_m: Option<f64>,
    /// Intermediate stops in travel order, excluding origin and destination.
    pub stopovers: Vec<Stopover>,
}

impl Leg {
    /// Construct a leg with scheduled times; actual times start equal to them.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the scheduled arrival precedes the scheduled departure.
    pub fn new(
        mode: LegMode,
        origin: Stop,
        destination: Stop,
        scheduled_departure: DateTime<FixedOffset>,
        scheduled_arrival: DateTime<FixedOffset>,
    ) -> Result<Self, DomainError> {
        if scheduled_arrival < scheduled_departure {
            return Err(DomainError::InvalidLeg(
                "arrival must not precede departure",
            ));
        }

        Ok(Leg {
            mode,
            service_mode: None,
            trip_id: None,
            train_name: None,
            origin,
            destination,
            scheduled_departure,
            scheduled_arrival,
            actual_departure: scheduled_departure,
            actual_arrival: scheduled_arrival,
            planned_departure_platform: None,
            departure_platform: None,
            planned_arrival_platform: None,
            arrival_platform: None,
            cancelled: false,
            distance_m: None,
            stopovers: Vec::new(),
        })
    }

    /// Set the trip id and display name.
    pub fn with_trip(mut self, trip_id: impl Into<String>, name: Option<String>) -> Self {
        self.trip_id = Some(trip_id.into());
        self.train_name = name;
        self
    }

    /// Set planned platforms; actual platforms start equal to them.
    pub fn with_platforms(mut self, departure: Option<String>, arrival: Option<String>) -> Self {
        self.planned_departure_platform = departure.clone();
        self.departure_platform = departure;
        self.planned_arrival_platform = arrival.clone();
        self.arrival_platform = arrival;
        self
    }

    pub fn with_stopovers(mut self, stopovers: Vec<Stopover>) -> Self {
        self.stopovers = stopovers;
        self
    }

    /// Returns true for train legs.
    pub fn is_train(&self) -> bool {
        self.mode == LegMode::Train
    }

    /// Returns true for walking legs.
    pub fn is_walk(&self) -> bool {
        self.mode == LegMode::Walk
    }

    /// Actual duration of the leg.
    pub fn duration(&self) -> Duration {
        self.actual_arrival
            .signed_duration_since(self.actual_departure)
    }

    /// Departure delay in seconds, `None` when on time.
    pub fn departure_delay_secs(&self) -> Option<i64> {
        delay_seconds(Some(self.actual_departure), Some(self.scheduled_departure))
    }

    /// Arrival delay in seconds, `None` when on time.
    pub fn arrival_delay_secs(&self) -> Option<i64> {
        delay_seconds(Some(self.actual_arrival), Some(self.scheduled_arrival))
    }

    /// Recompute actual times and platforms from a real-time update.
    ///
    /// Times are always derived from the scheduled values, so applying the
    /// same update twice gives the same result.
    pub fn apply_delay(&mut self, update: &DelayUpdate) {
        let dep = Duration::seconds(update.delay_secs);
        let arr = Duration::seconds(update.arrival_delay_secs.unwrap_or(update.delay_secs));
        self.actual_departure = self.scheduled_departure + dep;
        self.actual_arrival = self.scheduled_arrival + arr;
        if self.actual_arrival < self.actual_departure {
            self.actual_arrival = self.actual_departure;
        }
        if let Some(p) = &update.platform_override {
            self.departure_platform = Some(p.clone());
        }
        if let Some(p) = &update.arrival_platform_override {
            self.arrival_platform = Some(p.clone());
        }
    }

    /// Discard real-time data and fall back to the schedule.
    pub fn reset_to_schedule(&mut self) {
        self.actual_departure = self.scheduled_departure;
        self.actual_arrival = self.scheduled_arrival;
        self.departure_platform = self.planned_departure_platform.clone();
        self.arrival_platform = self.planned_arrival_platform.clone();
    }

    /// Shorten or lengthen the leg so it takes `duration`, keeping departure.
    pub fn set_actual_duration(&mut self, duration: Duration) {
        self.actual_arrival = self.actual_departure + duration.max(Duration::zero());
    }
}
