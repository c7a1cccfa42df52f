//! In-memory schedule and real-time sources.
//!
//! Serve fixed data as if it came from a live API. Used for tests and for
//! running the server against a recorded plan response.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::RwLock;

use crate::domain::{DelayUpdate, Journey};

use super::convert::convert_plan;
use super::error::ScheduleError;
use super::source::{ItineraryQuery, RealtimeFeed, ScheduleSource};
use super::types::PlanResponse;

/// Schedule source returning the same journeys for every query.
#[derive(Clone, Default)]
pub struct StaticSchedule {
    journeys: Arc<RwLock<Vec<Journey>>>,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    latency_ms: Arc<AtomicU64>,
}

impl StaticSchedule {
    pub fn new(journeys: Vec<Journey>) -> Self {
        Self {
            journeys: Arc::new(RwLock::new(journeys)),
            ..Self::default()
        }
    }

    /// Load a recorded `/api/v5/plan` response.
    ///
    /// The real-time observations in the file are returned alongside, for
    /// seeding a [`StaticRealtimeFeed`].
    pub fn from_plan_file(
        path: impl AsRef<Path>,
    ) -> Result<(Self, StaticRealtimeFeed), ScheduleError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ScheduleError::Unavailable(format!("failed to read {}: {e}", path.display()))
        })?;
        let response: PlanResponse = serde_json::from_str(&json).map_err(|e| ScheduleError::Json {
            message: e.to_string(),
            body: None,
        })?;
        let plan = convert_plan(&response);
        Ok((
            Self::new(plan.journeys),
            StaticRealtimeFeed::new(plan.realtime.into_iter().collect()),
        ))
    }

    /// Make every subsequent query fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every answer, as a slow upstream would.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    pub async fn set_journeys(&self, journeys: Vec<Journey>) {
        *self.journeys.write().await = journeys;
    }

    /// Number of queries answered so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ScheduleSource for StaticSchedule {
    async fn itineraries(&self, _query: &ItineraryQuery) -> Result<Vec<Journey>, ScheduleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(ScheduleError::Unavailable("static schedule set to fail".into()));
        }
        Ok(self.journeys.read().await.clone())
    }
}

/// Real-time feed backed by a fixed map of trip id to update.
#[derive(Clone, Default)]
pub struct StaticRealtimeFeed {
    updates: Arc<RwLock<HashMap<String, DelayUpdate>>>,
    failing: Arc<AtomicBool>,
}

impl StaticRealtimeFeed {
    pub fn new(updates: HashMap<String, DelayUpdate>) -> Self {
        Self {
            updates: Arc::new(RwLock::new(updates)),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A feed that fails every lookup.
    pub fn failing() -> Self {
        let feed = Self::default();
        feed.failing.store(true, Ordering::SeqCst);
        feed
    }

    pub async fn insert(&self, trip_id: impl Into<String>, update: DelayUpdate) {
        self.updates.write().await.insert(trip_id.into(), update);
    }
}

impl RealtimeFeed for StaticRealtimeFeed {
    async fn delay(&self, trip_id: &str) -> Result<Option<DelayUpdate>, ScheduleError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ScheduleError::Unavailable("static feed set to fail".into()));
        }
        Ok(self.updates.read().await.get(trip_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coord, parse_iso};
    use crate::schedule::Place;

    fn query() -> ItineraryQuery {
        let place = Place {
            name: "X".into(),
            coord: Coord::new(48.0, 7.0),
        };
        ItineraryQuery {
            origin: place.clone(),
            destination: place,
            after: parse_iso("2024-03-15T09:00:00Z").unwrap(),
            max_transfers: 2,
            max_results: 3,
        }
    }

    #[tokio::test]
    async fn static_schedule_fails_on_demand() {
        let schedule = StaticSchedule::new(vec![]);
        assert!(schedule.itineraries(&query()).await.unwrap().is_empty());
        schedule.set_failing(true);
        assert!(schedule.itineraries(&query()).await.is_err());
        assert_eq!(schedule.calls(), 2);
    }

    #[tokio::test]
    async fn static_schedule_latency() {
        let schedule = StaticSchedule::new(vec![]);
        schedule.set_latency(Duration::from_millis(30));
        let started = std::time::Instant::now();
        schedule.itineraries(&query()).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[tokio::test]
    async fn plan_file_loads_journeys_and_realtime() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"{"itineraries": [{"transfers": 0, "legs": [{
                "mode": "REGIONAL_RAIL", "tripId": "t1",
                "startTime": "2024-03-15T09:05:00Z", "endTime": "2024-03-15T09:30:00Z",
                "scheduledStartTime": "2024-03-15T09:00:00Z",
                "scheduledEndTime": "2024-03-15T09:30:00Z"
            }]}]}"#,
        )
        .unwrap();

        let (schedule, feed) = StaticSchedule::from_plan_file(file.path()).unwrap();
        let journeys = schedule.itineraries(&query()).await.unwrap();
        assert_eq!(journeys.len(), 1);
        let update = feed.delay("t1").await.unwrap().unwrap();
        assert_eq!(update.delay_secs, 300);
        assert_eq!(feed.delay("other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_plan_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = StaticSchedule::from_plan_file(dir.path().join("nope.json")).err().unwrap();
        assert!(matches!(err, ScheduleError::Unavailable(_)));
    }

    #[tokio::test]
    async fn failing_feed() {
        assert!(StaticRealtimeFeed::failing().delay("t").await.is_err());
    }
}
