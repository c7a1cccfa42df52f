//! Journey assembly.
//!
//! Turns a user query into ranked, transfer-checked journeys:
//!
//! 1. resolve origin and destination in the station directory
//! 2. fetch candidate itineraries from the schedule source
//! 3. apply real-time delays and platform changes
//! 4. assess every transfer against the station's walkable graph
//! 5. drop journeys with an infeasible or cancelled leg, rank the rest

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset};
use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::domain::{Journey, Stop, StationId};
use crate::feasibility::{FeasibilityEvaluator, TransferAssessment, TransferQuery, Verdict};
use crate::graph::{GraphCache, WalkableGraph};
use crate::pathfind::{CancelFlag, SearchBudget};
use crate::pool::BlockingPool;
use crate::schedule::{ItineraryQuery, Place, RealtimeFeed, ScheduleError, ScheduleSource};
use crate::stations::{StationDirectory, StationEntry, StationError};

use super::config::AssemblerConfig;
use super::rank::{deduplicate, rank_journeys};

/// Placeholder id for transfers at stops that match no station relation.
/// OSM ids start at 1.
const UNRESOLVED_STATION: StationId = StationId(0);

/// Errors from journey assembly.
#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    /// Origin or destination not in the station directory
    #[error("no station found for {0:?}")]
    NotFound(String),

    /// The station directory could not be queried
    #[error(transparent)]
    Station(StationError),

    /// The schedule source failed
    #[error("schedule source failed: {0}")]
    Upstream(#[from] ScheduleError),
}

impl From<StationError> for AssembleError {
    fn from(e: StationError) -> Self {
        match e {
            StationError::NotFound(name) => AssembleError::NotFound(name),
            other => AssembleError::Station(other),
        }
    }
}

/// A journey query.
#[derive(Debug, Clone)]
pub struct JourneyRequest {
    pub origin: String,
    pub destination: String,
    pub departure: DateTime<FixedOffset>,
}

/// The assessment of one change within a journey.
#[derive(Debug, Clone, Serialize)]
pub struct TransferAnnotation {
    /// Index of the arriving train leg.
    pub arriving_leg: usize,
    /// Index of the departing train leg.
    pub departing_leg: usize,
    /// Station relation the change happens in, if one matched.
    pub station: Option<StationId>,
    pub assessment: TransferAssessment,
}

/// A journey that passed the transfer checks.
#[derive(Debug, Clone)]
pub struct AssessedJourney {
    pub journey: Journey,
    pub transfers: Vec<TransferAnnotation>,
}

impl AssessedJourney {
    /// True if any change is within the safety buffer.
    pub fn is_marginal(&self) -> bool {
        self.transfers
            .iter()
            .any(|t| t.assessment.verdict == Verdict::Marginal)
    }
}

impl Borrow<Journey> for AssessedJourney {
    fn borrow(&self) -> &Journey {
        &self.journey
    }
}

/// Result of an assembly.
#[derive(Debug, Clone)]
pub struct AssembleResult {
    pub origin: StationEntry,
    pub destination: StationEntry,
    pub departure_time: DateTime<FixedOffset>,
    /// The deadline passed before every candidate was assessed.
    pub partial: bool,
    /// The real-time feed failed; affected legs use scheduled times.
    pub stale: bool,
    /// Ranked best-first.
    pub journeys: Vec<AssessedJourney>,
}

/// Platforms and window of one change, owned so it can move to a worker.
#[derive(Debug, Clone)]
struct PlatformPair {
    arrival: Option<String>,
    departure: Option<String>,
    window_secs: i64,
}

impl PlatformPair {
    fn query(&self) -> TransferQuery<'_> {
        TransferQuery {
            arrival_platform: self.arrival.as_deref(),
            departure_platform: self.departure.as_deref(),
            window_secs: self.window_secs,
        }
    }
}

/// Assembles journeys from a schedule source, a real-time feed and the
/// station graphs.
pub struct JourneyAssembler<S, F> {
    stations: StationDirectory,
    schedule: Arc<S>,
    feed: Arc<F>,
    graphs: Arc<GraphCache>,
    pool: BlockingPool,
    evaluator: FeasibilityEvaluator,
    config: AssemblerConfig,
}

impl<S, F> JourneyAssembler<S, F> {
    pub fn new(
        stations: StationDirectory,
        schedule: Arc<S>,
        feed: Arc<F>,
        graphs: Arc<GraphCache>,
        pool: BlockingPool,
        evaluator: FeasibilityEvaluator,
        config: AssemblerConfig,
    ) -> Self {
        Self {
            stations,
            schedule,
            feed,
            graphs,
            pool,
            evaluator,
            config,
        }
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    pub fn stations(&self) -> &StationDirectory {
        &self.stations
    }

    pub fn graphs(&self) -> &Arc<GraphCache> {
        &self.graphs
    }

    pub fn evaluator(&self) -> &FeasibilityEvaluator {
        &self.evaluator
    }

    pub fn pool(&self) -> &BlockingPool {
        &self.pool
    }
}

impl<S, F> JourneyAssembler<S, F>
where
    S: ScheduleSource,
    F: RealtimeFeed,
{
    /// Find, check and rank journeys for a request.
    ///
    /// The request deadline covers the whole call, upstream fetches
    /// included.
    pub async fn assemble(&self, request: &JourneyRequest) -> Result<AssembleResult, AssembleError> {
        let deadline = Instant::now() + self.config.request_deadline;
        let origin = self.stations.resolve(&request.origin).await?;
        let destination = self.stations.resolve(&request.destination).await?;

        let query = ItineraryQuery {
            origin: Place {
                name: origin.name.clone(),
                coord: origin.coord(),
            },
            destination: Place {
                name: destination.name.clone(),
                coord: destination.coord(),
            },
            after: request.departure,
            max_transfers: self.config.max_transfers,
            max_results: self.config.max_results,
        };
        let candidates = deduplicate(self.schedule.itineraries(&query).await?);
        info!(
            origin = %origin.name,
            destination = %destination.name,
            candidates = candidates.len(),
            "itineraries received"
        );

        let (candidates, stale) = self.apply_realtime(candidates, deadline).await;
        let candidates: Vec<Journey> = candidates
            .into_iter()
            .filter(|j| {
                let cancelled = j.has_cancelled_leg();
                if cancelled {
                    debug!(journey = j.id(), "dropping journey with cancelled leg");
                }
                !cancelled
            })
            .collect();

        let (assessed, partial) = self.assess_all(candidates, deadline).await;
        let journeys = rank_journeys(assessed, self.config.max_results);
        info!(journeys = journeys.len(), partial, stale, "journeys assembled");

        Ok(AssembleResult {
            origin,
            destination,
            departure_time: request.departure,
            partial,
            stale,
            journeys,
        })
    }

    /// Assess a single change at a known station.
    pub async fn assess_transfer(
        &self,
        station: StationId,
        arrival_platform: Option<&str>,
        departure_platform: Option<&str>,
        window_secs: i64,
    ) -> TransferAssessment {
        let graph = self.graphs.get(station).await;
        let pair = PlatformPair {
            arrival: arrival_platform.map(str::to_string),
            departure: departure_platform.map(str::to_string),
            window_secs,
        };
        self.evaluate(graph, pair, self.evaluator.policy().search_budget())
            .await
    }

    /// Recompute leg times from the real-time feed.
    ///
    /// Each trip is looked up once. Legs whose lookup fails keep their
    /// scheduled times and the result is flagged stale, as does every leg
    /// when the lookups outlast the deadline.
    async fn apply_realtime(
        &self,
        mut journeys: Vec<Journey>,
        deadline: Instant,
    ) -> (Vec<Journey>, bool) {
        let trips: HashSet<String> = journeys
            .iter()
            .flat_map(|j| j.legs())
            .filter(|l| l.is_train())
            .filter_map(|l| l.trip_id.clone())
            .collect();

        let lookups = trips.into_iter().map(|trip| async move {
            let result = self.feed.delay(&trip).await;
            (trip, result)
        });
        let mut updates = HashMap::new();
        let mut stale = false;
        let results =
            match tokio::time::timeout_at(deadline, futures::future::join_all(lookups)).await {
                Ok(results) => results,
                Err(_) => {
                    warn!("real-time lookups reached the request deadline, using scheduled times");
                    stale = true;
                    Vec::new()
                }
            };
        for (trip, result) in results {
            match result {
                Ok(Some(update)) => {
                    updates.insert(trip, update);
                }
                Ok(None) => {}
                Err(e) => {
                    if !stale {
                        warn!(trip = %trip, error = %e, "real-time feed unavailable, using scheduled times");
                    }
                    stale = true;
                }
            }
        }

        for journey in &mut journeys {
            for leg in journey.legs_mut().iter_mut().filter(|l| l.is_train()) {
                match leg.trip_id.as_ref().and_then(|t| updates.get(t)) {
                    Some(update) => leg.apply_delay(update),
                    None => leg.reset_to_schedule(),
                }
            }
        }
        (journeys, stale)
    }

    /// Assess all candidates concurrently under the request deadline.
    ///
    /// Once the deadline has passed nothing more is collected, even results
    /// that are already complete.
    async fn assess_all(
        &self,
        journeys: Vec<Journey>,
        deadline: Instant,
    ) -> (Vec<AssessedJourney>, bool) {
        let cancel = CancelFlag::new();
        let budget = self
            .evaluator
            .policy()
            .search_budget()
            .with_deadline(deadline.into_std())
            .with_cancel(cancel.clone());

        let budget = &budget;
        let mut pending: FuturesUnordered<_> = journeys
            .into_iter()
            .enumerate()
            .map(|(i, j)| async move { (i, self.assess(j, budget).await) })
            .collect();

        let mut assessed = Vec::new();
        let mut partial = false;
        while !pending.is_empty() {
            let next = if Instant::now() < deadline {
                tokio::time::timeout_at(deadline, pending.next()).await.ok()
            } else {
                None
            };
            match next {
                Some(Some((i, Some(journey)))) => assessed.push((i, journey)),
                Some(Some((_, None))) => {}
                Some(None) => break,
                None => {
                    warn!(
                        unfinished = pending.len(),
                        "request deadline reached, returning partial results"
                    );
                    cancel.cancel();
                    partial = true;
                    break;
                }
            }
        }
        drop(pending);

        // Completion order is arbitrary; keep the source's order for ties.
        assessed.sort_by_key(|(i, _)| *i);
        (assessed.into_iter().map(|(_, j)| j).collect(), partial)
    }

    /// Check every change of a journey concurrently. `None` if any is
    /// infeasible.
    async fn assess(&self, mut journey: Journey, budget: &SearchBudget) -> Option<AssessedJourney> {
        let checks: Vec<_> = journey
            .transfer_points()
            .into_iter()
            .map(|point| {
                let arriving = &journey.legs()[point.arriving];
                let departing = &journey.legs()[point.departing];
                let station = self.locate(&arriving.destination);
                let pair = PlatformPair {
                    arrival: arriving.arrival_platform.clone(),
                    departure: departing.departure_platform.clone(),
                    window_secs: journey.transfer_window(point).num_seconds(),
                };
                async move {
                    let graph = match station {
                        Some(id) => self.graphs.get(id).await,
                        None => Arc::new(WalkableGraph::empty(UNRESOLVED_STATION)),
                    };
                    let assessment = self.evaluate(graph, pair, budget.clone()).await;
                    TransferAnnotation {
                        arriving_leg: point.arriving,
                        departing_leg: point.departing,
                        station,
                        assessment,
                    }
                }
            })
            .collect();
        let transfers = futures::future::join_all(checks).await;

        if let Some(bad) = transfers.iter().find(|t| t.assessment.is_infeasible()) {
            debug!(
                journey = journey.id(),
                station = ?bad.station,
                tier = ?bad.assessment.tier,
                required = bad.assessment.required_secs,
                window = bad.assessment.window_secs,
                "dropping journey with infeasible transfer"
            );
            return None;
        }

        self.refine_access_walks(&mut journey, budget).await;
        Some(AssessedJourney { journey, transfers })
    }

    /// Retime walks to and from the journey's end points when both ends
    /// are platforms of one station.
    async fn refine_access_walks(&self, journey: &mut Journey, budget: &SearchBudget) {
        let first_train = journey.legs().iter().position(|l| l.is_train());
        for idx in journey.access_walks() {
            let leg = &journey.legs()[idx];
            let (Some(from), Some(to)) = (leg.departure_platform.clone(), leg.arrival_platform.clone())
            else {
                continue;
            };
            let Some(station) = self.locate(&leg.origin) else {
                continue;
            };
            if self.locate(&leg.destination) != Some(station) {
                continue;
            }

            let graph = self.graphs.get(station).await;
            let evaluator = self.evaluator.clone();
            let budget = budget.clone();
            let walked = self
                .pool
                .run(move || evaluator.walking_secs(&graph, &from, &to, &budget))
                .await;
            let Ok(Some((secs, _))) = walked else {
                continue;
            };

            let duration = Duration::seconds(secs);
            let leg = &mut journey.legs_mut()[idx];
            if first_train.is_some_and(|first| idx < first) {
                // Must still reach the first train on time.
                leg.actual_departure = leg.actual_arrival - duration;
            } else {
                leg.set_actual_duration(duration);
            }
            debug!(journey = journey.id(), leg = idx, secs, "walk retimed from station graph");
        }
    }

    async fn evaluate(
        &self,
        graph: Arc<WalkableGraph>,
        pair: PlatformPair,
        budget: SearchBudget,
    ) -> TransferAssessment {
        let evaluator = self.evaluator.clone();
        let job = pair.clone();
        let result = self
            .pool
            .run(move || evaluator.evaluate(&graph, &job.query(), &budget))
            .await;
        match result {
            Ok(assessment) => assessment,
            Err(e) => {
                warn!(error = %e, "transfer evaluation did not complete, using fallback");
                let empty = WalkableGraph::empty(UNRESOLVED_STATION);
                self.evaluator
                    .evaluate(&empty, &pair.query(), &SearchBudget::new(0))
            }
        }
    }

    /// The station relation a stop belongs to.
    fn locate(&self, stop: &Stop) -> Option<StationId> {
        let snapshot = self.graphs.provider().current();
        match snapshot.find_station(&stop.name, stop.coord, self.config.station_match_radius_m) {
            Ok(found) => found,
            Err(e) => {
                warn!(stop = %stop.name, error = %e, "station lookup failed");
                None
            }
        }
    }
}
