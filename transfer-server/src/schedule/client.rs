//! Transitous (MOTIS) HTTP client.
//!
//! Fetches itineraries from the public MOTIS routing API. Every plan
//! response also carries real-time times and tracks for the trips it
//! mentions; those are kept in a short-lived cache that backs the
//! [`RealtimeFeed`] implementation.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::domain::{DelayUpdate, Journey};

use super::convert::convert_plan;
use super::error::ScheduleError;
use super::source::{ItineraryQuery, RealtimeFeed, ScheduleSource};
use super::types::PlanResponse;

/// Default base URL of the Transitous API.
const DEFAULT_BASE_URL: &str = "https://api.transitous.org";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 4;

const DEFAULT_USER_AGENT: &str = "transfr/0.1";

/// Configuration for the Transitous client.
#[derive(Debug, Clone)]
pub struct TransitousConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Sent as `User-Agent`
    pub user_agent: String,
    /// How long real-time observations stay valid
    pub realtime_ttl: Duration,
}

impl Default for TransitousConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            realtime_ttl: Duration::from_secs(60),
        }
    }
}

impl TransitousConfig {
    /// Set a custom base URL (for testing or a self-hosted MOTIS).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    pub fn with_realtime_ttl(mut self, ttl: Duration) -> Self {
        self.realtime_ttl = ttl;
        self
    }
}

/// Transitous API client.
///
/// Uses a semaphore to limit concurrent requests.
#[derive(Clone)]
pub struct TransitousClient {
    http: reqwest::Client,
    base_url: String,
    semaphore: Arc<Semaphore>,
    realtime: MokaCache<String, DelayUpdate>,
}

impl TransitousClient {
    /// Create a new client with the given configuration.
    pub fn new(config: TransitousConfig) -> Result<Self, ScheduleError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| ScheduleError::Unavailable("invalid user agent".to_string()))?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let realtime = MokaCache::builder()
            .time_to_live(config.realtime_ttl)
            .max_capacity(10_000)
            .build();

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            realtime,
        })
    }

    fn plan_url(&self) -> String {
        format!("{}/api/v5/plan", self.base_url)
    }

    /// Fetch and decode a plan response.
    pub async fn plan(&self, query: &ItineraryQuery) -> Result<PlanResponse, ScheduleError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ScheduleError::Unavailable("semaphore closed".to_string()))?;

        debug!(
            origin = %query.origin.name,
            destination = %query.destination.name,
            after = %query.after,
            "requesting itineraries"
        );
        let response = self
            .http
            .get(self.plan_url())
            .query(&plan_params(query))
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScheduleError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ScheduleError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| ScheduleError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }

    /// Number of trips with a cached real-time observation.
    pub fn realtime_entries(&self) -> u64 {
        self.realtime.entry_count()
    }

    async fn record(&self, observations: Vec<(String, DelayUpdate)>) {
        for (trip, update) in observations {
            self.realtime.insert(trip, update).await;
        }
    }
}

/// Query parameters for `/api/v5/plan`.
fn plan_params(query: &ItineraryQuery) -> Vec<(&'static str, String)> {
    let place = |c: crate::domain::Coord| format!("{},{}", c.lat, c.lon);
    vec![
        ("fromPlace", place(query.origin.coord)),
        ("toPlace", place(query.destination.coord)),
        ("time", query.after.to_rfc3339()),
        ("numItineraries", query.max_results.to_string()),
        ("maxTransfers", query.max_transfers.to_string()),
    ]
}

impl ScheduleSource for TransitousClient {
    async fn itineraries(&self, query: &ItineraryQuery) -> Result<Vec<Journey>, ScheduleError> {
        let response = self.plan(query).await?;
        let plan = convert_plan(&response);
        if plan.skipped > 0 {
            warn!(skipped = plan.skipped, "some itineraries could not be converted");
        }
        self.record(plan.realtime).await;
        Ok(plan.journeys)
    }
}

impl RealtimeFeed for TransitousClient {
    async fn delay(&self, trip_id: &str) -> Result<Option<DelayUpdate>, ScheduleError> {
        Ok(self.realtime.get(trip_id).await)
    }
}
