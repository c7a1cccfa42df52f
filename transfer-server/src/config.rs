//! Server configuration from environment variables.
//!
//! Every setting has a default; `TRANSFR_*` variables override them.

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::feasibility::TransferPolicy;
use crate::graph::{GraphCacheConfig, GraphConfig};
use crate::planner::AssemblerConfig;
use crate::pool::DEFAULT_WORKERS;
use crate::schedule::TransitousConfig;

const DEFAULT_SNAPSHOT: &str = "data/snapshot.json";
const DEFAULT_STATIONS: &str = "data/stations.csv";
const DEFAULT_REFRESH: Duration = Duration::from_secs(5 * 60);

/// A variable was set but could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}={value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the server needs to start.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub snapshot_path: PathBuf,
    pub stations_path: PathBuf,
    /// How often the snapshot and station files are re-read.
    pub refresh_interval: Duration,
    /// Threads for graph builds and path searches.
    pub workers: usize,
    pub transitous: TransitousConfig,
    pub graph: GraphConfig,
    pub graph_cache: GraphCacheConfig,
    pub policy: TransferPolicy,
    pub assembler: AssemblerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT),
            stations_path: PathBuf::from(DEFAULT_STATIONS),
            refresh_interval: DEFAULT_REFRESH,
            workers: DEFAULT_WORKERS,
            transitous: TransitousConfig::default(),
            graph: GraphConfig::default(),
            graph_cache: GraphCacheConfig::default(),
            policy: TransferPolicy::default(),
            assembler: AssemblerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup<L>(lookup: L) -> Result<Self, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let env = Env { lookup };

        if let Some(bind) = env.parse("TRANSFR_BIND")? {
            config.bind = bind;
        }
        if let Some(path) = env.raw("TRANSFR_SNAPSHOT") {
            config.snapshot_path = PathBuf::from(path);
        }
        if let Some(path) = env.raw("TRANSFR_STATIONS") {
            config.stations_path = PathBuf::from(path);
        }
        if let Some(secs) = env.positive::<u64>("TRANSFR_REFRESH_SECS")? {
            config.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(workers) = env.positive("TRANSFR_WORKERS")? {
            config.workers = workers;
        }

        if let Some(url) = env.raw("TRANSFR_TRANSITOUS_URL") {
            config.transitous = config.transitous.with_base_url(url);
        }
        if let Some(secs) = env.positive("TRANSFR_TRANSITOUS_TIMEOUT_SECS")? {
            config.transitous = config.transitous.with_timeout(secs);
        }
        if let Some(n) = env.positive("TRANSFR_TRANSITOUS_MAX_CONCURRENT")? {
            config.transitous = config.transitous.with_max_concurrent(n);
        }

        if let Some(hops) = env.parse("TRANSFR_EXPANSION_HOPS")? {
            config.graph = config.graph.with_expansion_hops(hops);
        }
        if let Some(capacity) = env.positive("TRANSFR_GRAPH_CACHE_CAPACITY")? {
            config.graph_cache = config.graph_cache.with_max_capacity(capacity);
        }

        config.policy = read_policy(&env, config.policy)?;

        if let Some(n) = env.parse("TRANSFR_MAX_TRANSFERS")? {
            config.assembler = config.assembler.with_max_transfers(n);
        }
        if let Some(n) = env.positive("TRANSFR_MAX_RESULTS")? {
            config.assembler = config.assembler.with_max_results(n);
        }
        if let Some(ms) = env.positive::<u64>("TRANSFR_REQUEST_DEADLINE_MS")? {
            config.assembler = config
                .assembler
                .with_request_deadline(Duration::from_millis(ms));
        }
        if let Some(meters) = env.positive_f64("TRANSFR_STATION_RADIUS_M")? {
            config.assembler = config.assembler.with_station_match_radius(meters);
        }

        Ok(config)
    }
}

fn read_policy<L>(env: &Env<L>, mut policy: TransferPolicy) -> Result<TransferPolicy, ConfigError>
where
    L: Fn(&str) -> Option<String>,
{
    if let Some(secs) = env.parse("TRANSFR_MIN_SAME_PLATFORM_SECS")? {
        policy = policy.with_min_same_platform_secs(secs);
    }
    if let Some(mps) = env.positive_f64("TRANSFR_WALKING_SPEED_MPS")? {
        policy = policy.with_walking_speed(mps);
    }
    if let Some(secs) = env.parse("TRANSFR_SAFETY_BUFFER_SECS")? {
        policy = policy.with_safety_buffer_secs(secs);
    }
    if let Some(meters) = env.positive_f64("TRANSFR_FALLBACK_DISTANCE_M")? {
        policy = policy.with_fallback_distance(meters);
    }
    if let Some(meters) = env.positive_f64("TRANSFR_HOP_LENGTH_M")? {
        policy = policy.with_hop_length(meters);
    }
    if let Some(secs) = env.positive_f64("TRANSFR_ELEVATOR_SECS")? {
        policy = policy.with_elevator_secs(secs);
    }
    if let Some(max) = env.positive("TRANSFR_MAX_EXPLORED")? {
        policy = policy.with_max_explored(max);
    }
    Ok(policy)
}

struct Env<L> {
    lookup: L,
}

impl<L> Env<L>
where
    L: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(value) = self.raw(key) else {
            return Ok(None);
        };
        match value.parse() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => Err(invalid(key, value, e)),
        }
    }

    fn positive<T>(&self, key: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr + Default + PartialEq + Display,
        T::Err: Display,
    {
        match self.parse::<T>(key)? {
            Some(v) if v == T::default() => Err(invalid(key, v.to_string(), "must be positive")),
            other => Ok(other),
        }
    }

    fn positive_f64(&self, key: &'static str) -> Result<Option<f64>, ConfigError> {
        match self.parse::<f64>(key)? {
            Some(v) if !(v.is_finite() && v > 0.0) => {
                Err(invalid(key, v.to_string(), "must be a positive number"))
            }
            other => Ok(other),
        }
    }
}

fn invalid(key: &'static str, value: String, reason: impl Display) -> ConfigError {
    ConfigError::Invalid {
        key,
        value,
        reason: reason.to_string(),
    }
}
