//! Versioned, single-flight cache of station graphs.
//!
//! Entries are keyed by `(station, snapshot version)`. Concurrent misses on
//! the same key share one build. When the snapshot version changes the whole
//! cache is dropped; graphs are never patched in place.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::{info, warn};

use crate::domain::StationId;
use crate::pool::{BlockingPool, PoolError};
use crate::snapshot::{SnapshotProvider, SnapshotVersion};

use super::config::GraphConfig;
use super::pipeline::build_station_graph;
use super::walkable::WalkableGraph;

type GraphKey = (StationId, SnapshotVersion);

/// Configuration for the graph cache.
#[derive(Debug, Clone)]
pub struct GraphCacheConfig {
    /// Maximum number of cached station graphs.
    pub max_capacity: u64,

    /// Graphs unused for this long are evicted.
    pub time_to_idle: Duration,
}

impl Default for GraphCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 512,
            time_to_idle: Duration::from_secs(60 * 60),
        }
    }
}

impl GraphCacheConfig {
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_time_to_idle(mut self, ttl: Duration) -> Self {
        self.time_to_idle = ttl;
        self
    }
}

/// Lazily built, shared station graphs.
pub struct GraphCache {
    provider: Arc<dyn SnapshotProvider>,
    graph_config: GraphConfig,
    pool: BlockingPool,
    graphs: MokaCache<GraphKey, Arc<WalkableGraph>>,
    version: Mutex<Option<SnapshotVersion>>,
    builds: AtomicU64,
}

impl GraphCache {
    pub fn new(
        provider: Arc<dyn SnapshotProvider>,
        graph_config: GraphConfig,
        cache_config: &GraphCacheConfig,
        pool: BlockingPool,
    ) -> Self {
        let graphs = MokaCache::builder()
            .max_capacity(cache_config.max_capacity)
            .time_to_idle(cache_config.time_to_idle)
            .build();

        Self {
            provider,
            graph_config,
            pool,
            graphs,
            version: Mutex::new(None),
            builds: AtomicU64::new(0),
        }
    }

    /// The graph for a station under the current snapshot.
    ///
    /// Never fails: if the build cannot run the station gets an empty graph,
    /// which is not cached.
    pub async fn get(&self, station: StationId) -> Arc<WalkableGraph> {
        let snapshot = self.provider.current();
        let version = snapshot.version();
        self.observe_version(version);

        let config = self.graph_config.clone();
        let pool = self.pool.clone();
        let builds = &self.builds;
        let result = self
            .graphs
            .try_get_with((station, version), async move {
                builds.fetch_add(1, Ordering::Relaxed);
                let graph = pool
                    .run(move || build_station_graph(snapshot.as_ref(), station, &config))
                    .await?;
                Ok::<_, PoolError>(Arc::new(graph))
            })
            .await;

        match result {
            Ok(graph) => graph,
            Err(e) => {
                warn!(station = %station, error = %e, "graph build did not complete");
                Arc::new(WalkableGraph::empty(station))
            }
        }
    }

    /// Drop every cached graph if `version` differs from the last one seen.
    ///
    /// Returns true if the cache was invalidated.
    ///
    /// Only the provider's current version counts. A caller still holding
    /// an older pinned snapshot cannot roll the cache back.
    pub fn observe_version(&self, version: SnapshotVersion) -> bool {
        if self.provider.current().version() != version {
            return false;
        }
        let mut last = self.version.lock().unwrap_or_else(|e| e.into_inner());
        match *last {
            Some(prev) if prev == version => false,
            Some(prev) => {
                info!(from = %prev, to = %version, "snapshot version changed, dropping cached graphs");
                *last = Some(version);
                self.graphs.invalidate_all();
                true
            }
            None => {
                *last = Some(version);
                false
            }
        }
    }

    /// Number of builds started since creation.
    pub fn build_count(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    /// Approximate number of cached graphs.
    pub fn entry_count(&self) -> u64 {
        self.graphs.entry_count()
    }

    pub fn graph_config(&self) -> &GraphConfig {
        &self.graph_config
    }

    /// Current snapshot, for callers that query the store directly.
    pub fn provider(&self) -> &Arc<dyn SnapshotProvider> {
        &self.provider
    }
}
