//! Application state for the web layer.

use std::sync::Arc;

use crate::planner::JourneyAssembler;
use crate::snapshot::SnapshotStore;

/// Shared application state.
///
/// Generic over the schedule source and real-time feed so tests can serve
/// fixed data.
pub struct AppState<S, F> {
    /// Journey assembler, which also owns the station directory and graphs
    pub assembler: Arc<JourneyAssembler<S, F>>,
}

impl<S, F> Clone for AppState<S, F> {
    fn clone(&self) -> Self {
        Self {
            assembler: Arc::clone(&self.assembler),
        }
    }
}

impl<S, F> AppState<S, F> {
    /// Create a new app state.
    pub fn new(assembler: JourneyAssembler<S, F>) -> Self {
        Self {
            assembler: Arc::new(assembler),
        }
    }

    /// The snapshot currently served.
    pub fn snapshot(&self) -> Arc<dyn SnapshotStore> {
        self.assembler.graphs().provider().current()
    }
}
