//! Search limits: explored-node budget, deadline and cancellation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Default maximum number of nodes a single search may settle.
pub const DEFAULT_MAX_EXPLORED: usize = 50_000;

/// Shared flag that aborts in-flight searches.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Limits checked while a search runs.
#[derive(Debug, Clone)]
pub struct SearchBudget {
    /// Maximum number of settled nodes.
    pub max_explored: usize,
    /// Abort once this instant has passed.
    pub deadline: Option<Instant>,
    /// Abort once this flag is set.
    pub cancel: Option<CancelFlag>,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_explored: DEFAULT_MAX_EXPLORED,
            deadline: None,
            cancel: None,
        }
    }
}

impl SearchBudget {
    pub fn new(max_explored: usize) -> Self {
        Self {
            max_explored,
            ..Self::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// True if the deadline has passed or the flag is set.
    pub fn interrupted(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled)
            || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let budget = SearchBudget::default().with_cancel(flag.clone());
        assert!(!budget.interrupted());
        flag.cancel();
        assert!(budget.interrupted());
    }

    #[test]
    fn past_deadline_interrupts() {
        let past = Instant::now() - Duration::from_millis(1);
        assert!(SearchBudget::default().with_deadline(past).interrupted());
        let future = Instant::now() + Duration::from_secs(60);
        assert!(!SearchBudget::default().with_deadline(future).interrupted());
    }
}
