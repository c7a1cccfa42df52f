//! Configuration for the journey assembler.

use std::time::Duration;

/// Configuration parameters for journey assembly.
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Maximum number of train changes requested from the schedule source.
    pub max_transfers: usize,

    /// Maximum number of journeys to return.
    pub max_results: usize,

    /// Time budget for evaluating all transfers of one request.
    /// Journeys not assessed by then are left out and the result is
    /// marked partial.
    pub request_deadline: Duration,

    /// How far (meters) a stop may be from a station centroid and still be
    /// matched to it when names differ.
    pub station_match_radius_m: f64,
}

impl AssemblerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_transfers(mut self, n: usize) -> Self {
        self.max_transfers = n;
        self
    }

    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n;
        self
    }

    pub fn with_request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = deadline;
        self
    }

    pub fn with_station_match_radius(mut self, meters: f64) -> Self {
        self.station_match_radius_m = meters;
        self
    }
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_transfers: 3,
            max_results: 5,
            request_deadline: Duration::from_secs(10),
            station_match_radius_m: 300.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = AssemblerConfig::default();

        assert_eq!(config.max_transfers, 3);
        assert_eq!(config.max_results, 5);
        assert_eq!(config.request_deadline, Duration::from_secs(10));
        assert_eq!(config.station_match_radius_m, 300.0);
    }

    #[test]
    fn builders() {
        let config = AssemblerConfig::new()
            .with_max_transfers(1)
            .with_max_results(2)
            .with_request_deadline(Duration::from_millis(500))
            .with_station_match_radius(50.0);

        assert_eq!(config.max_transfers, 1);
        assert_eq!(config.max_results, 2);
        assert_eq!(config.request_deadline, Duration::from_millis(500));
        assert_eq!(config.station_match_radius_m, 50.0);
    }
}
