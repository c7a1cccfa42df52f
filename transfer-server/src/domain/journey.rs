//! Journey types.
//!
//! A `Journey` is a complete itinerary from origin to destination: an
//! ordered list of train and walking legs.

use chrono::{DateTime, Duration, FixedOffset};

use super::{DomainError, Leg};

/// A change between two train legs.
///
/// `arriving` and `departing` index into [`Journey::legs`]; every leg
/// strictly between them is a walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPoint {
    pub arriving: usize,
    pub departing: usize,
}

/// A complete journey from origin to destination.
///
/// # Invariants
///
/// - At least one leg
#[derive(Debug, Clone, PartialEq)]
pub struct Journey {
    id: String,
    legs: Vec<Leg>,
}

impl Journey {
    /// Constructs a journey from legs.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `legs` is empty.
    pub fn new(id: impl Into<String>, legs: Vec<Leg>) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyJourney);
        }
        Ok(Journey {
            id: id.into(),
            legs,
        })
    }

    /// Identifier of the journey, stable for a given schedule response.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns all legs in order.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Mutable access to the legs, for real-time and walking-time updates.
    pub fn legs_mut(&mut self) -> &mut [Leg] {
        &mut self.legs
    }

    /// Returns the number of train legs (excluding walks).
    pub fn train_leg_count(&self) -> usize {
        self.legs.iter().filter(|l| l.is_train()).count()
    }

    /// Returns the number of changes (train legs - 1, or 0 for direct).
    pub fn change_count(&self) -> usize {
        self.train_leg_count().saturating_sub(1)
    }

    /// Returns the actual departure time of the first leg.
    pub fn departure_time(&self) -> DateTime<FixedOffset> {
        // Safe: validated non-empty at construction
        self.legs[0].actual_departure
    }

    /// Returns the actual arrival time of the last leg.
    pub fn arrival_time(&self) -> DateTime<FixedOffset> {
        self.legs[self.legs.len() - 1].actual_arrival
    }

    /// Returns the total journey duration.
    pub fn total_duration(&self) -> Duration {
        self.arrival_time()
            .signed_duration_since(self.departure_time())
    }

    /// Returns true if any train leg is cancelled.
    pub fn has_cancelled_leg(&self) -> bool {
        self.legs.iter().any(|l| l.is_train() && l.cancelled)
    }

    /// Returns every change between consecutive train legs.
    pub fn transfer_points(&self) -> Vec<TransferPoint> {
        let trains: Vec<usize> = self
            .legs
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_train())
            .map(|(i, _)| i)
            .collect();

        trains
            .windows(2)
            .map(|w| TransferPoint {
                arriving: w[0],
                departing: w[1],
            })
            .collect()
    }

    /// Returns the indices of walking legs that are not part of a change:
    /// walks before the first train or after the last one.
    pub fn access_walks(&self) -> Vec<usize> {
        let first_train = self.legs.iter().position(|l| l.is_train());
        let last_train = self.legs.iter().rposition(|l| l.is_train());

        self.legs
            .iter()
            .enumerate()
            .filter(|(i, l)| {
                l.is_walk()
                    && match (first_train, last_train) {
                        (Some(first), Some(last)) => *i < first || *i > last,
                        _ => true,
                    }
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Available time for a change: departure of the next train minus
    /// arrival of the previous one.
    pub fn transfer_window(&self, point: TransferPoint) -> Duration {
        self.legs[point.departing]
            .actual_departure
            .signed_duration_since(self.legs[point.arriving].actual_arrival)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LegMode, Stop, parse_iso};

    fn t(s: &str) -> DateTime<FixedOffset> {
        parse_iso(&format!("2024-03-15T{s}:00Z")).unwrap()
    }

    fn leg(mode: LegMode, from: &str, to: &str, dep: &str, arr: &str) -> Leg {
        Leg::new(mode, Stop::named(from), Stop::named(to), t(dep), t(arr)).unwrap()
    }

    fn sample() -> Journey {
        Journey::new(
            "j1",
            vec![
                leg(LegMode::Walk, "Home", "Strasbourg", "09:40", "09:50"),
                leg(LegMode::Train, "Strasbourg", "Mulhouse", "10:00", "11:00"),
                leg(LegMode::Walk, "Mulhouse", "Mulhouse", "11:00", "11:04"),
                leg(LegMode::Train, "Mulhouse", "Basel", "11:10", "11:30"),
                leg(LegMode::Train, "Basel", "Zurich", "11:40", "12:40"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn empty_rejected() {
        assert_eq!(
            Journey::new("x", vec![]).unwrap_err(),
            DomainError::EmptyJourney
        );
    }

    #[test]
    fn counts_and_times() {
        let j = sample();
        assert_eq!(j.train_leg_count(), 3);
        assert_eq!(j.change_count(), 2);
        assert_eq!(j.departure_time(), t("09:40"));
        assert_eq!(j.arrival_time(), t("12:40"));
        assert_eq!(j.total_duration(), Duration::minutes(180));
    }

    #[test]
    fn transfer_points_skip_walks() {
        let j = sample();
        let points = j.transfer_points();
        assert_eq!(
            points,
            vec![
                TransferPoint {
                    arriving: 1,
                    departing: 3
                },
                TransferPoint {
                    arriving: 3,
                    departing: 4
                },
            ]
        );
        assert_eq!(j.transfer_window(points[0]), Duration::minutes(10));
        assert_eq!(j.transfer_window(points[1]), Duration::minutes(10));
    }

    #[test]
    fn access_walks_exclude_transfer_walks() {
        let j = sample();
        assert_eq!(j.access_walks(), vec![0]);
    }

    #[test]
    fn direct_journey_has_no_transfers() {
        let j = Journey::new(
            "d",
            vec![leg(LegMode::Train, "A", "B", "10:00", "11:00")],
        )
        .unwrap();
        assert_eq!(j.change_count(), 0);
        assert!(j.transfer_points().is_empty());
    }

    #[test]
    fn cancelled_leg_detected() {
        let mut j = sample();
        assert!(!j.has_cancelled_leg());
        j.legs_mut()[3].cancelled = true;
        assert!(j.has_cancelled_leg());
    }
}
