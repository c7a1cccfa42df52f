//! Journey ranking for assembled results.

use std::borrow::Borrow;
use std::cmp::Ordering;

use crate::domain::Journey;

/// Preference order between two journeys.
///
/// Shorter total duration first, then fewer changes, then earlier
/// departure.
pub fn compare_journeys(a: &Journey, b: &Journey) -> Ordering {
    a.total_duration()
        .cmp(&b.total_duration())
        .then_with(|| a.change_count().cmp(&b.change_count()))
        .then_with(|| a.departure_time().cmp(&b.departure_time()))
}

/// Sort journeys best-first and keep at most `max_results`.
pub fn rank_journeys<J: Borrow<Journey>>(mut journeys: Vec<J>, max_results: usize) -> Vec<J> {
    journeys.sort_by(|a, b| compare_journeys(a.borrow(), b.borrow()));
    journeys.truncate(max_results);
    journeys
}

/// Deduplicate journeys that are effectively identical.
///
/// Two journeys are considered duplicates if they depart at the same time,
/// arrive at the same time and ride the same trips. The first one seen is
/// kept, so the source's order is preserved otherwise.
pub fn deduplicate(journeys: Vec<Journey>) -> Vec<Journey> {
    let mut seen = std::collections::HashSet::new();
    journeys
        .into_iter()
        .filter(|j| {
            let trips: Vec<Option<String>> = j
                .legs()
                .iter()
                .filter(|l| l.is_train())
                .map(|l| l.trip_id.clone())
                .collect();
            seen.insert((j.departure_time(), j.arrival_time(), trips))
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, FixedOffset};

    use crate::domain::{Journey, Leg, LegMode, Stop, parse_iso};

    pub fn t(hhmm: &str) -> DateTime<FixedOffset> {
        parse_iso(&format!("2024-03-15T{hhmm}:00+01:00")).unwrap()
    }

    pub fn train(trip: &str, from: &str, to: &str, dep: &str, arr: &str) -> Leg {
        Leg::new(LegMode::Train, Stop::named(from), Stop::named(to), t(dep), t(arr))
            .unwrap()
            .with_trip(trip, None)
    }

    /// A journey of back-to-back trains, `changes + 1` legs of equal length.
    pub fn journey(id: &str, dep_mins: i64, duration_mins: i64, changes: usize) -> Journey {
        let start = t("08:00") + Duration::minutes(dep_mins);
        let legs = changes + 1;
        let per_leg = duration_mins / legs as i64;
        let legs = (0..legs)
            .map(|i| {
                let dep = start + Duration::minutes(per_leg * i as i64);
                let arr = if i + 1 == changes + 1 {
                    start + Duration::minutes(duration_mins)
                } else {
                    dep + Duration::minutes(per_leg)
                };
                Leg::new(LegMode::Train, Stop::named("A"), Stop::named("B"), dep, arr)
                    .unwrap()
                    .with_trip(format!("{id}-{i}"), None)
            })
            .collect();
        Journey::new(id, legs).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn ids(journeys: &[Journey]) -> Vec<&str> {
        journeys.iter().map(Journey::id).collect()
    }

    #[test]
    fn shorter_duration_first() {
        let ranked = rank_journeys(
            vec![journey("slow", 0, 90, 0), journey("fast", 10, 60, 1)],
            10,
        );
        assert_eq!(ids(&ranked), vec!["fast", "slow"]);
    }

    #[test]
    fn ties_broken_by_changes_then_departure() {
        let ranked = rank_journeys(
            vec![
                journey("late-direct", 30, 60, 0),
                journey("two-changes", 0, 60, 2),
                journey("early-direct", 0, 60, 0),
            ],
            10,
        );
        assert_eq!(ids(&ranked), vec!["early-direct", "late-direct", "two-changes"]);
    }

    #[test]
    fn truncates() {
        let ranked = rank_journeys(
            (0..6)
                .map(|i| journey(&format!("j{i}"), i, 60 + i, 0))
                .collect::<Vec<Journey>>(),
            3,
        );
        assert_eq!(ids(&ranked), vec!["j0", "j1", "j2"]);
        assert!(rank_journeys(Vec::<Journey>::new(), 3).is_empty());
    }

    #[test]
    fn deduplicate_same_trips() {
        let a = Journey::new("a", vec![train("t1", "A", "B", "10:00", "11:00")]).unwrap();
        let b = Journey::new("b", vec![train("t1", "A", "B", "10:00", "11:00")]).unwrap();
        let c = Journey::new("c", vec![train("t2", "A", "B", "10:00", "11:00")]).unwrap();
        let kept = deduplicate(vec![a, b, c]);
        assert_eq!(ids(&kept), vec!["a", "c"]);
    }
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use super::fixtures::journey;
    use super::*;

    proptest! {
        #[test]
        fn ranked_output_is_sorted_and_bounded(
            specs in prop::collection::vec((0i64..120, 10i64..300, 0usize..4), 0..20),
            max in 0usize..10,
        ) {
            let journeys: Vec<Journey> = specs
                .iter()
                .enumerate()
                .map(|(i, (dep, dur, changes))| journey(&format!("j{i}"), *dep, *dur, *changes))
                .collect();
            let ranked = rank_journeys(journeys, max);

            prop_assert!(ranked.len() <= max);
            prop_assert!(ranked.len() <= specs.len());
            for pair in ranked.windows(2) {
                prop_assert!(compare_journeys(&pair[0], &pair[1]) != Ordering::Greater);
                prop_assert!(pair[0].total_duration() <= pair[1].total_duration());
            }
        }
    }
}
