//! Four-tier transfer feasibility.
//!
//! Tiers are tried in order and the first that applies decides:
//!
//! 1. same platform: fixed minimum dwell
//! 2. adjoining platforms: shortest path over platform and crossing edges
//! 3. connector path: shortest path over the whole graph, timed per class
//! 4. fallback: a fixed conservative distance
//!
//! Tier 4 always resolves, so every transfer gets a verdict.

use tracing::debug;

use crate::domain::{WayClass, WayId};
use crate::graph::{EdgeIdx, WalkableGraph};
use crate::pathfind::{
    DistanceMode, EdgeFilter, FoundPath, PathOutcome, SearchBudget, UnreachableReason,
    shortest_path,
};

use super::anchors::{adjoining, find_anchor, same_platform};
use super::policy::TransferPolicy;
use super::verdict::{PathDistance, Tier, TransferAssessment, classify};

/// The two platforms and the time available between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferQuery<'a> {
    pub arrival_platform: Option<&'a str>,
    pub departure_platform: Option<&'a str>,
    /// Departure minus arrival, in seconds. May be negative.
    pub window_secs: i64,
}

/// Applies a [`TransferPolicy`] to station graphs.
#[derive(Debug, Clone, Default)]
pub struct FeasibilityEvaluator {
    policy: TransferPolicy,
}

impl FeasibilityEvaluator {
    pub fn new(policy: TransferPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &TransferPolicy {
        &self.policy
    }

    /// Assess one transfer.
    pub fn evaluate(
        &self,
        graph: &WalkableGraph,
        query: &TransferQuery<'_>,
        budget: &SearchBudget,
    ) -> TransferAssessment {
        let assessment = self.evaluate_tiers(graph, query, budget);
        debug!(
            station = %graph.station(),
            tier = ?assessment.tier,
            verdict = ?assessment.verdict,
            required = assessment.required_secs,
            window = assessment.window_secs,
            "transfer assessed"
        );
        assessment
    }

    fn evaluate_tiers(
        &self,
        graph: &WalkableGraph,
        query: &TransferQuery<'_>,
        budget: &SearchBudget,
    ) -> TransferAssessment {
        let window = query.window_secs;
        let (Some(arr), Some(dep)) = (query.arrival_platform, query.departure_platform) else {
            return self.fallback(window, UnreachableReason::EmptyAnchors);
        };

        if same_platform(arr, dep) {
            return TransferAssessment {
                verdict: classify(
                    self.policy.min_same_platform_secs,
                    window,
                    self.policy.safety_buffer_secs,
                    true,
                ),
                tier: Tier::SamePlatform,
                distance: None,
                required_secs: self.policy.min_same_platform_secs,
                window_secs: window,
                ways: Vec::new(),
                unreachable: None,
            };
        }

        let (Some(from), Some(to)) = (find_anchor(graph, arr), find_anchor(graph, dep)) else {
            return self.fallback(window, UnreachableReason::EmptyAnchors);
        };

        if adjoining(graph, &from, &to) {
            match shortest_path(graph, &from.nodes, &to.nodes, &EdgeFilter::buffer(), budget) {
                PathOutcome::Reachable(path) => {
                    let secs = self.policy.walk_secs(self.meters(graph, &path));
                    return self.from_path(graph, Tier::Adjoining, &path, secs, window);
                }
                PathOutcome::Unreachable(reason) => {
                    debug!(station = %graph.station(), ?reason, "adjoining search failed");
                }
            }
        }

        match shortest_path(graph, &from.nodes, &to.nodes, &EdgeFilter::All, budget) {
            PathOutcome::Reachable(path) => {
                let secs = self.weighted_secs(graph, &path);
                self.from_path(graph, Tier::Connector, &path, secs, window)
            }
            PathOutcome::Unreachable(reason) => self.fallback(window, reason),
        }
    }

    /// Walking time between two platforms of one station, if a path exists.
    pub fn walking_secs(
        &self,
        graph: &WalkableGraph,
        from_platform: &str,
        to_platform: &str,
        budget: &SearchBudget,
    ) -> Option<(i64, PathDistance)> {
        let from = find_anchor(graph, from_platform)?;
        let to = find_anchor(graph, to_platform)?;
        let path = shortest_path(graph, &from.nodes, &to.nodes, &EdgeFilter::All, budget);
        let path = path.path()?;
        let secs = self.weighted_secs(graph, path).round() as i64;
        Some((
            secs,
            PathDistance {
                value: path.distance,
                mode: path.mode,
            },
        ))
    }

    fn from_path(
        &self,
        graph: &WalkableGraph,
        tier: Tier,
        path: &FoundPath,
        secs: f64,
        window: i64,
    ) -> TransferAssessment {
        let required = secs.round() as i64;
        let mut ways: Vec<WayId> = Vec::new();
        for e in &path.edges {
            let way = graph.edge(*e).way;
            if ways.last() != Some(&way) {
                ways.push(way);
            }
        }
        TransferAssessment {
            verdict: classify(required, window, self.policy.safety_buffer_secs, false),
            tier,
            distance: Some(PathDistance {
                value: path.distance,
                mode: path.mode,
            }),
            required_secs: required,
            window_secs: window,
            ways,
            unreachable: None,
        }
    }

    fn fallback(&self, window: i64, reason: UnreachableReason) -> TransferAssessment {
        let distance = self.policy.fallback_distance_m;
        let required = self.policy.walk_secs(distance).round() as i64;
        TransferAssessment {
            verdict: classify(required, window, self.policy.safety_buffer_secs, false),
            tier: Tier::Fallback,
            distance: Some(PathDistance {
                value: distance,
                mode: DistanceMode::Meters,
            }),
            required_secs: required,
            window_secs: window,
            ways: Vec::new(),
            unreachable: Some(reason),
        }
    }

    /// Path length in meters. In hop mode only edges without a length
    /// count at the assumed hop length.
    fn meters(&self, graph: &WalkableGraph, path: &FoundPath) -> f64 {
        match path.mode {
            DistanceMode::Meters => path.distance,
            DistanceMode::Hops => path.edges.iter().map(|e| self.edge_meters(graph, *e)).sum(),
        }
    }

    fn edge_meters(&self, graph: &WalkableGraph, edge: EdgeIdx) -> f64 {
        graph
            .edge(edge)
            .length_m
            .unwrap_or(self.policy.hop_length_m)
    }

    /// Time along a path with per-class speed factors. Each contiguous run
    /// of elevator edges costs a fixed time regardless of length.
    fn weighted_secs(&self, graph: &WalkableGraph, path: &FoundPath) -> f64 {
        let mut secs = 0.0;
        let mut in_elevator = false;
        for e in &path.edges {
            let edge = graph.edge(*e);
            if edge.class == WayClass::Elevator {
                if !in_elevator {
                    secs += self.policy.elevator_secs;
                    in_elevator = true;
                }
                continue;
            }
            in_elevator = false;
            let meters = self.edge_meters(graph, *e);
            let speed = self.policy.walking_speed_mps * self.policy.speed_factor(edge.class);
            secs += meters / speed;
        }
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeId, StationId};
    use crate::feasibility::Verdict;
    use crate::graph::{GraphConfig, build_station_graph};
    use crate::snapshot::fixtures::{station, two_platform_station, way};
    use crate::snapshot::{PrecomputedSegments, SnapshotData, SnapshotIndex, SnapshotNode, WaySegment};

    /// Degrees of longitude per meter on the equator.
    const DEG_PER_M: f64 = 1.0 / 111_194.93;

    fn node(id: i64, meters_east: f64) -> SnapshotNode {
        SnapshotNode {
            id: NodeId(id),
            lat: 0.0,
            lon: meters_east * DEG_PER_M,
        }
    }

    fn seg(way: i64, from: i64, to: i64) -> WaySegment {
        WaySegment {
            way: WayId(way),
            from: NodeId(from),
            to: NodeId(to),
        }
    }

    fn build(data: SnapshotData, id: i64) -> WalkableGraph {
        let idx = SnapshotIndex::build(data).unwrap();
        build_station_graph(&idx, StationId(id), &GraphConfig::default())
    }

    /// Platform edges 1 and 2 joined by a 300 m corridor.
    fn corridor_data() -> SnapshotData {
        SnapshotData {
            version: Some(1),
            stations: vec![station(1, "Corridor", &[1, 2, 3])],
            ways: vec![
                way(1, &[1, 2], &[("railway", "platform_edge"), ("ref", "1")]),
                way(2, &[3, 4], &[("railway", "platform_edge"), ("ref", "2")]),
                way(3, &[2, 3], &[("highway", "corridor")]),
            ],
            nodes: vec![node(1, 0.0), node(2, 10.0), node(3, 310.0), node(4, 320.0)],
            segments: Vec::new(),
        }
    }

    fn corridor_station() -> WalkableGraph {
        build(corridor_data(), 1)
    }

    /// The corridor station with one more member footway `[from, 51]`,
    /// where node 51 has no coordinates.
    fn corridor_with_footway(from: i64) -> WalkableGraph {
        let mut data = corridor_data();
        data.stations = vec![station(1, "Corridor", &[1, 2, 3, 4])];
        data.ways.push(way(4, &[from, 51], &[("highway", "footway")]));
        if from == 50 {
            data.nodes.push(node(50, 1000.0));
        }
        build(data, 1)
    }

    fn query<'a>(arr: &'a str, dep: &'a str, window_secs: i64) -> TransferQuery<'a> {
        TransferQuery {
            arrival_platform: Some(arr),
            departure_platform: Some(dep),
            window_secs,
        }
    }

    fn eval(graph: &WalkableGraph, q: TransferQuery<'_>) -> TransferAssessment {
        FeasibilityEvaluator::default().evaluate(graph, &q, &SearchBudget::default())
    }

    #[test]
    fn same_platform_is_tier_one() {
        let g = WalkableGraph::empty(StationId(1));
        let a = eval(&g, query("7", "7", 180));
        assert_eq!(a.tier, Tier::SamePlatform);
        assert_eq!(a.verdict, Verdict::Feasible);
        assert_eq!(a.required_secs, 120);
        assert!(a.distance.is_none());
    }

    #[test]
    fn same_platform_below_dwell_is_infeasible() {
        let g = WalkableGraph::empty(StationId(1));
        let a = eval(&g, query("Gleis 7", "7", 100));
        assert_eq!(a.tier, Tier::SamePlatform);
        assert_eq!(a.verdict, Verdict::Infeasible);
    }

    #[test]
    fn connector_path_marginal() {
        let g = corridor_station();
        let a = eval(&g, query("1", "2", 240));
        assert_eq!(a.tier, Tier::Connector);
        assert_eq!(a.required_secs, 250);
        assert_eq!(a.verdict, Verdict::Marginal);
        let d = a.distance.unwrap();
        assert_eq!(d.mode, DistanceMode::Meters);
        assert!((d.value - 300.0).abs() < 0.5, "got {}", d.value);
        assert_eq!(a.ways, vec![WayId(3)]);
    }

    #[test]
    fn connector_path_feasible_with_room() {
        let g = corridor_station();
        let a = eval(&g, query("1", "2", 600));
        assert_eq!(a.verdict, Verdict::Feasible);
        let a = eval(&g, query("1", "2", 60));
        assert_eq!(a.verdict, Verdict::Infeasible);
    }

    #[test]
    fn island_platform_is_tier_two() {
        let g = build(
            SnapshotData {
                version: Some(1),
                stations: vec![station(1, "Island", &[11, 12, 13])],
                ways: vec![
                    way(11, &[1, 2], &[("railway", "platform_edge"), ("ref", "7")]),
                    way(12, &[3, 4], &[("railway", "platform_edge"), ("ref", "8")]),
                    way(13, &[1, 2, 4, 3, 1], &[("railway", "platform"), ("ref", "7;8")]),
                ],
                nodes: vec![
                    node(1, 0.0),
                    node(2, 100.0),
                    SnapshotNode { id: NodeId(3), lat: 10.0 * DEG_PER_M, lon: 0.0 },
                    SnapshotNode { id: NodeId(4), lat: 10.0 * DEG_PER_M, lon: 100.0 * DEG_PER_M },
                ],
                segments: Vec::new(),
            },
            1,
        );
        let a = eval(&g, query("7", "8", 300));
        assert_eq!(a.tier, Tier::Adjoining);
        assert_eq!(a.verdict, Verdict::Feasible);
        // 10 m across at 1.2 m/s
        assert!((a.required_secs - 8).abs() <= 1, "got {}", a.required_secs);
    }

    #[test]
    fn separate_way_without_coordinates_keeps_meters() {
        let g = corridor_with_footway(50);
        let a = eval(&g, query("1", "2", 60));
        assert_eq!(a.tier, Tier::Connector);
        assert_eq!(a.distance.unwrap().mode, DistanceMode::Meters);
        assert_eq!(a.required_secs, 250);
        assert_eq!(a.verdict, Verdict::Infeasible);
    }

    #[test]
    fn hop_mode_still_times_known_lengths() {
        // the footway hangs off platform 2, so the search counts hops
        let g = corridor_with_footway(4);
        let a = eval(&g, query("1", "2", 60));
        assert_eq!(a.tier, Tier::Connector);
        assert_eq!(a.distance.unwrap().mode, DistanceMode::Hops);
        assert_eq!(a.required_secs, 250);
        assert_eq!(a.verdict, Verdict::Infeasible);

        let eval = FeasibilityEvaluator::default();
        let (secs, _) = eval
            .walking_secs(&g, "1", "2", &SearchBudget::default())
            .unwrap();
        assert_eq!(secs, 250);
    }

    #[test]
    fn platforms_sharing_a_node_are_tier_two() {
        let g = build(
            SnapshotData {
                version: Some(1),
                stations: vec![station(1, "Split", &[11, 12])],
                ways: vec![
                    way(11, &[1, 2], &[("railway", "platform_edge"), ("ref", "3a")]),
                    way(12, &[2, 3], &[("railway", "platform_edge"), ("ref", "3b")]),
                ],
                nodes: vec![node(1, 0.0), node(2, 50.0), node(3, 100.0)],
                segments: Vec::new(),
            },
            1,
        );
        let a = eval(&g, query("3a", "3b", 60));
        assert_eq!(a.tier, Tier::Adjoining);
        assert_eq!(a.required_secs, 0);
        assert_eq!(a.verdict, Verdict::Feasible);
    }

    #[test]
    fn adjoining_without_buffer_path_uses_connector() {
        // The island outline 13 joins both platforms but its segments are
        // missing; only the stairs 2-5-4 connect them.
        let g = build(
            SnapshotData {
                version: Some(1),
                stations: vec![station(1, "Island", &[11, 12, 13, 14])],
                ways: vec![
                    way(11, &[1, 2], &[("railway", "platform_edge"), ("ref", "7")]),
                    way(12, &[3, 4], &[("railway", "platform_edge"), ("ref", "8")]),
                    way(13, &[1, 2, 4, 3, 1], &[("railway", "platform"), ("ref", "7;8")]),
                    way(14, &[2, 5, 4], &[("highway", "steps")]),
                ],
                nodes: vec![
                    node(1, 0.0),
                    node(2, 100.0),
                    SnapshotNode { id: NodeId(3), lat: 10.0 * DEG_PER_M, lon: 0.0 },
                    SnapshotNode { id: NodeId(4), lat: 10.0 * DEG_PER_M, lon: 100.0 * DEG_PER_M },
                    SnapshotNode { id: NodeId(5), lat: 5.0 * DEG_PER_M, lon: 100.0 * DEG_PER_M },
                ],
                segments: vec![PrecomputedSegments {
                    station: StationId(1),
                    segments: vec![
                        seg(11, 1, 2),
                        seg(12, 3, 4),
                        seg(14, 2, 5),
                        seg(14, 5, 4),
                    ],
                }],
            },
            1,
        );
        let from = find_anchor(&g, "7").unwrap();
        let to = find_anchor(&g, "8").unwrap();
        assert!(adjoining(&g, &from, &to));

        let a = eval(&g, query("7", "8", 300));
        assert_eq!(a.tier, Tier::Connector);
        assert_eq!(a.ways, vec![WayId(14)]);
        // 10 m of stairs at 0.6 m/s
        assert!((a.required_secs - 17).abs() <= 1, "got {}", a.required_secs);
    }

    #[test]
    fn disconnected_graph_falls_back_deterministically() {
        let mut data = two_platform_station();
        data.ways.retain(|w| w.id.get() != 300);
        let g = build(data, 100);
        let first = eval(&g, query("1", "2", 600));
        let second = eval(&g, query("1", "2", 600));
        assert_eq!(first, second);
        assert_eq!(first.tier, Tier::Fallback);
        assert_eq!(first.unreachable, Some(UnreachableReason::NoPath));
        assert_eq!(first.required_secs, 333);
        assert_eq!(first.verdict, Verdict::Feasible);
    }

    #[test]
    fn empty_graph_is_tier_four() {
        let g = WalkableGraph::empty(StationId(1));
        let a = eval(&g, query("1", "2", 600));
        assert_eq!(a.tier, Tier::Fallback);
        assert_eq!(a.unreachable, Some(UnreachableReason::EmptyAnchors));
    }

    #[test]
    fn unknown_platform_is_tier_four() {
        let g = corridor_station();
        let a = eval(&g, query("1", "99", 600));
        assert_eq!(a.tier, Tier::Fallback);

        let q = TransferQuery {
            arrival_platform: None,
            departure_platform: Some("2"),
            window_secs: 600,
        };
        assert_eq!(eval(&g, q).tier, Tier::Fallback);
    }

    #[test]
    fn exhausted_budget_falls_back() {
        let g = corridor_station();
        let budget = SearchBudget::new(1);
        let a = FeasibilityEvaluator::default().evaluate(&g, &query("1", "2", 600), &budget);
        assert_eq!(a.tier, Tier::Fallback);
        assert_eq!(a.unreachable, Some(UnreachableReason::BudgetExhausted));
    }

    #[test]
    fn negative_window_is_infeasible() {
        let g = corridor_station();
        assert_eq!(eval(&g, query("1", "2", -30)).verdict, Verdict::Infeasible);
        assert_eq!(eval(&g, query("1", "1", -30)).verdict, Verdict::Infeasible);
    }

    #[test]
    fn steps_and_elevator_runs() {
        // 1 -edge- 2 -steps 12 m- 3 -elevator- 4 -elevator- 5 -edge- 6
        let g = build(
            SnapshotData {
                version: Some(1),
                stations: vec![station(1, "Lift", &[1, 2, 3, 4, 5])],
                ways: vec![
                    way(1, &[1, 2], &[("railway", "platform_edge"), ("ref", "1")]),
                    way(2, &[2, 3], &[("highway", "steps")]),
                    way(3, &[3, 4], &[("highway", "elevator")]),
                    way(4, &[4, 5], &[("highway", "elevator")]),
                    way(5, &[5, 6], &[("railway", "platform_edge"), ("ref", "2")]),
                ],
                nodes: vec![
                    node(1, 0.0),
                    node(2, 10.0),
                    node(3, 22.0),
                    node(4, 23.0),
                    node(5, 24.0),
                    node(6, 34.0),
                ],
                segments: Vec::new(),
            },
            1,
        );
        let a = eval(&g, query("1", "2", 600));
        assert_eq!(a.tier, Tier::Connector);
        // 12 m of stairs at 0.6 m/s, then one elevator run
        assert_eq!(a.required_secs, 20 + 60);
        assert_eq!(a.ways, vec![WayId(2), WayId(3), WayId(4)]);
    }

    #[test]
    fn hop_counts_use_assumed_length() {
        let mut data = two_platform_station();
        data.nodes.retain(|n| n.id.get() != 10);
        let g = build(data, 100);
        let a = eval(&g, query("1", "2", 600));
        assert_eq!(a.tier, Tier::Connector);
        let d = a.distance.unwrap();
        assert_eq!(d.mode, DistanceMode::Hops);
        assert_eq!(d.value, 2.0);
        // two 10 m hops of stairs at 0.6 m/s
        assert_eq!(a.required_secs, 33);
    }

    #[test]
    fn walking_secs_between_platforms() {
        let g = corridor_station();
        let eval = FeasibilityEvaluator::default();
        let (secs, d) = eval
            .walking_secs(&g, "1", "2", &SearchBudget::default())
            .unwrap();
        assert_eq!(secs, 250);
        assert_eq!(d.mode, DistanceMode::Meters);
        assert!(eval.walking_secs(&g, "1", "5", &SearchBudget::default()).is_none());
    }
}
