//! Way tag classification.
//!
//! All decisions that depend on OSM tags go through [`classify`] and
//! [`walkability`]. Callers match on the closed [`WayClass`] enum instead of
//! inspecting tag strings themselves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Raw OSM tags of a way.
pub type Tags = BTreeMap<String, String>;

/// `highway=*` values that people walk along.
const WALKABLE_HIGHWAYS: &[&str] = &[
    "footway",
    "steps",
    "corridor",
    "pedestrian",
    "path",
    "cycleway",
    "crossing",
    "elevator",
    "escalator",
    "platform",
    "service",
];

/// `railway=*` values that people walk along.
const WALKABLE_RAILWAYS: &[&str] = &["platform", "platform_edge"];

/// Closed classification of a way, derived from its tags.
///
/// Used for anchor detection, the Tier 2 edge filter and per-class walking
/// speed modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WayClass {
    /// The boundary way along a platform, adjacent to a track.
    PlatformEdge,
    /// A platform area or outline.
    Platform,
    /// A level crossing of tracks or a marked crossing.
    Crossing,
    /// An elevator.
    Elevator,
    /// An escalator or moving walkway.
    Escalator,
    /// Stairs.
    Steps,
    /// An indoor corridor or an underpass.
    Corridor,
    /// Footway, path or cycleway at ground level.
    Footway,
    /// A pedestrian street or square.
    Pedestrian,
    /// A service road.
    Service,
    /// Anything else (tracks, buildings, roads).
    Other,
}

impl WayClass {
    /// Classes that make up a platform itself.
    pub fn is_platform(self) -> bool {
        matches!(self, WayClass::Platform | WayClass::PlatformEdge)
    }

    /// Classes a passenger may use to cross between directly adjoining
    /// platforms.
    pub fn is_buffer(self) -> bool {
        matches!(
            self,
            WayClass::Platform | WayClass::PlatformEdge | WayClass::Crossing
        )
    }

    /// Connector infrastructure linking platforms that don't adjoin.
    pub fn is_connector(self) -> bool {
        matches!(
            self,
            WayClass::Elevator | WayClass::Escalator | WayClass::Steps | WayClass::Corridor
        )
    }
}

/// Outcome of the walkable check for a way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Walkability {
    /// The way can be walked.
    Walkable,
    /// The way has a walkable tag but `access=private`.
    Private,
    /// None of the walkable tags are present.
    NotWalkable,
}

fn tag<'a>(tags: &'a Tags, key: &str) -> Option<&'a str> {
    tags.get(key).map(|v| v.trim())
}

fn has_conveying(tags: &Tags) -> bool {
    tag(tags, "conveying").is_some_and(|v| !v.is_empty() && v != "no")
}

/// Decide whether a way belongs to the walkable network.
///
/// Walkable iff `highway` is one of the pedestrian values, or `railway` is
/// `platform`/`platform_edge`, or the way has a `conveying` attribute, and in
/// all cases `access` is not `private`.
pub fn walkability(tags: &Tags) -> Walkability {
    let by_highway = tag(tags, "highway").is_some_and(|h| WALKABLE_HIGHWAYS.contains(&h));
    let by_railway = tag(tags, "railway").is_some_and(|r| WALKABLE_RAILWAYS.contains(&r));

    if !(by_highway || by_railway || has_conveying(tags)) {
        return Walkability::NotWalkable;
    }
    if tag(tags, "access") == Some("private") {
        return Walkability::Private;
    }
    Walkability::Walkable
}

/// Classify a way by its tags.
pub fn classify(tags: &Tags) -> WayClass {
    let highway = tag(tags, "highway");
    let railway = tag(tags, "railway");

    if railway == Some("platform_edge") {
        return WayClass::PlatformEdge;
    }
    if railway == Some("platform")
        || highway == Some("platform")
        || tag(tags, "public_transport") == Some("platform")
    {
        return WayClass::Platform;
    }
    if highway == Some("elevator") {
        return WayClass::Elevator;
    }
    if highway == Some("escalator") || has_conveying(tags) {
        return WayClass::Escalator;
    }
    if highway == Some("steps") {
        return WayClass::Steps;
    }
    if highway == Some("crossing")
        || railway == Some("crossing")
        || tag(tags, "footway") == Some("crossing")
    {
        return WayClass::Crossing;
    }
    if highway == Some("corridor") {
        return WayClass::Corridor;
    }

    match highway {
        Some("footway" | "path" | "cycleway") => {
            let underground = tag(tags, "tunnel").is_some_and(|t| t != "no")
                || tag(tags, "indoor").is_some_and(|i| i == "yes" || i == "corridor");
            if underground {
                WayClass::Corridor
            } else {
                WayClass::Footway
            }
        }
        Some("pedestrian") => WayClass::Pedestrian,
        Some("service") => WayClass::Service,
        _ => WayClass::Other,
    }
}
