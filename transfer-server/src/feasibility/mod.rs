//! Transfer feasibility.
//!
//! Decides whether a passenger can get from an arrival platform to a
//! departure platform within the time between two trains, using the
//! station's walking graph where one is available.

mod anchors;
mod evaluator;
mod policy;
mod verdict;

pub use anchors::{PlatformAnchor, adjoining, find_anchor, normalize_platform, same_platform};
pub use evaluator::{FeasibilityEvaluator, TransferQuery};
pub use policy::TransferPolicy;
pub use verdict::{PathDistance, Tier, TransferAssessment, Verdict, classify};
