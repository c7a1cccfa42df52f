//! Graph build configuration.

/// Default number of expansion hops beyond relation members.
pub const DEFAULT_EXPANSION_HOPS: u8 = 1;

/// Configuration for building station graphs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphConfig {
    /// How many rounds of adjoining walkable ways to add around the
    /// relation's member ways. Zero means members only.
    pub expansion_hops: u8,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            expansion_hops: DEFAULT_EXPANSION_HOPS,
        }
    }
}

impl GraphConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of expansion hops.
    pub fn with_expansion_hops(mut self, hops: u8) -> Self {
        self.expansion_hops = hops;
        self
    }
}
