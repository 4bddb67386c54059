use crate::error::{MultipolygonError, Result};

/// Tuning knobs of the resolver.
///
/// All fields are public, the `with_*` helpers exist for chaining. A configuration is
/// checked once by [`ResolverConfig::validate`]; an invalid one is the only fatal error
/// of this crate.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolverConfig {
    /// Maximum length in metres of a synthetic closing segment. Negative values disable
    /// the limit so only self intersection prevents a close.
    pub max_close_dist: f64,
    /// Add the aggregate area of the relation to every outer polygon.
    pub compute_area_size: bool,
    /// Points of a ring closer than this (high precision units) to another ring's
    /// boundary are treated as lying on it.
    pub boundary_tolerance: f64,
    /// Margin (high precision units) around the tile used to clip large outer areas
    /// before holes are cut out.
    pub clip_margin: i32,
    /// Number of times one area may be requeued by the cutter before it is emitted as is.
    pub max_cut_depth: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_close_dist: -1.0,
            compute_area_size: false,
            boundary_tolerance: 4.0,
            clip_margin: 1 << 12,
            max_cut_depth: 256,
        }
    }
}

impl ResolverConfig {
    pub fn with_max_close_dist(mut self, meters: f64) -> Self {
        self.max_close_dist = meters;
        self
    }

    pub fn with_area_size(mut self, compute: bool) -> Self {
        self.compute_area_size = compute;
        self
    }

    pub fn with_boundary_tolerance(mut self, units: f64) -> Self {
        self.boundary_tolerance = units;
        self
    }

    pub fn with_clip_margin(mut self, units: i32) -> Self {
        self.clip_margin = units;
        self
    }

    pub fn with_max_cut_depth(mut self, depth: usize) -> Self {
        self.max_cut_depth = depth;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_close_dist.is_nan() {
            return Err(MultipolygonError::InvalidConfig("max_close_dist is NaN".into()));
        }
        if !self.boundary_tolerance.is_finite() || self.boundary_tolerance < 0.0 {
            return Err(MultipolygonError::InvalidConfig(format!(
                "boundary_tolerance must be a finite non-negative number, got {}",
                self.boundary_tolerance
            )));
        }
        if self.clip_margin < 0 {
            return Err(MultipolygonError::InvalidConfig(format!(
                "clip_margin must not be negative, got {}",
                self.clip_margin
            )));
        }
        if self.max_cut_depth == 0 {
            return Err(MultipolygonError::InvalidConfig("max_cut_depth must be at least 1".into()));
        }
        Ok(())
    }

    /// Is a closing segment of the given length allowed?
    pub fn allows_close(&self, distance_meters: f64) -> bool {
        self.max_close_dist < 0.0 || distance_meters < self.max_close_dist
    }
}
