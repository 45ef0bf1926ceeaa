//! Solver configuration.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for the nesting solver.
///
/// All options have sensible defaults; use builder methods to adjust:
///
/// ```
/// use polynest_core::Config;
///
/// let config = Config::new()
///     .with_spacing(2.0)
///     .with_rotations(4)
///     .with_population_size(20);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Scale factor for the integer coordinate space used by boolean ops.
    pub clipper_scale: f64,

    /// Tolerance used when cleaning offset/boolean results.
    pub curve_tolerance: f64,

    /// Part-to-part clearance. Each part is inflated by half this amount.
    pub spacing: f64,

    /// Part-to-bin clearance. `None` means "same as `spacing`".
    pub bin_spacing: Option<f64>,

    /// Number of discrete rotation buckets (angles are multiples of
    /// `360 / rotations` degrees). At most 16, the capacity of the NFP
    /// cache key's rotation fields.
    pub rotations: u32,

    /// GA population size.
    pub population_size: usize,

    /// GA mutation rate in percent (0-100). Applied per gene index.
    pub mutation_rate: u32,

    /// Allow placing parts inside holes of other parts.
    pub use_holes: bool,

    /// Use the full orbiting search on concave outer pairs instead of the
    /// Minkowski fast path. Slower, can find multiple NFP loops.
    pub explore_concave: bool,

    /// Maximum number of GA generations. `None` defers to the time limit,
    /// or to the solver's default generation count when no limit is set.
    pub max_generations: Option<u32>,

    /// Wall-clock time limit in milliseconds.
    pub time_limit_ms: Option<u64>,

    /// RNG seed for reproducible runs. `None` seeds from entropy.
    pub seed: Option<u64>,

    /// Number of worker threads for NFP computation and phenotype evaluation.
    /// `0` uses the rayon default.
    pub threads: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            clipper_scale: 10_000_000.0,
            curve_tolerance: 0.3,
            spacing: 0.0,
            bin_spacing: None,
            rotations: 4,
            population_size: 10,
            mutation_rate: 10,
            use_holes: false,
            explore_concave: false,
            max_generations: None,
            time_limit_ms: None,
            seed: None,
            threads: 0,
        }
    }
}

impl Config {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the boolean-op coordinate scale.
    pub fn with_clipper_scale(mut self, scale: f64) -> Self {
        self.clipper_scale = scale;
        self
    }

    /// Sets the curve tolerance for offset/boolean cleaning.
    pub fn with_curve_tolerance(mut self, tolerance: f64) -> Self {
        self.curve_tolerance = tolerance;
        self
    }

    /// Sets the part-to-part clearance.
    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    /// Sets the part-to-bin clearance.
    pub fn with_bin_spacing(mut self, bin_spacing: f64) -> Self {
        self.bin_spacing = Some(bin_spacing);
        self
    }

    /// Sets the number of rotation buckets.
    pub fn with_rotations(mut self, rotations: u32) -> Self {
        self.rotations = rotations;
        self
    }

    /// Sets the GA population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Sets the GA mutation rate (percent, 0-100).
    pub fn with_mutation_rate(mut self, rate: u32) -> Self {
        self.mutation_rate = rate;
        self
    }

    /// Enables placing parts inside holes of other parts.
    pub fn with_use_holes(mut self, use_holes: bool) -> Self {
        self.use_holes = use_holes;
        self
    }

    /// Enables the full orbiting search for concave outer pairs.
    pub fn with_explore_concave(mut self, explore: bool) -> Self {
        self.explore_concave = explore;
        self
    }

    /// Sets the maximum number of generations.
    pub fn with_max_generations(mut self, generations: u32) -> Self {
        self.max_generations = Some(generations);
        self
    }

    /// Sets the wall-clock time limit in milliseconds.
    pub fn with_time_limit_ms(mut self, millis: u64) -> Self {
        self.time_limit_ms = Some(millis);
        self
    }

    /// Sets the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the worker thread count (0 = rayon default).
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Effective part-to-bin clearance.
    pub fn effective_bin_spacing(&self) -> f64 {
        self.bin_spacing.unwrap_or(self.spacing)
    }

    /// Validates the configuration, failing fast before any optimization.
    pub fn validate(&self) -> Result<()> {
        if self.clipper_scale <= 0.0 || !self.clipper_scale.is_finite() {
            return Err(Error::ConfigError(format!(
                "clipper_scale must be positive and finite, got {}",
                self.clipper_scale
            )));
        }
        if self.curve_tolerance <= 0.0 || !self.curve_tolerance.is_finite() {
            return Err(Error::ConfigError(format!(
                "curve_tolerance must be positive and finite, got {}",
                self.curve_tolerance
            )));
        }
        if self.spacing < 0.0 {
            return Err(Error::ConfigError(format!(
                "spacing must be non-negative, got {}",
                self.spacing
            )));
        }
        if let Some(bin_spacing) = self.bin_spacing {
            if bin_spacing < 0.0 {
                return Err(Error::ConfigError(format!(
                    "bin_spacing must be non-negative, got {bin_spacing}"
                )));
            }
        }
        if self.rotations == 0 || self.rotations > 16 {
            return Err(Error::ConfigError(format!(
                "rotations must be in 1..=16, got {}",
                self.rotations
            )));
        }
        if self.population_size < 2 {
            return Err(Error::ConfigError(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            )));
        }
        if self.mutation_rate > 100 {
            return Err(Error::ConfigError(format!(
                "mutation_rate must be in 0..=100, got {}",
                self.mutation_rate
            )));
        }
        Ok(())
    }
}
