//! Placement and solve result types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single placed part: where one part instance ended up.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Placement {
    /// Id of the placed part.
    pub part_id: usize,
    /// Translation applied to the rotated part.
    pub x: f64,
    /// Translation applied to the rotated part.
    pub y: f64,
    /// Rotation in degrees applied before translation.
    pub rotation: f64,
    /// Index of the bin instance this part landed in.
    pub bin_index: usize,
}

impl Placement {
    pub fn new(part_id: usize, x: f64, y: f64, rotation: f64, bin_index: usize) -> Self {
        Self {
            part_id,
            x,
            y,
            rotation,
            bin_index,
        }
    }
}

/// Outcome of placing one phenotype: per-bin placements, the parts that never
/// found a position, and the fitness score (lower is better).
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaceResult {
    /// Placements grouped per bin, in bin-open order.
    pub bins: Vec<Vec<Placement>>,
    /// Ids of parts that could not be placed in any bin.
    pub unplaced: Vec<usize>,
    /// Fitness: +1 per bin opened, + bounding metric per pass, +2 per
    /// unplaced part.
    pub fitness: f64,
}

impl PlaceResult {
    /// Returns true if every part was placed.
    pub fn all_placed(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Total number of placed part instances across bins.
    pub fn placed_count(&self) -> usize {
        self.bins.iter().map(Vec::len).sum()
    }

    /// Flattens per-bin placements into a single list.
    pub fn flatten(&self) -> Vec<Placement> {
        self.bins.iter().flatten().cloned().collect()
    }
}

/// Final result of a solve run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolveResult {
    /// Placements for all successfully placed part instances.
    pub placements: Vec<Placement>,

    /// Number of bin instances used.
    pub bins_used: usize,

    /// Placed part area divided by the total area of used bins (0.0 - 1.0).
    pub utilization: f64,

    /// Ids of parts that could not be placed.
    pub unplaced: Vec<usize>,

    /// Computation time in milliseconds.
    pub computation_time_ms: u64,

    /// Number of GA generations evaluated.
    pub generations: u32,

    /// Best fitness achieved (lower is better).
    pub best_fitness: f64,

    /// Best fitness per generation, for analysis.
    pub fitness_history: Vec<f64>,

    /// Whether the solve was cancelled before its stop condition.
    pub cancelled: bool,
}

impl SolveResult {
    pub fn new() -> Self {
        Self {
            placements: Vec::new(),
            bins_used: 0,
            utilization: 0.0,
            unplaced: Vec::new(),
            computation_time_ms: 0,
            generations: 0,
            best_fitness: f64::INFINITY,
            fitness_history: Vec::new(),
            cancelled: false,
        }
    }

    /// Returns true if all parts were placed.
    pub fn all_placed(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Utilization as a percentage string.
    pub fn utilization_percent(&self) -> String {
        format!("{:.1}%", self.utilization * 100.0)
    }
}

impl Default for SolveResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress snapshot passed to progress callbacks once per generation.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Generation just evaluated (0-based).
    pub generation: u32,
    /// Best fitness so far (lower is better).
    pub best_fitness: f64,
    /// Utilization of the best-so-far layout.
    pub utilization: f64,
    /// Elapsed wall-clock milliseconds.
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_result_counts() {
        let mut result = PlaceResult::default();
        result.bins.push(vec![
            Placement::new(0, 0.0, 0.0, 0.0, 0),
            Placement::new(1, 5.0, 0.0, 90.0, 0),
        ]);
        result.bins.push(vec![Placement::new(2, 0.0, 0.0, 0.0, 1)]);
        result.unplaced.push(3);

        assert_eq!(result.placed_count(), 3);
        assert!(!result.all_placed());
        assert_eq!(result.flatten().len(), 3);
    }

    #[test]
    fn test_solve_result_defaults() {
        let result = SolveResult::new();
        assert!(result.all_placed());
        assert_eq!(result.bins_used, 0);
        assert!(result.best_fitness.is_infinite());
        assert_eq!(result.utilization_percent(), "0.0%");
    }
}
