//! Solver trait and progress reporting.

use crate::error::Result;
use crate::result::{ProgressInfo, SolveResult};

/// Callback invoked once per evaluated generation.
pub type ProgressCallback = Box<dyn Fn(ProgressInfo) + Send + Sync>;

/// Common interface for nesting solvers.
///
/// A solver owns its configuration; parts and the bin are supplied per solve.
/// Implementations must honour `cancel()` between phenotype evaluations and
/// report the best-so-far layout when stopped early.
pub trait Solver {
    /// The part representation consumed by this solver.
    type Part;
    /// The bin/container representation.
    type Bin;

    /// Runs the solve to its stop condition (generation or time limit, or
    /// cancellation).
    fn solve(&mut self, parts: &[Self::Part], bin: &Self::Bin) -> Result<SolveResult> {
        self.solve_with_progress(parts, bin, None)
    }

    /// Runs the solve, invoking `progress` after each generation.
    fn solve_with_progress(
        &mut self,
        parts: &[Self::Part],
        bin: &Self::Bin,
        progress: Option<ProgressCallback>,
    ) -> Result<SolveResult>;

    /// Requests cancellation. Safe to call from another thread; the running
    /// solve stops at the next cancellation check (between phenotype
    /// evaluations or at a generation boundary) and returns its best result
    /// with the cancelled flag set, or `Error::Cancelled` when nothing was
    /// evaluated yet.
    fn cancel(&self);
}
