//! # polynest-d2
//!
//! Irregular 2D nesting: packs arbitrary polygonal parts (with holes) into
//! polygonal bins using no-fit polygons, greedy bottom-left placement and an
//! elitist genetic search over insertion order and rotations.
//!
//! ## Features
//!
//! - Polygon geometry kernel with holes support
//! - NFP generation: orbiting/sliding, rectangle fast path, Minkowski
//!   difference via convex decomposition
//! - Per-generation NFP cache keyed by part pair and rotation buckets
//! - Multi-bin greedy placement with a gravity-weighted bounding box score
//! - Genetic search over part order and rotation angles
//! - Part and bin spacing applied through polygon offsetting
//!
//! ## Quick Start
//!
//! ```rust
//! use polynest_d2::{Config, Nester, Polygon, Solver};
//!
//! let bin = Polygon::rectangle(0, 500.0, 300.0).unwrap();
//! let parts = vec![
//!     Polygon::rectangle(0, 100.0, 50.0).unwrap(),
//!     Polygon::rectangle(1, 80.0, 80.0).unwrap(),
//! ];
//!
//! let config = Config::new()
//!     .with_rotations(4)
//!     .with_spacing(2.0)
//!     .with_seed(1)
//!     .with_max_generations(5);
//!
//! let mut nester = Nester::new(config).unwrap();
//! let result = nester.solve(&parts, &bin).unwrap();
//!
//! println!(
//!     "placed {} parts in {} bin(s), utilization {:.1}%",
//!     result.placements.len(),
//!     result.bins_used,
//!     result.utilization * 100.0
//! );
//! ```

pub mod cache;
pub mod clip;
pub mod ga;
pub mod geometry;
pub mod nester;
pub mod nfp;
pub mod placement;

pub use cache::{NfpCache, NfpKey};
pub use ga::{Ga, Phenotype};
pub use geometry::{Bounds, Point, Polygon};
pub use nester::Nester;
pub use nfp::Nfp;
pub use placement::place_paths;

pub use polynest_core::{
    Config, Error, PlaceResult, Placement, ProgressCallback, ProgressInfo, Result, SolveResult,
    Solver,
};
