//! # polynest-core
//!
//! Core types shared by the polynest nesting engine: configuration, the error
//! taxonomy, placement/solve results, and the [`Solver`] trait.
//!
//! The actual 2D engine (geometry kernel, NFP generation, placement, genetic
//! search) lives in the `polynest-d2` crate.

pub mod config;
pub mod error;
pub mod result;
pub mod solver;

pub use config::Config;
pub use error::{Error, Result};
pub use result::{PlaceResult, Placement, ProgressInfo, SolveResult};
pub use solver::{ProgressCallback, Solver};
