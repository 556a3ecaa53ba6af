//! Exact and heuristic three-dimensional bin-packing.
//!
//! Packs a list of boxes into the fewest possible identical `W x H x D`
//! bins. [`pack::binpack3d`] is the library's entry point; everything else
//! is organized the way the algorithm itself is: lower bounds, single-bin
//! feasibility (small-case tests, a constraint-propagation engine, and a
//! corner-point filler), two initial heuristics, and an outer exact
//! branch-and-bound that the heuristics seed an incumbent for.

pub mod bounds;
pub mod budget;
pub mod close;
pub mod corner_fill;
pub mod cp_engine;
pub mod error;
pub mod geometry;
pub mod heuristics;
pub mod pack;
pub mod relation;
pub mod render;
pub mod search;
pub mod small_cases;

pub use error::PackError;
pub use pack::{binpack3d, BoxSpec, PlacedBox, SolveLimits, SolveOutcome, UsageStats};
