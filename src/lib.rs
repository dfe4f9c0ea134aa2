//! # biseriation
//!
//! Incremental two-way seriation of sparse matrices: rows are reordered so
//! that similar rows sit next to each other, then columns, and both orders
//! are extended in place as new rows arrive.
//!
//! ```no_run
//! use biseriation::{Biseriation, BiseriationConfig, DistanceKind, Heuristic};
//!
//! let config = BiseriationConfig::new("data/collection")
//!     .with_distance(DistanceKind::Manhattan)
//!     .with_heuristic(Heuristic::LeftRight);
//! let mut run = Biseriation::new(config)?;
//! run.apply_update_file("data/batch-1.dat")?;
//! # Ok::<(), biseriation::storage::StorageError>(())
//! ```
//!
//! The sparse arithmetic, distance models and order engine live in
//! `biseriation-core`; this crate adds the file formats, the per-axis wrapper
//! and the static/dynamic coordinator.

pub mod axis;
pub mod biseriation;
pub mod config;
pub mod storage;

#[cfg(test)]
mod tests;

pub use axis::{AxisSeriation, Orientation};
pub use biseriation::Biseriation;
pub use config::{BiseriationConfig, Heuristic, RunMetadata};
pub use storage::text::LabelledMatrix;
pub use storage::{StorageError, StorageResult};

pub use biseriation_core::{
    DistanceKind, DistanceModel, LinearOrder, Metric, ModelParams, Placement, PlacementLog,
    SparseMatrix, SparseVector,
};
