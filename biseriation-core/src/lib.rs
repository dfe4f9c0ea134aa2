//! Seriation engine: sparse arithmetic, distance models and the greedy
//! linear-order heuristics.
//!
//! Data flows bottom-up: [`sparse`] arithmetic backs every [`distance`] model,
//! the models answer `distance(i, j)` for the [`order`] engine, and the engine
//! records nearest-neighbor placements in a [`checkpoint`] log.

pub mod checkpoint;
pub mod distance;
pub mod error;
pub mod order;
pub mod progress;
pub mod sparse;


pub use checkpoint::{MemoryLog, NoLog, Placement, PlacementLog};
pub use distance::{DistanceKind, DistanceModel, ModelParams, REGISTRY};
pub use error::{CoreError, CoreResult};
pub use order::{LinearOrder, Metric};
pub use progress::{LogProgress, NoProgress, ProgressReporter};
pub use sparse::{SparseMatrix, SparseVector};

#[cfg(test)]
pub(crate) fn init() {
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("debug");
        let _ = env_logger::Builder::from_env(env).is_test(true).try_init();
    });
}
