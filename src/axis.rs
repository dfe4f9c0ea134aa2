//! Seriation of one axis of a matrix.
//!
//! The order engine only ever orders rows. Columns are seriated by working on
//! the transpose, and results are transposed back before they are written, so
//! callers always see matrices in their original orientation.

use std::path::Path;

use log::{debug, info};

use biseriation_core::{
    DistanceKind, DistanceModel, LinearOrder, LogProgress, ModelParams, PlacementLog,
    SparseMatrix,
};

use crate::config::Heuristic;
use crate::storage::text::{LabelledMatrix, write_f64_list, write_index_list};
use crate::storage::{StorageError, StorageResult};

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Orientation {
    Rows,
    Columns,
}

/// 1 when the smallest column index in use is positive.
fn index_offset(matrix: &SparseMatrix) -> usize {
    match matrix.min_column_index() {
        Some(min) if min > 0 => 1,
        _ => 0,
    }
}

pub struct AxisSeriation {
    orientation: Orientation,
    /// Column index of instance 0 in the original orientation.
    offset: usize,
    model: Box<dyn DistanceModel>,
    order: LinearOrder,
    log: Box<dyn PlacementLog>,
}

impl AxisSeriation {
    /// Bind a distance model to `matrix` seen along `orientation`.
    ///
    /// With `resume` the order is rebuilt from `log`; otherwise the log is reset.
    pub fn new(
        matrix: SparseMatrix,
        orientation: Orientation,
        distance: DistanceKind,
        params: &ModelParams,
        mut log: Box<dyn PlacementLog>,
        resume: bool,
    ) -> StorageResult<Self> {
        let (working, offset) = match orientation {
            Orientation::Rows => (matrix, 0),
            Orientation::Columns => (matrix.transpose(), index_offset(&matrix)),
        };
        let n_instances = working.row_count();
        let eligible: Vec<usize> = working.iter_present().map(|(i, _)| i).collect();
        if eligible.len() < n_instances {
            debug!(
                "{:?}: {} absent instances left out of the nearest-neighbor search",
                orientation,
                n_instances - eligible.len()
            );
        }

        let model = distance.build(working, params)?;
        let mut order = LinearOrder::with_eligible(n_instances, eligible);
        if resume {
            let events = log.replay()?;
            order.replay(&events)?;
            info!(
                "{:?}: resumed {} of {} placements",
                orientation,
                order.len(),
                n_instances
            );
        } else {
            log.reset()?;
        }

        info!(
            "{:?} axis: {} instances, {} dimensions, {} distance",
            orientation,
            n_instances,
            model.n_dimensions(),
            distance
        );
        Ok(Self {
            orientation,
            offset,
            model,
            order,
            log,
        })
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn order(&self) -> &[usize] {
        self.order.order()
    }

    pub fn linear_order(&self) -> &LinearOrder {
        &self.order
    }

    pub fn model(&self) -> &dyn DistanceModel {
        self.model.as_ref()
    }

    /// The matrix the engine orders, in working orientation.
    pub fn matrix(&self) -> &SparseMatrix {
        self.model.matrix()
    }

    pub fn n_instances(&self) -> usize {
        self.order.n_instances()
    }

    pub fn n_dimensions(&self) -> usize {
        self.model.n_dimensions()
    }

    /// Run a construction heuristic over every unplaced instance.
    pub fn generate(&mut self, heuristic: Heuristic) -> StorageResult<()> {
        let baseline = self.order.sum_of_distances(self.model.as_ref());
        let mut progress = LogProgress::default();
        match heuristic {
            Heuristic::LeftRight => self.order.generate_left_right(
                self.model.as_ref(),
                self.log.as_mut(),
                &mut progress,
            )?,
            Heuristic::Insert => self
                .order
                .generate_insert(self.model.as_ref(), &mut progress),
        }
        info!(
            "{:?}: {} order over {} instances, path length {:.6} (unordered {:.6})",
            self.orientation,
            heuristic,
            self.order.len(),
            self.order.sum_of_distances(self.model.as_ref()),
            baseline
        );
        Ok(())
    }

    /// Append rows to the working matrix. The order is untouched.
    pub fn merge_updates(&mut self, rows: &SparseMatrix) -> StorageResult<()> {
        self.model.append_rows(rows)?;
        debug!(
            "{:?}: merged {} rows, {} in total",
            self.orientation,
            rows.row_count(),
            self.model.n_instances()
        );
        Ok(())
    }

    /// Place the next merged but not yet counted instance at its cheapest slot.
    pub fn fold_in_new_instance(&mut self) -> StorageResult<usize> {
        if self.order.n_instances() >= self.model.n_instances() {
            return Err(StorageError::Invalid(format!(
                "{:?}: no merged instance left to fold in ({} instances)",
                self.orientation,
                self.order.n_instances()
            )));
        }
        Ok(self.order.fold_in_next(self.model.as_ref()))
    }

    /// Insert instance `i` at its cheapest slot unless it is already placed.
    pub fn update_order_insert(&mut self, i: usize) -> bool {
        self.order.update_insert(i, self.model.as_ref())
    }

    /// Swap the working matrix. New instances join the unplaced set.
    pub fn replace_matrix(&mut self, matrix: SparseMatrix) -> StorageResult<()> {
        self.model.set_matrix(matrix)?;
        self.order.grow_to(self.model.n_instances());
        debug!(
            "{:?}: working matrix replaced, {} instances, {} dimensions",
            self.orientation,
            self.order.n_instances(),
            self.model.n_dimensions()
        );
        Ok(())
    }

    /// Working matrix with its rows permuted by this axis' order.
    pub fn rearranged(&self) -> SparseMatrix {
        self.model.matrix().rearrange_rows(self.order.order())
    }

    /// Permute `source`, given in original orientation, along this axis.
    ///
    /// Rows keep their labels. For the column axis the result keeps every row
    /// of `source` and its columns are renumbered by position, from 1 when
    /// `source` is one-indexed.
    pub fn materialize(&self, source: &LabelledMatrix) -> LabelledMatrix {
        match self.orientation {
            Orientation::Rows => source.rearranged(self.order.order()),
            Orientation::Columns => {
                let permuted = source
                    .matrix
                    .transpose()
                    .rearrange_rows(self.order.order())
                    .transpose_zero_indexed()
                    .shift_columns(self.offset);
                let rows = (0..source.row_count())
                    .map(|i| {
                        source
                            .matrix
                            .is_present(i)
                            .then(|| permuted.row(i).cloned().unwrap_or_default())
                    })
                    .collect();
                LabelledMatrix {
                    matrix: SparseMatrix::new(rows),
                    labels: source.labels.clone(),
                }
            }
        }
    }

    pub fn write_order(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        write_index_list(path, self.order.order())
    }

    pub fn write_scale(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        write_f64_list(path, &self.order.scale(self.model.as_ref()))
    }

    /// Distances between neighbors along the order, for external histograms.
    pub fn write_consecutive_distances(&self, path: impl AsRef<Path>) -> StorageResult<()> {
        write_f64_list(path, &self.order.consecutive_distances(self.model.as_ref()))
    }
}
