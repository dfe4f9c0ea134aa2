//! Two-way seriation of a matrix, kept up to date as batches of rows arrive.
//!
//! Static phase: rows are seriated first, then the columns of the row-seriated
//! matrix. Dynamic phase: each batch row is appended to the row matrix and
//! folded into the row order by cheapest insertion; after every fold-in the
//! column axis is rebuilt from the transpose of the row matrix in arrival
//! order (not seriated order) and every column it has not placed yet is
//! folded in. Placed indices never move on either axis.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::axis::{AxisSeriation, Orientation};
use crate::config::{BiseriationConfig, RunMetadata};
use crate::storage::StorageResult;
use crate::storage::checkpoint::FileLog;
use crate::storage::metadata::save_metadata;
use crate::storage::text::{LabelledMatrix, read_sparse_matrix, write_sparse_matrix};

pub struct Biseriation {
    config: BiseriationConfig,
    rows: AxisSeriation,
    columns: AxisSeriation,
    /// One per row of the row matrix, in arrival order.
    labels: Vec<Option<String>>,
    labelled: bool,
    update_counter: usize,
    metadata: RunMetadata,
}

impl Biseriation {
    /// Load `{collection}.dat` and run the static phase.
    pub fn new(config: BiseriationConfig) -> StorageResult<Self> {
        config.validate()?;
        let input = read_sparse_matrix(config.input_path())?;
        Self::from_matrix(config, input)
    }

    /// Run the static phase over an in-memory matrix. Outputs still go to the
    /// files derived from `config.collection`.
    pub fn from_matrix(config: BiseriationConfig, input: LabelledMatrix) -> StorageResult<Self> {
        config.validate()?;
        let params = config.model_params();
        let mut metadata = RunMetadata::new(&config);
        let labelled = input.has_labels();
        if config.resume && !config.replays_checkpoints() {
            warn!(
                "{} heuristic keeps no placement log, starting over",
                config.heuristic
            );
        }

        info!(
            "Static phase over {:?}: {} rows, {} heuristic",
            config.collection,
            input.row_count(),
            config.heuristic
        );

        // rows
        let stem = config.collection.clone();
        let mut rows = AxisSeriation::new(
            input.matrix.clone(),
            Orientation::Rows,
            config.distance,
            &params,
            Box::new(FileLog::new(config.checkpoint_path(&stem))),
            config.replays_checkpoints(),
        )?;
        rows.generate(config.heuristic)?;
        let row_seriated = rows.materialize(&input);
        write_sparse_matrix(config.row_seriated_path(), &row_seriated)?;
        metadata.files.push(config.row_seriated_path());
        write_axis_files(&config, &rows, &stem, &mut metadata)?;

        // columns of the row-seriated matrix
        let stem = config.row_seriated_stem();
        let mut columns = AxisSeriation::new(
            row_seriated.matrix.clone(),
            Orientation::Columns,
            config.distance,
            &params,
            Box::new(FileLog::new(config.checkpoint_path(&stem))),
            config.replays_checkpoints(),
        )?;
        columns.generate(config.heuristic)?;
        let biseriated = columns.materialize(&row_seriated);
        write_sparse_matrix(config.biseriated_path(), &biseriated)?;
        metadata.files.push(config.biseriated_path());
        write_axis_files(&config, &columns, &stem, &mut metadata)?;

        metadata.n_rows = rows.n_instances();
        metadata.n_columns = columns.n_instances();
        save_metadata(&metadata, config.metadata_path())?;

        Ok(Self {
            config,
            rows,
            columns,
            labels: input.labels,
            labelled,
            update_counter: 0,
            metadata,
        })
    }

    /// Static phase followed by every configured batch file, in order.
    pub fn run(config: BiseriationConfig) -> StorageResult<Self> {
        let updates = config.updates.clone();
        let mut run = Self::new(config)?;
        for path in &updates {
            run.apply_update_file(path)?;
        }
        Ok(run)
    }

    pub fn apply_update_file(&mut self, path: impl AsRef<Path>) -> StorageResult<PathBuf> {
        let batch = read_sparse_matrix(path)?;
        self.apply_update(batch)
    }

    /// Fold a batch into both orders and write the rearranged matrix.
    ///
    /// Returns the path of `{collection}-biseriated-updated-{counter}.dat`.
    pub fn apply_update(&mut self, batch: LabelledMatrix) -> StorageResult<PathBuf> {
        let n_new = batch.row_count();
        info!(
            "Update after {} rows: folding in {} new rows",
            self.update_counter, n_new
        );

        self.rows.merge_updates(&batch.matrix)?;
        if self.labelled {
            self.labels.extend(batch.labels);
        } else {
            if batch.has_labels() {
                warn!("Dropping labels of a batch for an unlabelled matrix");
            }
            self.labels.extend(std::iter::repeat_n(None, n_new));
        }

        for _ in 0..n_new {
            let i = self.rows.fold_in_new_instance()?;
            self.columns
                .replace_matrix(self.rows.matrix().transpose())?;
            let mut inserted = 0;
            for j in 0..self.columns.n_instances() {
                if self.columns.update_order_insert(j) {
                    inserted += 1;
                }
            }
            debug!("Row {} folded in, {} new columns placed", i, inserted);
        }

        self.update_counter += n_new;
        let output = self.materialize();
        let path = self.config.updated_path(self.update_counter);
        write_sparse_matrix(&path, &output)?;

        self.metadata.files.push(path.clone());
        self.metadata.n_rows = self.rows.n_instances();
        self.metadata.n_columns = self.columns.n_instances();
        self.metadata.updates_applied += 1;
        save_metadata(&self.metadata, self.config.metadata_path())?;
        Ok(path)
    }

    /// The row matrix with rows and columns under their current orders.
    pub fn materialize(&self) -> LabelledMatrix {
        let source = LabelledMatrix {
            matrix: self.rows.matrix().clone(),
            labels: self.labels.clone(),
        };
        self.rows.materialize(&self.columns.materialize(&source))
    }

    pub fn config(&self) -> &BiseriationConfig {
        &self.config
    }

    pub fn rows(&self) -> &AxisSeriation {
        &self.rows
    }

    pub fn columns(&self) -> &AxisSeriation {
        &self.columns
    }

    pub fn labels(&self) -> &[Option<String>] {
        &self.labels
    }

    /// Rows ingested through updates so far.
    pub fn update_counter(&self) -> usize {
        self.update_counter
    }

    pub fn metadata(&self) -> &RunMetadata {
        &self.metadata
    }
}

/// Final order and, when configured, the scale of one axis.
fn write_axis_files(
    config: &BiseriationConfig,
    axis: &AxisSeriation,
    stem: &Path,
    metadata: &mut RunMetadata,
) -> StorageResult<()> {
    let order_path = config.order_path(stem);
    axis.write_order(&order_path)?;
    metadata.files.push(order_path);
    if config.write_scale {
        let scale_path = config.scale_path(stem);
        axis.write_scale(&scale_path)?;
        metadata.files.push(scale_path);
    }
    Ok(())
}
