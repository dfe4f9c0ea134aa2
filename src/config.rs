use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use biseriation_core::{CoreError, DistanceKind, ModelParams};

use crate::storage::{StorageError, StorageResult};

/// Construction heuristic for the initial static pass.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Heuristic {
    /// Nearest neighbor grown from a seed at both ends.
    #[default]
    LeftRight,
    /// Cheapest insertion in index order.
    Insert,
}

impl FromStr for Heuristic {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "left-right" | "leftright" | "nn" | "nearest-neighbor" => Ok(Heuristic::LeftRight),
            "insert" | "cheapest-insertion" => Ok(Heuristic::Insert),
            _ => Err(CoreError::Invalid(format!("unknown heuristic '{}'", s))),
        }
    }
}

impl fmt::Display for Heuristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Heuristic::LeftRight => f.write_str("left-right"),
            Heuristic::Insert => f.write_str("insert"),
        }
    }
}

/// Parameters of one biseriation run.
///
/// `collection` is a path stem: the input matrix is `{collection}.dat` and
/// every output file name is derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiseriationConfig {
    pub collection: PathBuf,
    pub distance: DistanceKind,
    pub heuristic: Heuristic,
    /// Batch files, applied in this order after the static pass.
    pub updates: Vec<PathBuf>,
    /// Replay checkpoint logs instead of starting over.
    pub resume: bool,
    pub n_bins: usize,
    pub write_scale: bool,
}

impl Default for BiseriationConfig {
    fn default() -> Self {
        Self {
            collection: PathBuf::new(),
            distance: DistanceKind::default(),
            heuristic: Heuristic::default(),
            updates: Vec::new(),
            resume: false,
            n_bins: ModelParams::default().n_bins,
            write_scale: false,
        }
    }
}

fn suffixed(stem: &Path, suffix: &str) -> PathBuf {
    let mut s: OsString = stem.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

impl BiseriationConfig {
    /// A trailing `.dat` on `collection` is dropped, so the input file itself
    /// may be passed.
    pub fn new(collection: impl Into<PathBuf>) -> Self {
        let mut collection = collection.into();
        if collection.extension().is_some_and(|ext| ext == "dat") {
            collection.set_extension("");
        }
        Self {
            collection,
            ..Default::default()
        }
    }

    pub fn with_distance(mut self, distance: DistanceKind) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristic = heuristic;
        self
    }

    pub fn with_updates(mut self, updates: Vec<PathBuf>) -> Self {
        self.updates = updates;
        self
    }

    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    pub fn with_bins(mut self, n_bins: usize) -> Self {
        self.n_bins = n_bins;
        self
    }

    pub fn with_scale(mut self, write_scale: bool) -> Self {
        self.write_scale = write_scale;
        self
    }

    pub fn validate(&self) -> StorageResult<()> {
        if self.collection.as_os_str().is_empty() {
            return Err(StorageError::Invalid("collection is not set".into()));
        }
        if self.distance == DistanceKind::MutualInformation && self.n_bins < 2 {
            return Err(StorageError::Invalid(format!(
                "mutual information needs at least 2 bins, got {}",
                self.n_bins
            )));
        }
        Ok(())
    }

    /// Placement logs only record the nearest-neighbor construction.
    pub fn replays_checkpoints(&self) -> bool {
        self.resume && self.heuristic == Heuristic::LeftRight
    }

    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            n_bins: self.n_bins,
        }
    }

    /// Stem of the row-seriated matrix, which the column axis works on.
    pub fn row_seriated_stem(&self) -> PathBuf {
        suffixed(&self.collection, "-row-seriated")
    }

    pub fn input_path(&self) -> PathBuf {
        suffixed(&self.collection, ".dat")
    }

    pub fn row_seriated_path(&self) -> PathBuf {
        suffixed(&self.collection, "-row-seriated.dat")
    }

    pub fn biseriated_path(&self) -> PathBuf {
        suffixed(&self.collection, "-biseriated.dat")
    }

    pub fn updated_path(&self, counter: usize) -> PathBuf {
        suffixed(
            &self.collection,
            &format!("-biseriated-updated-{}.dat", counter),
        )
    }

    pub fn metadata_path(&self) -> PathBuf {
        suffixed(&self.collection, "_metadata.json")
    }

    /// `{stem}_{tag}_order-tmp.txt`, the placement log of the axis seriating `stem`.
    pub fn checkpoint_path(&self, stem: &Path) -> PathBuf {
        suffixed(stem, &format!("_{}_order-tmp.txt", self.distance.tag()))
    }

    pub fn order_path(&self, stem: &Path) -> PathBuf {
        suffixed(stem, &format!("_{}_order.txt", self.distance.tag()))
    }

    pub fn scale_path(&self, stem: &Path) -> PathBuf {
        suffixed(stem, &format!("_{}_scale.dat", self.distance.tag()))
    }
}

/// Summary of a run, saved as JSON next to the outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub name: String,
    /// RFC 3339, UTC.
    pub created_at: String,
    pub config: BiseriationConfig,
    pub n_rows: usize,
    pub n_columns: usize,
    pub updates_applied: usize,
    pub files: Vec<PathBuf>,
}

impl RunMetadata {
    pub fn new(config: &BiseriationConfig) -> Self {
        let name = config
            .collection
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            created_at: chrono::Utc::now().to_rfc3339(),
            config: config.clone(),
            n_rows: 0,
            n_columns: 0,
            updates_applied: 0,
            files: Vec::new(),
        }
    }
}
