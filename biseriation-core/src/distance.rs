// biseriation-core/src/distance.rs
//! Distance models over the rows of a sparse matrix.
//!
//! Implements:
//! - Euclidean distance `sqrt(dot(x - y, x - y))`
//! - Manhattan distance `sumAbsolute(x - y)`
//! - Correlation distance `1 - |pearson(x, y)|` over `n` dense dimensions
//! - Variation of information `2·H(x, y) - H(x) - H(y)` over binned values
//!
//! Every model owns its matrix and answers `distance(i, j)` for row indices,
//! which is the [`Metric`] capability the order engine consumes. Models are
//! looked up by name in [`REGISTRY`] and built uniformly from a matrix.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::order::Metric;
use crate::sparse::{SparseMatrix, SparseVector};

/// A distance model bound to one matrix.
pub trait DistanceModel: Metric {
    fn kind(&self) -> DistanceKind;

    /// The matrix as loaded, before any model-specific preparation.
    fn matrix(&self) -> &SparseMatrix;

    fn n_dimensions(&self) -> usize;

    fn set_matrix(&mut self, matrix: SparseMatrix) -> CoreResult<()>;

    fn append_rows(&mut self, rows: &SparseMatrix) -> CoreResult<()>;

    fn n_instances(&self) -> usize {
        self.matrix().row_count()
    }
}

/// Parameters shared by all model constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelParams {
    /// Number of quantization bins (mutual information only).
    pub n_bins: usize,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self { n_bins: 100 }
    }
}

pub type ModelConstructor = fn(SparseMatrix, &ModelParams) -> CoreResult<Box<dyn DistanceModel>>;

#[derive(Debug, Clone, Copy)]
pub struct ModelEntry {
    pub kind: DistanceKind,
    /// Canonical lowercase name.
    pub name: &'static str,
    /// Short tag used in output file names.
    pub tag: &'static str,
    pub build: ModelConstructor,
}

pub static REGISTRY: [ModelEntry; 4] = [
    ModelEntry {
        kind: DistanceKind::Euclidean,
        name: "euclidean",
        tag: "eucl",
        build: build_euclidean,
    },
    ModelEntry {
        kind: DistanceKind::Manhattan,
        name: "manhattan",
        tag: "manh",
        build: build_manhattan,
    },
    ModelEntry {
        kind: DistanceKind::Correlation,
        name: "correlation",
        tag: "corr",
        build: build_correlation,
    },
    ModelEntry {
        kind: DistanceKind::MutualInformation,
        name: "mutualinformation",
        tag: "muti",
        build: build_mutual_information,
    },
];

fn build_euclidean(m: SparseMatrix, _: &ModelParams) -> CoreResult<Box<dyn DistanceModel>> {
    Ok(Box::new(Euclidean::new(m)))
}

fn build_manhattan(m: SparseMatrix, _: &ModelParams) -> CoreResult<Box<dyn DistanceModel>> {
    Ok(Box::new(Manhattan::new(m)))
}

fn build_correlation(m: SparseMatrix, _: &ModelParams) -> CoreResult<Box<dyn DistanceModel>> {
    Ok(Box::new(Correlation::new(m)))
}

fn build_mutual_information(
    m: SparseMatrix,
    params: &ModelParams,
) -> CoreResult<Box<dyn DistanceModel>> {
    Ok(Box::new(MutualInformation::new(m, params.n_bins)?))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceKind {
    #[default]
    Euclidean,
    Manhattan,
    Correlation,
    MutualInformation,
}

impl DistanceKind {
    pub fn entry(self) -> &'static ModelEntry {
        match self {
            DistanceKind::Euclidean => &REGISTRY[0],
            DistanceKind::Manhattan => &REGISTRY[1],
            DistanceKind::Correlation => &REGISTRY[2],
            DistanceKind::MutualInformation => &REGISTRY[3],
        }
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }

    pub fn tag(self) -> &'static str {
        self.entry().tag
    }

    pub fn build(
        self,
        matrix: SparseMatrix,
        params: &ModelParams,
    ) -> CoreResult<Box<dyn DistanceModel>> {
        debug!(
            "Building {} model over {} rows",
            self.name(),
            matrix.row_count()
        );
        (self.entry().build)(matrix, params)
    }
}

impl FromStr for DistanceKind {
    type Err = CoreError;

    /// Accepts canonical names, tags, and `mi`; case, `-` and `_` are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        if key == "mi" {
            return Ok(DistanceKind::MutualInformation);
        }
        REGISTRY
            .iter()
            .find(|e| e.name == key || e.tag == key)
            .map(|e| e.kind)
            .ok_or_else(|| CoreError::Invalid(format!("unknown distance model '{}'", s)))
    }
}

impl fmt::Display for DistanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone)]
pub struct Euclidean {
    matrix: SparseMatrix,
    n_dimensions: usize,
}

impl Euclidean {
    pub fn new(matrix: SparseMatrix) -> Self {
        let n_dimensions = matrix.dimension_count();
        Self {
            matrix,
            n_dimensions,
        }
    }
}

impl Metric for Euclidean {
    /// 0 when either row is absent.
    fn distance(&self, x: usize, y: usize) -> f64 {
        match (self.matrix.row(x), self.matrix.row(y)) {
            (Some(a), Some(b)) => a.sub(b).norm(),
            _ => 0.0,
        }
    }
}

impl DistanceModel for Euclidean {
    fn kind(&self) -> DistanceKind {
        DistanceKind::Euclidean
    }

    fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    fn n_dimensions(&self) -> usize {
        self.n_dimensions
    }

    fn set_matrix(&mut self, matrix: SparseMatrix) -> CoreResult<()> {
        *self = Self::new(matrix);
        Ok(())
    }

    fn append_rows(&mut self, rows: &SparseMatrix) -> CoreResult<()> {
        self.matrix.extend_rows(rows);
        self.n_dimensions = self.matrix.dimension_count();
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Manhattan {
    matrix: SparseMatrix,
    n_dimensions: usize,
}

impl Manhattan {
    pub fn new(matrix: SparseMatrix) -> Self {
        let n_dimensions = matrix.dimension_count();
        Self {
            matrix,
            n_dimensions,
        }
    }
}

impl Metric for Manhattan {
    fn distance(&self, x: usize, y: usize) -> f64 {
        match (self.matrix.row(x), self.matrix.row(y)) {
            (Some(a), Some(b)) => a.sub(b).sum_absolute(),
            _ => 0.0,
        }
    }
}

impl DistanceModel for Manhattan {
    fn kind(&self) -> DistanceKind {
        DistanceKind::Manhattan
    }

    fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    fn n_dimensions(&self) -> usize {
        self.n_dimensions
    }

    fn set_matrix(&mut self, matrix: SparseMatrix) -> CoreResult<()> {
        *self = Self::new(matrix);
        Ok(())
    }

    fn append_rows(&mut self, rows: &SparseMatrix) -> CoreResult<()> {
        self.matrix.extend_rows(rows);
        self.n_dimensions = self.matrix.dimension_count();
        Ok(())
    }
}

/// `1 - |pearson|`. Constant rows give NaN, which never wins a comparison.
#[derive(Debug, Clone)]
pub struct Correlation {
    matrix: SparseMatrix,
    n_dimensions: usize,
}

impl Correlation {
    pub fn new(matrix: SparseMatrix) -> Self {
        let n_dimensions = matrix.dimension_count();
        Self {
            matrix,
            n_dimensions,
        }
    }
}

impl Metric for Correlation {
    fn distance(&self, x: usize, y: usize) -> f64 {
        let r = match (self.matrix.row(x), self.matrix.row(y)) {
            (Some(a), Some(b)) => a.correlation(b, self.n_dimensions),
            _ => 0.0,
        };
        1.0 - r.abs()
    }
}

impl DistanceModel for Correlation {
    fn kind(&self) -> DistanceKind {
        DistanceKind::Correlation
    }

    fn matrix(&self) -> &SparseMatrix {
        &self.matrix
    }

    fn n_dimensions(&self) -> usize {
        self.n_dimensions
    }

    fn set_matrix(&mut self, matrix: SparseMatrix) -> CoreResult<()> {
        *self = Self::new(matrix);
        Ok(())
    }

    fn append_rows(&mut self, rows: &SparseMatrix) -> CoreResult<()> {
        self.matrix.extend_rows(rows);
        self.n_dimensions = self.matrix.dimension_count();
        Ok(())
    }
}

/// Variation of information between globally binned rows.
///
/// The quantization depends on the matrix-wide range, so it is recomputed
/// from the raw matrix whenever rows are replaced or appended.
#[derive(Debug, Clone)]
pub struct MutualInformation {
    raw: SparseMatrix,
    binned: SparseMatrix,
    n_bins: usize,
    n_dimensions: usize,
}

impl MutualInformation {
    pub fn new(matrix: SparseMatrix, n_bins: usize) -> CoreResult<Self> {
        let binned = matrix.binify(n_bins)?;
        let n_dimensions = matrix.dimension_count();
        Ok(Self {
            raw: matrix,
            binned,
            n_bins,
            n_dimensions,
        })
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    pub fn binned(&self) -> &SparseMatrix {
        &self.binned
    }
}

impl Metric for MutualInformation {
    /// Absent rows count as rows with every value unlisted.
    fn distance(&self, x: usize, y: usize) -> f64 {
        let empty = SparseVector::new();
        let a = self.binned.row(x).unwrap_or(&empty);
        let b = self.binned.row(y).unwrap_or(&empty);
        variation_of_information(a, b, self.n_dimensions)
    }
}

impl DistanceModel for MutualInformation {
    fn kind(&self) -> DistanceKind {
        DistanceKind::MutualInformation
    }

    fn matrix(&self) -> &SparseMatrix {
        &self.raw
    }

    fn n_dimensions(&self) -> usize {
        self.n_dimensions
    }

    fn set_matrix(&mut self, matrix: SparseMatrix) -> CoreResult<()> {
        *self = Self::new(matrix, self.n_bins)?;
        Ok(())
    }

    fn append_rows(&mut self, rows: &SparseMatrix) -> CoreResult<()> {
        let mut raw = std::mem::take(&mut self.raw);
        raw.extend_rows(rows);
        self.set_matrix(raw)
    }
}

fn plogp(count: usize, n: usize) -> f64 {
    if count == 0 || n == 0 {
        return 0.0;
    }
    let p = count as f64 / n as f64;
    p * p.ln()
}

/// Entropy of the bin distribution of `x` over `n` dimensions; unlisted dimensions fall in bin 0.
pub fn entropy(x: &SparseVector, n: usize) -> f64 {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    counts.insert(0, n.saturating_sub(x.len()));
    for (_, v) in x.iter() {
        *counts.entry(v as i64).or_insert(0) += 1;
    }
    -counts.values().map(|&c| plogp(c, n)).sum::<f64>()
}

/// Joint entropy of the bin pairs of `x` and `y` over `n` dimensions.
pub fn joint_entropy(x: &SparseVector, y: &SparseVector, n: usize) -> f64 {
    let (xs, ys) = (x.entries(), y.entries());
    let mut counts: BTreeMap<(i64, i64), usize> = BTreeMap::new();
    let (mut i, mut j) = (0, 0);
    let mut union = 0;
    while i < xs.len() || j < ys.len() {
        let pair = if j >= ys.len() || (i < xs.len() && xs[i].0 < ys[j].0) {
            i += 1;
            (xs[i - 1].1 as i64, 0)
        } else if i >= xs.len() || ys[j].0 < xs[i].0 {
            j += 1;
            (0, ys[j - 1].1 as i64)
        } else {
            i += 1;
            j += 1;
            (xs[i - 1].1 as i64, ys[j - 1].1 as i64)
        };
        *counts.entry(pair).or_insert(0) += 1;
        union += 1;
    }
    *counts.entry((0, 0)).or_insert(0) += n.saturating_sub(union);
    -counts.values().map(|&c| plogp(c, n)).sum::<f64>()
}

pub fn variation_of_information(x: &SparseVector, y: &SparseVector, n: usize) -> f64 {
    2.0 * joint_entropy(x, y, n) - entropy(x, n) - entropy(y, n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_is_complete() {
        for entry in REGISTRY.iter() {
            assert_eq!(entry.kind.entry().name, entry.name);
            assert_eq!(entry.name.parse::<DistanceKind>().unwrap(), entry.kind);
            assert_eq!(entry.tag.parse::<DistanceKind>().unwrap(), entry.kind);
        }
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!(
            "Mutual-Information".parse::<DistanceKind>().unwrap(),
            DistanceKind::MutualInformation
        );
        assert_eq!(
            "MI".parse::<DistanceKind>().unwrap(),
            DistanceKind::MutualInformation
        );
        assert_eq!(
            "EUCLIDEAN".parse::<DistanceKind>().unwrap(),
            DistanceKind::Euclidean
        );
        assert!("cosine".parse::<DistanceKind>().is_err());
    }

    #[test]
    fn test_entropy_of_constant_is_zero() {
        // every dimension in the same bin
        let x = SparseVector::from_pairs(vec![(0, 3.0), (1, 3.0)]).unwrap();
        assert!(entropy(&x, 2).abs() < 1e-12);
    }

    #[test]
    fn test_joint_entropy_symmetric() {
        let x = SparseVector::from_pairs(vec![(0, 1.0), (2, 2.0)]).unwrap();
        let y = SparseVector::from_pairs(vec![(1, 2.0), (2, 2.0), (3, 1.0)]).unwrap();
        let a = joint_entropy(&x, &y, 5);
        let b = joint_entropy(&y, &x, 5);
        assert!((a - b).abs() < 1e-12, "{} vs {}", a, b);
    }
}
