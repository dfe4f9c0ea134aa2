// biseriation-core/src/sparse.rs
//! Sparse vectors and row-oriented sparse matrices.
//!
//! Every distance model is built on the operations in this module:
//! - merge-join dot product and addition over sorted index sequences
//! - norms and sums (plain, absolute, squared)
//! - Pearson correlation over `n` dense dimensions (unlisted entries are 0)
//! - transpose, global binning, row merge and row rearrangement
//!
//! A `SparseVector` keeps its `(index, value)` pairs strictly increasing by
//! index. Every constructor enforces it and every vector-producing operation
//! preserves it, because the merge-joins depend on it.
//!
//! A `SparseMatrix` is a sequence of optional rows: `None` marks an absent
//! instance. Absent rows take no part in arithmetic but keep their position,
//! so row `i` of the matrix is always instance `i`.

use serde::{Deserialize, Serialize};
use sprs::{CsMat, TriMat};

use crate::error::{CoreError, CoreResult};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(usize, f64)>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a vector from `(index, value)` pairs.
    ///
    /// Fails if the indices are not strictly increasing: the arithmetic never
    /// re-sorts its inputs.
    pub fn from_pairs(pairs: Vec<(usize, f64)>) -> CoreResult<Self> {
        for w in pairs.windows(2) {
            if w[1].0 <= w[0].0 {
                return Err(CoreError::Invalid(format!(
                    "indices must be strictly increasing, found {} after {}",
                    w[1].0, w[0].0
                )));
            }
        }
        Ok(Self { entries: pairs })
    }

    /// Append an entry whose index is known to exceed every stored index.
    pub(crate) fn push_sorted(&mut self, index: usize, value: f64) {
        debug_assert!(self.entries.last().is_none_or(|&(last, _)| last < index));
        self.entries.push((index, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(usize, f64)] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|&(i, _)| i)
    }

    /// Value at `index`, 0 when unlisted.
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |&(i, _)| i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn first_index(&self) -> Option<usize> {
        self.entries.first().map(|&(i, _)| i)
    }

    pub fn last_index(&self) -> Option<usize> {
        self.entries.last().map(|&(i, _)| i)
    }

    /// Merge-join dot product, O(|x| + |y|).
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (x, y) = (&self.entries, &other.entries);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < x.len() && j < y.len() {
            if x[i].0 == y[j].0 {
                sum += x[i].1 * y[j].1;
                i += 1;
                j += 1;
            } else if x[i].0 > y[j].0 {
                j += 1;
            } else {
                i += 1;
            }
        }
        sum
    }

    /// Union of both supports, summing values where indices collide.
    pub fn add(&self, other: &SparseVector) -> SparseVector {
        let (x, y) = (&self.entries, &other.entries);
        let mut out = Vec::with_capacity(x.len() + y.len());
        let (mut i, mut j) = (0, 0);
        while i < x.len() && j < y.len() {
            if x[i].0 == y[j].0 {
                out.push((x[i].0, x[i].1 + y[j].1));
                i += 1;
                j += 1;
            } else if x[i].0 < y[j].0 {
                out.push(x[i]);
                i += 1;
            } else {
                out.push(y[j]);
                j += 1;
            }
        }
        out.extend_from_slice(&x[i..]);
        out.extend_from_slice(&y[j..]);
        SparseVector { entries: out }
    }

    pub fn scale(&self, c: f64) -> SparseVector {
        SparseVector {
            entries: self.entries.iter().map(|&(i, v)| (i, v * c)).collect(),
        }
    }

    /// `self - other`, computed as `self + (-1 · other)`.
    pub fn sub(&self, other: &SparseVector) -> SparseVector {
        self.add(&other.scale(-1.0))
    }

    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|&(_, v)| v).sum()
    }

    pub fn sum_absolute(&self) -> f64 {
        self.entries.iter().map(|&(_, v)| v.abs()).sum()
    }

    pub fn sum_square(&self) -> f64 {
        self.entries.iter().map(|&(_, v)| v * v).sum()
    }

    pub fn max_value(&self) -> Option<f64> {
        self.entries.iter().map(|&(_, v)| v).reduce(f64::max)
    }

    pub fn min_value(&self) -> Option<f64> {
        self.entries.iter().map(|&(_, v)| v).reduce(f64::min)
    }

    /// Pearson correlation over `n` dense dimensions.
    ///
    /// Not numerically stabilized: a constant vector yields NaN.
    pub fn correlation(&self, other: &SparseVector, n: usize) -> f64 {
        let n = n as f64;
        let sum_x = self.sum();
        let sum_y = other.sum();
        (n * self.dot(other) - sum_x * sum_y)
            / ((n * self.sum_square() - sum_x * sum_x).sqrt()
                * (n * other.sum_square() - sum_y * sum_y).sqrt())
    }

    /// Cosine similarity clipped to `[-1, 1]`.
    pub fn cosine(&self, other: &SparseVector) -> f64 {
        (self.dot(other) / (self.norm() * other.norm())).clamp(-1.0, 1.0)
    }

    /// Shift every index right by `k`.
    pub fn shift(&self, k: usize) -> SparseVector {
        SparseVector {
            entries: self.entries.iter().map(|&(i, v)| (i + k, v)).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    rows: Vec<Option<SparseVector>>,
}

impl SparseMatrix {
    pub fn new(rows: Vec<Option<SparseVector>>) -> Self {
        Self { rows }
    }

    /// Matrix where every row is present.
    pub fn from_vectors(rows: Vec<SparseVector>) -> Self {
        Self {
            rows: rows.into_iter().map(Some).collect(),
        }
    }

    /// Zero-indexed sparse copy of dense rows; zeros are not stored.
    pub fn from_dense(rows: &[Vec<f64>]) -> Self {
        let rows = rows
            .iter()
            .map(|row| {
                let mut v = SparseVector::new();
                for (j, &x) in row.iter().enumerate() {
                    if x != 0.0 {
                        v.push_sorted(j, x);
                    }
                }
                Some(v)
            })
            .collect();
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, i: usize) -> Option<&SparseVector> {
        self.rows.get(i).and_then(|r| r.as_ref())
    }

    pub fn is_present(&self, i: usize) -> bool {
        self.row(i).is_some()
    }

    pub fn rows(&self) -> &[Option<SparseVector>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Option<SparseVector>> {
        self.rows
    }

    /// `(index, row)` for every present row.
    pub fn iter_present(&self) -> impl Iterator<Item = (usize, &SparseVector)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (i, r)))
    }

    pub fn present_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_some()).count()
    }

    pub fn push_row(&mut self, row: Option<SparseVector>) {
        self.rows.push(row);
    }

    /// Append `updates` in place, keeping their order.
    pub fn extend_rows(&mut self, updates: &SparseMatrix) {
        self.rows.extend(updates.rows.iter().cloned());
    }

    pub fn nnz(&self) -> usize {
        self.iter_present().map(|(_, r)| r.len()).sum()
    }

    /// Smallest index observed at the head of any non-empty row.
    pub fn min_column_index(&self) -> Option<usize> {
        self.iter_present().filter_map(|(_, r)| r.first_index()).min()
    }

    pub fn max_column_index(&self) -> Option<usize> {
        self.iter_present().filter_map(|(_, r)| r.last_index()).max()
    }

    pub fn is_zero_indexed(&self) -> bool {
        self.min_column_index() == Some(0)
    }

    /// Highest column index, plus one when the matrix is zero-indexed.
    pub fn dimension_count(&self) -> usize {
        match self.max_column_index() {
            None => 0,
            Some(max) if self.is_zero_indexed() => max + 1,
            Some(max) => max,
        }
    }

    pub fn max_value(&self) -> Option<f64> {
        self.iter_present()
            .filter_map(|(_, r)| r.max_value())
            .reduce(f64::max)
    }

    pub fn min_value(&self) -> Option<f64> {
        self.iter_present()
            .filter_map(|(_, r)| r.min_value())
            .reduce(f64::min)
    }

    /// Transpose with one-indexing auto-detected from the smallest column index.
    ///
    /// Columns with no entries become absent rows, and nothing exists past the
    /// last observed column, so `transpose(transpose(m))` loses trailing rows
    /// of `m` that had no entries.
    pub fn transpose(&self) -> SparseMatrix {
        let offset = match self.min_column_index() {
            Some(min) if min > 0 => 1,
            _ => 0,
        };
        self.transpose_with_offset(offset)
    }

    /// Transpose that treats column indices as zero-based, whatever their minimum.
    pub fn transpose_zero_indexed(&self) -> SparseMatrix {
        self.transpose_with_offset(0)
    }

    fn transpose_with_offset(&self, offset: usize) -> SparseMatrix {
        let Some(max) = self.max_column_index() else {
            return SparseMatrix::default();
        };
        let mut rows: Vec<Option<SparseVector>> = vec![None; max + 1 - offset];
        for (i, row) in self.iter_present() {
            for (j, v) in row.iter() {
                rows[j - offset]
                    .get_or_insert_with(SparseVector::new)
                    .push_sorted(i, v);
            }
        }
        SparseMatrix { rows }
    }

    /// Quantize every value into `n_bins` uniform-width integer bins.
    ///
    /// Zero is the implicit minimum. Listed values land in `1..=n_bins`, bin 0
    /// is reserved for unlisted entries.
    pub fn binify(&self, n_bins: usize) -> CoreResult<SparseMatrix> {
        if n_bins < 2 {
            return Err(CoreError::Invalid(format!(
                "binify needs at least 2 bins, got {}",
                n_bins
            )));
        }
        let max = self.max_value().unwrap_or(0.0);
        let min = self.min_value().unwrap_or(0.0).min(0.0);
        let mut width = ((max - min) / (n_bins - 1) as f64).ceil();
        if !(width > 0.0) {
            width = 1.0;
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.as_ref().map(|r| SparseVector {
                    entries: r
                        .iter()
                        .map(|(j, v)| (j, ((v - min) / width).floor() + 1.0))
                        .collect(),
                })
            })
            .collect();
        Ok(SparseMatrix { rows })
    }

    /// Rows of `self` followed by the rows of `updates`.
    pub fn merge(&self, updates: &SparseMatrix) -> SparseMatrix {
        let mut merged = self.clone();
        merged.extend_rows(updates);
        merged
    }

    /// Row `k` of the result is row `order[k]` of `self`.
    pub fn rearrange_rows(&self, order: &[usize]) -> SparseMatrix {
        SparseMatrix {
            rows: order
                .iter()
                .map(|&i| self.rows.get(i).cloned().flatten())
                .collect(),
        }
    }

    pub fn shift_columns(&self, k: usize) -> SparseMatrix {
        SparseMatrix {
            rows: self
                .rows
                .iter()
                .map(|r| r.as_ref().map(|r| r.shift(k)))
                .collect(),
        }
    }

    /// Column `j` as a sparse vector indexed by row.
    pub fn column_vector(&self, j: usize) -> SparseVector {
        let mut out = SparseVector::new();
        for (i, row) in self.iter_present() {
            if let Ok(pos) = row.entries().binary_search_by_key(&j, |&(idx, _)| idx) {
                out.push_sorted(i, row.entries()[pos].1);
            }
        }
        out
    }

    /// Drop absent rows. Positions shift.
    pub fn filter_absent(&self) -> SparseMatrix {
        SparseMatrix {
            rows: self.rows.iter().filter(|r| r.is_some()).cloned().collect(),
        }
    }

    /// CSR copy with column indices taken as-is. Absent rows are empty.
    pub fn to_csr(&self) -> CsMat<f64> {
        let n_cols = self.max_column_index().map_or(0, |m| m + 1);
        let mut trimat = TriMat::new((self.row_count(), n_cols));
        for (i, row) in self.iter_present() {
            for (j, v) in row.iter() {
                trimat.add_triplet(i, j, v);
            }
        }
        trimat.to_csr()
    }

    pub fn from_csr(matrix: &CsMat<f64>) -> SparseMatrix {
        let csr = if matrix.is_csr() {
            matrix.clone()
        } else {
            matrix.to_csr()
        };
        let rows = csr
            .outer_iterator()
            .map(|row| {
                let mut v = SparseVector::new();
                for (j, &x) in row.iter() {
                    v.push_sorted(j, x);
                }
                Some(v)
            })
            .collect();
        SparseMatrix { rows }
    }
}
