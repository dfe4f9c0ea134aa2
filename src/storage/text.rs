//! Plain-text matrix and list files.
//!
//! Matrix rows are whitespace-separated `index:value` pairs with strictly
//! increasing indices. A row may start with a label: a line is labelled when
//! splitting it on whitespace and `:` gives an odd number of tokens. An empty
//! line is an absent row; a line holding only a label is a present, empty row.
//!
//! ```text
//! alpha 1:0.5 4:2
//!
//! gamma
//! 2:1.25
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};

use biseriation_core::{SparseMatrix, SparseVector};

use crate::storage::{StorageError, StorageResult};

/// A matrix together with one optional label per row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LabelledMatrix {
    pub matrix: SparseMatrix,
    pub labels: Vec<Option<String>>,
}

impl LabelledMatrix {
    /// Unlabelled rows.
    pub fn new(matrix: SparseMatrix) -> Self {
        let labels = vec![None; matrix.row_count()];
        Self { matrix, labels }
    }

    pub fn with_labels(matrix: SparseMatrix, labels: Vec<Option<String>>) -> StorageResult<Self> {
        if labels.len() != matrix.row_count() {
            return Err(StorageError::Invalid(format!(
                "{} labels for {} rows",
                labels.len(),
                matrix.row_count()
            )));
        }
        Ok(Self { matrix, labels })
    }

    pub fn row_count(&self) -> usize {
        self.matrix.row_count()
    }

    pub fn has_labels(&self) -> bool {
        self.labels.iter().any(Option::is_some)
    }

    pub fn label(&self, i: usize) -> Option<&str> {
        self.labels.get(i).and_then(|l| l.as_deref())
    }

    /// Rows and their labels permuted together: row `k` is row `order[k]`.
    pub fn rearranged(&self, order: &[usize]) -> LabelledMatrix {
        LabelledMatrix {
            matrix: self.matrix.rearrange_rows(order),
            labels: order
                .iter()
                .map(|&i| self.labels.get(i).cloned().flatten())
                .collect(),
        }
    }
}

/// Parse one line into its label and row.
pub fn parse_sparse_row(line: &str) -> StorageResult<(Option<String>, Option<SparseVector>)> {
    let tokens: Vec<&str> = line
        .split(|c: char| c.is_whitespace() || c == ':')
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Ok((None, None));
    }

    let (label, pairs) = if tokens.len() % 2 == 1 {
        (Some(tokens[0].to_string()), &tokens[1..])
    } else {
        (None, &tokens[..])
    };

    let mut entries = Vec::with_capacity(pairs.len() / 2);
    for pair in pairs.chunks(2) {
        let index: usize = pair[0]
            .parse()
            .map_err(|_| StorageError::Parse(format!("invalid index '{}'", pair[0])))?;
        let value: f64 = pair[1]
            .parse()
            .map_err(|_| StorageError::Parse(format!("invalid value '{}'", pair[1])))?;
        entries.push((index, value));
    }
    let row = SparseVector::from_pairs(entries)?;
    Ok((label, Some(row)))
}

pub fn parse_sparse_matrix(text: &str) -> StorageResult<LabelledMatrix> {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let (label, row) = parse_sparse_row(line).map_err(|e| match e {
            StorageError::Parse(msg) | StorageError::Invalid(msg) => {
                StorageError::Parse(format!("line {}: {}", n + 1, msg))
            }
            other => other,
        })?;
        labels.push(label);
        rows.push(row);
    }
    Ok(LabelledMatrix {
        matrix: SparseMatrix::new(rows),
        labels,
    })
}

/// Load a matrix file; any malformed line fails the whole load.
pub fn read_sparse_matrix(path: impl AsRef<Path>) -> StorageResult<LabelledMatrix> {
    let path = path.as_ref();
    info!("Loading sparse matrix from {:?}", path);
    let text = std::fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {:?}: {}", path, e)))?;
    let loaded = parse_sparse_matrix(&text)?;
    debug!(
        "Loaded {} rows ({} present, {} non-zeros, labelled: {})",
        loaded.row_count(),
        loaded.matrix.present_count(),
        loaded.matrix.nnz(),
        loaded.has_labels()
    );
    Ok(loaded)
}

/// Serialize one row, label first. Absent rows give an empty line.
pub fn format_sparse_row(label: Option<&str>, row: Option<&SparseVector>) -> String {
    let mut tokens: Vec<String> = Vec::new();
    if let Some(label) = label {
        tokens.push(label.to_string());
    }
    if let Some(row) = row {
        tokens.extend(row.iter().map(|(i, v)| format!("{}:{}", i, v)));
    }
    tokens.join(" ")
}

pub fn write_sparse_matrix(path: impl AsRef<Path>, data: &LabelledMatrix) -> StorageResult<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| StorageError::Io(format!("Failed to create {:?}: {}", path, e)))?;
    let mut writer = BufWriter::new(file);
    for (i, row) in data.matrix.rows().iter().enumerate() {
        writeln!(writer, "{}", format_sparse_row(data.label(i), row.as_ref()))?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {:?}", data.row_count(), path);
    Ok(())
}

/// Newline-delimited indices, one per position.
pub fn write_index_list(path: impl AsRef<Path>, indices: &[usize]) -> StorageResult<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    for i in indices {
        writeln!(writer, "{}", i)?;
    }
    writer.flush()?;
    debug!("Wrote {} indices to {:?}", indices.len(), path.as_ref());
    Ok(())
}

pub fn read_index_list(path: impl AsRef<Path>) -> StorageResult<Vec<usize>> {
    let text = std::fs::read_to_string(path.as_ref())?;
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            l.parse()
                .map_err(|_| StorageError::Parse(format!("invalid index '{}'", l)))
        })
        .collect()
}

pub fn write_f64_list(path: impl AsRef<Path>, values: &[f64]) -> StorageResult<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    for v in values {
        writeln!(writer, "{}", v)?;
    }
    writer.flush()?;
    Ok(())
}
