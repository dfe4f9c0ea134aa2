//! Files read and written by a biseriation run.
//!
//! - `text`: the sparse `index:value` matrix format, index lists and value lists
//! - `checkpoint`: the on-disk placement log of the nearest-neighbor heuristic
//! - `metadata`: the JSON summary written next to the outputs

pub mod checkpoint;
pub mod metadata;
pub mod text;

use biseriation_core::CoreError;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug)]
pub enum StorageError {
    Io(String),
    Parse(String),
    Serde(String),
    Invalid(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "IO error: {}", e),
            StorageError::Parse(e) => write!(f, "Parse error: {}", e),
            StorageError::Serde(e) => write!(f, "Serde error: {}", e),
            StorageError::Invalid(e) => write!(f, "Invalid: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<CoreError> for StorageError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Io(e) => StorageError::Io(e),
            CoreError::Parse(e) => StorageError::Parse(e),
            CoreError::Invalid(e) => StorageError::Invalid(e),
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
