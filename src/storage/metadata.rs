use std::path::Path;

use log::{debug, info};

use crate::config::RunMetadata;
use crate::storage::{StorageError, StorageResult};

/// Save run metadata to a JSON file
pub fn save_metadata(metadata: &RunMetadata, path: impl AsRef<Path>) -> StorageResult<()> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| StorageError::Serde(format!("Failed to serialize metadata: {}", e)))?;

    std::fs::write(path.as_ref(), json)
        .map_err(|e| StorageError::Io(format!("Failed to write metadata: {}", e)))?;
    debug!("Saved metadata to {:?}", path.as_ref());

    Ok(())
}

/// Load run metadata from a JSON file
pub fn load_metadata(path: impl AsRef<Path>) -> StorageResult<RunMetadata> {
    info!("Loading metadata from {:?}", path.as_ref());
    let json = std::fs::read_to_string(path.as_ref())
        .map_err(|e| StorageError::Io(format!("Failed to read metadata: {}", e)))?;

    let metadata: RunMetadata = serde_json::from_str(&json)
        .map_err(|e| StorageError::Serde(format!("Failed to parse metadata: {}", e)))?;

    Ok(metadata)
}
