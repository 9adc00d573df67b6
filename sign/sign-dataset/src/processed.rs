//! Processed dataset file I/O.

use std::fs;
use std::path::Path;

use sign_types::ProcessedDataset;
use tracing::debug;

use crate::error::{DatasetError, Result};

/// Loads a processed dataset JSON file.
///
/// Every sample is validated after parsing.
///
/// # Errors
///
/// Returns [`DatasetError::MissingInput`] if the file does not exist, a
/// serialization error for malformed JSON and [`DatasetError::Types`] for
/// a sample that breaks the sample invariants.
pub fn load_processed_dataset(path: &Path) -> Result<ProcessedDataset> {
    if !path.is_file() {
        return Err(DatasetError::missing_input(path));
    }
    let json = fs::read_to_string(path)?;
    let dataset: ProcessedDataset = serde_json::from_str(&json)?;
    for sample in &dataset.samples {
        sample.validate()?;
    }
    debug!(path = %path.display(), samples = dataset.len(), "Loaded processed dataset");
    Ok(dataset)
}

/// Saves a processed dataset as pretty-printed JSON.
///
/// # Errors
///
/// Returns an IO or serialization error.
pub fn save_processed_dataset(path: &Path, dataset: &ProcessedDataset) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(dataset)?)?;
    debug!(path = %path.display(), samples = dataset.len(), "Saved processed dataset");
    Ok(())
}
