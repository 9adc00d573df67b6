//! Dataset configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sign_types::{BoundingBoxEncoder, DEFAULT_BOX_PADDING, DEFAULT_WINDOW_SIZE, SequenceAssembler, VECTOR_SIZE};

use crate::error::{DatasetError, Result};
use crate::ranking::LabelRanker;
use crate::shard::{DEFAULT_IMAGE_EXTENSION, ShardReader, ShardedDatasetWriter};

/// Settings shared by the dataset-side components.
///
/// # Example
///
/// ```
/// use sign_dataset::DatasetConfig;
///
/// let config = DatasetConfig::new("data/shards").with_top_n(50);
/// assert_eq!(config.window_size, 30);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Shard content root.
    pub root: PathBuf,

    /// Frames per dynamic window.
    pub window_size: usize,

    /// Values per frame vector.
    pub vector_size: usize,

    /// Fractional box padding.
    pub box_padding: f32,

    /// Number of labels kept by the ranker.
    pub top_n: usize,

    /// Labels never selected (case-insensitive).
    pub exclusions: Vec<String>,

    /// Frame image extension.
    pub image_extension: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/shards"),
            window_size: DEFAULT_WINDOW_SIZE,
            vector_size: VECTOR_SIZE,
            box_padding: DEFAULT_BOX_PADDING,
            top_n: LabelRanker::DEFAULT_TOP_N,
            exclusions: LabelRanker::DEFAULT_EXCLUSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            image_extension: DEFAULT_IMAGE_EXTENSION.to_string(),
        }
    }
}

impl DatasetConfig {
    /// Creates a config with default values rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Sets the window size.
    #[must_use]
    pub const fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Sets the box padding.
    #[must_use]
    pub const fn with_box_padding(mut self, box_padding: f32) -> Self {
        self.box_padding = box_padding;
        self
    }

    /// Sets the number of ranked labels kept.
    #[must_use]
    pub const fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Replaces the exclusion list.
    #[must_use]
    pub fn with_exclusions<I, S>(mut self, exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions = exclusions.into_iter().map(Into::into).collect();
        self
    }

    /// Checks every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(DatasetError::invalid_config("window_size must be positive"));
        }
        if self.vector_size == 0 {
            return Err(DatasetError::invalid_config("vector_size must be positive"));
        }
        if !(0.0..=1.0).contains(&self.box_padding) {
            return Err(DatasetError::invalid_config(format!(
                "box_padding must be in [0, 1], got {}",
                self.box_padding
            )));
        }
        if self.top_n == 0 {
            return Err(DatasetError::invalid_config("top_n must be positive"));
        }
        if self.image_extension.is_empty() || self.image_extension.contains(['.', '/', '\\']) {
            return Err(DatasetError::invalid_config(format!(
                "bad image extension '{}'",
                self.image_extension
            )));
        }
        Ok(())
    }

    /// Loads a JSON config file; absent keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::MissingInput`] if the file does not exist,
    /// or a parse or validation error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DatasetError::missing_input(path));
        }
        let config: Self = serde_json::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    /// Sequence assembler for this config.
    ///
    /// # Errors
    ///
    /// Returns an error for zero sizes.
    pub fn sequence_assembler(&self) -> Result<SequenceAssembler> {
        Ok(SequenceAssembler::new(self.window_size, self.vector_size)?)
    }

    /// Box encoder for this config.
    ///
    /// # Errors
    ///
    /// Returns an error for padding outside `[0, 1]`.
    pub fn box_encoder(&self) -> Result<BoundingBoxEncoder> {
        Ok(BoundingBoxEncoder::new(self.box_padding)?)
    }

    /// Label ranker for this config.
    #[must_use]
    pub fn label_ranker(&self) -> LabelRanker {
        LabelRanker::new(self.top_n).with_exclusions(&self.exclusions)
    }

    /// Shard writer rooted at [`DatasetConfig::root`].
    #[must_use]
    pub fn shard_writer(&self) -> ShardedDatasetWriter {
        ShardedDatasetWriter::new(&self.root).with_image_extension(&self.image_extension)
    }

    /// Shard reader rooted at [`DatasetConfig::root`].
    #[must_use]
    pub fn shard_reader(&self) -> ShardReader {
        ShardReader::new(&self.root).with_image_extension(&self.image_extension)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DatasetConfig::default();
        assert_eq!(config.window_size, 30);
        assert_eq!(config.vector_size, 63);
        assert_eq!(config.top_n, 100);
        assert_eq!(config.exclusions.len(), 9);
        assert_eq!(config.image_extension, "jpg");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_values() {
        assert!(DatasetConfig::default().with_window_size(0).validate().is_err());
        assert!(DatasetConfig::default().with_box_padding(1.5).validate().is_err());
        assert!(DatasetConfig::default().with_top_n(0).validate().is_err());
        let mut config = DatasetConfig::default();
        config.image_extension = ".jpg".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn factories_follow_config() {
        let config = DatasetConfig::new("/tmp/x")
            .with_window_size(10)
            .with_top_n(3)
            .with_exclusions(["Yes"]);
        assert_eq!(config.sequence_assembler().unwrap().window_size(), 10);
        assert!(config.label_ranker().is_excluded("yes"));
        assert!(!config.label_ranker().is_excluded("hello"));
        assert_eq!(config.label_ranker().top_n(), 3);
        assert_eq!(config.shard_reader().root(), Path::new("/tmp/x"));
    }

    #[test]
    fn load_partial_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dataset.json");
        fs::write(&path, r#"{"root": "/srv/shards", "top_n": 20}"#).unwrap();
        let config = DatasetConfig::load(&path).unwrap();
        assert_eq!(config.root, PathBuf::from("/srv/shards"));
        assert_eq!(config.top_n, 20);
        assert_eq!(config.window_size, 30);

        fs::write(&path, r#"{"window_size": 0}"#).unwrap();
        assert!(DatasetConfig::load(&path).is_err());
        assert!(matches!(
            DatasetConfig::load(&dir.path().join("none.json")),
            Err(DatasetError::MissingInput(_))
        ));
    }
}
