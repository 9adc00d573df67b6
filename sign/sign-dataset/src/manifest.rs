//! YOLO `dataset.yaml` manifest.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::class_index::ClassIndex;
use crate::error::{DatasetError, Result};

/// Default training image subpath.
pub const DEFAULT_TRAIN_SUBPATH: &str = "images/train";

/// Manifest file name inside a detection dataset.
pub const MANIFEST_FILE_NAME: &str = "dataset.yaml";

/// Detection dataset manifest.
///
/// `val` equal to `train` means there is no held-out validation data; see
/// [`DatasetManifest::has_held_out_validation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetManifest {
    /// Dataset root.
    pub path: String,

    /// Training image subpath, relative to `path`.
    pub train: String,

    /// Validation image subpath, relative to `path`.
    pub val: String,

    /// Class id → label, matching the class vocabulary.
    pub names: BTreeMap<u32, String>,
}

impl DatasetManifest {
    /// Returns `false` when validation reuses the training images.
    #[must_use]
    pub fn has_held_out_validation(&self) -> bool {
        self.val != self.train
    }

    /// Number of classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.names.len()
    }

    /// Checks ids are contiguous from 0, subpaths are set and no value
    /// holds control characters (single-quoted YAML folds line breaks).
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidManifest`] describing the first problem.
    pub fn validate(&self) -> Result<()> {
        if self.train.trim().is_empty() {
            return Err(DatasetError::invalid_manifest("train subpath is empty"));
        }
        if self.val.trim().is_empty() {
            return Err(DatasetError::invalid_manifest("val subpath is empty"));
        }
        let values = [&self.path, &self.train, &self.val]
            .into_iter()
            .chain(self.names.values());
        for value in values {
            if value.chars().any(char::is_control) {
                return Err(DatasetError::invalid_manifest(format!(
                    "{value:?} contains control characters"
                )));
            }
        }
        for (expected, &id) in (0u32..).zip(self.names.keys()) {
            if id != expected {
                return Err(DatasetError::invalid_manifest(format!(
                    "class ids are not contiguous: expected {expected}, found {id}"
                )));
            }
        }
        Ok(())
    }

    /// Checks the names table matches `index` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidManifest`] on any difference.
    pub fn validate_against(&self, index: &ClassIndex) -> Result<()> {
        self.validate()?;
        if self.names.len() != index.len() {
            return Err(DatasetError::invalid_manifest(format!(
                "{} names for {} classes",
                self.names.len(),
                index.len()
            )));
        }
        for (id, label) in index.iter() {
            if self.names.get(&id).map(String::as_str) != Some(label) {
                return Err(DatasetError::invalid_manifest(format!(
                    "class {id} should be '{label}'"
                )));
            }
        }
        Ok(())
    }

    /// Renders the manifest as YAML.
    #[must_use]
    pub fn to_yaml(&self) -> String {
        let mut yaml = String::new();
        let _ = writeln!(yaml, "path: {}", yaml_single_quoted(&self.path));
        let _ = writeln!(yaml, "train: {}", yaml_single_quoted(&self.train));
        if self.has_held_out_validation() {
            let _ = writeln!(yaml, "val: {}", yaml_single_quoted(&self.val));
        } else {
            let _ = writeln!(
                yaml,
                "val: {} # placeholder, no held-out validation split",
                yaml_single_quoted(&self.val)
            );
        }
        yaml.push('\n');
        yaml.push_str("names:\n");
        for (id, name) in &self.names {
            let _ = writeln!(yaml, "  {id}: {}", yaml_single_quoted(name));
        }
        yaml
    }

    /// Parses manifest YAML.
    ///
    /// # Errors
    ///
    /// Returns a serialization error for malformed YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Validates and writes the manifest to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidManifest`] if the manifest would not
    /// read back unchanged, or an IO error if the file cannot be written.
    pub fn write(&self, path: &Path) -> Result<()> {
        self.validate()?;
        fs::write(path, self.to_yaml())?;
        Ok(())
    }

    /// Loads a manifest from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::MissingInput`] if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DatasetError::missing_input(path));
        }
        Self::from_yaml(&fs::read_to_string(path)?)
    }
}

/// Builds a [`DatasetManifest`] from the class vocabulary.
///
/// # Example
///
/// ```
/// use sign_dataset::{ClassIndex, DatasetManifestBuilder};
///
/// let index = ClassIndex::new(["hello", "yes"]).unwrap();
/// let manifest = DatasetManifestBuilder::new("/data/yolo").build(&index);
/// assert_eq!(manifest.names[&1], "yes");
/// assert!(!manifest.has_held_out_validation());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetManifestBuilder {
    root: PathBuf,
    train: String,
    val: Option<String>,
}

impl DatasetManifestBuilder {
    /// Creates a builder for a dataset at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            train: DEFAULT_TRAIN_SUBPATH.to_string(),
            val: None,
        }
    }

    /// Sets the training image subpath.
    #[must_use]
    pub fn with_train(mut self, train: impl Into<String>) -> Self {
        self.train = train.into();
        self
    }

    /// Sets a distinct validation image subpath.
    #[must_use]
    pub fn with_val(mut self, val: impl Into<String>) -> Self {
        self.val = Some(val.into());
        self
    }

    /// Builds the manifest, warning when validation reuses training data.
    #[must_use]
    pub fn build(&self, index: &ClassIndex) -> DatasetManifest {
        let val = self.val.clone().unwrap_or_else(|| self.train.clone());
        let manifest = DatasetManifest {
            path: self.root.display().to_string(),
            train: self.train.clone(),
            val,
            names: index.iter().map(|(id, label)| (id, label.to_string())).collect(),
        };
        if !manifest.has_held_out_validation() {
            warn!(
                train = manifest.train.as_str(),
                "Manifest val equals train: no held-out validation data"
            );
        }
        manifest
    }
}

fn yaml_single_quoted(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}
