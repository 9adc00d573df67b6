//! Error types for sign-dataset crate.

use std::path::PathBuf;

use sign_types::SignTypesError;
use thiserror::Error;

/// Errors that can occur in sign-dataset operations.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// A required input file or directory is absent.
    #[error("required input not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// A label is not part of the class vocabulary.
    #[error("unknown label: {0}")]
    UnknownLabel(String),

    /// A label appears twice in a vocabulary that must be deduplicated.
    #[error("duplicate label in class list: {0}")]
    DuplicateLabel(String),

    /// A label contains characters that cannot be stored verbatim.
    #[error("invalid label {0:?}: control characters are not allowed")]
    InvalidLabel(String),

    /// Two distinct labels sanitize to the same shard directory.
    #[error("labels '{label}' and '{existing}' both map to shard directory '{dir}'")]
    LabelCollision {
        /// Label being added.
        label: String,
        /// Label that already owns the directory.
        existing: String,
        /// Sanitized directory name.
        dir: String,
    },

    /// A label sanitizes to an empty directory name.
    #[error("label '{0}' has no filesystem-safe characters")]
    EmptyShardName(String),

    /// Shard not found.
    #[error("shard not found: {0}")]
    ShardNotFound(String),

    /// A sample record is not fit to be persisted.
    #[error("invalid sample {id}: {reason}")]
    InvalidSample {
        /// Sample ID.
        id: String,
        /// Reason for rejection.
        reason: String,
    },

    /// Invalid manifest.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error from the sign-types layer.
    #[error(transparent)]
    Types(#[from] SignTypesError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl DatasetError {
    /// Creates a missing input error.
    #[must_use]
    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput(path.into())
    }

    /// Creates an unknown label error.
    #[must_use]
    pub fn unknown_label(label: impl Into<String>) -> Self {
        Self::UnknownLabel(label.into())
    }

    /// Creates a label collision error.
    #[must_use]
    pub fn label_collision(
        label: impl Into<String>,
        existing: impl Into<String>,
        dir: impl Into<String>,
    ) -> Self {
        Self::LabelCollision {
            label: label.into(),
            existing: existing.into(),
            dir: dir.into(),
        }
    }

    /// Creates a shard not found error.
    #[must_use]
    pub fn shard_not_found(label: impl Into<String>) -> Self {
        Self::ShardNotFound(label.into())
    }

    /// Creates an invalid sample error.
    #[must_use]
    pub fn invalid_sample(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSample {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid manifest error.
    #[must_use]
    pub fn invalid_manifest(reason: impl Into<String>) -> Self {
        Self::InvalidManifest(reason.into())
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates an IO error.
    #[must_use]
    pub fn io(reason: impl Into<String>) -> Self {
        Self::Io(reason.into())
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for DatasetError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for sign-dataset operations.
pub type Result<T> = std::result::Result<T, DatasetError>;
