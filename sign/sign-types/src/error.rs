//! Error types for sign-types crate.

use thiserror::Error;

/// Errors that can occur in sign-types operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignTypesError {
    /// A hand landmark set did not have the fixed cardinality.
    #[error("invalid landmark count: expected {expected}, got {actual}")]
    LandmarkCount {
        /// Expected number of landmarks.
        expected: usize,
        /// Actual number of landmarks.
        actual: usize,
    },

    /// A feature vector had the wrong length.
    #[error("feature vector shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        /// Expected vector length.
        expected: usize,
        /// Actual vector length.
        actual: usize,
    },

    /// Not enough input to produce a result (e.g. an empty landmark list).
    #[error("insufficient input: {0}")]
    InsufficientInput(String),

    /// A YOLO label line could not be parsed.
    #[error("invalid label line '{line}': {reason}")]
    InvalidLabelLine {
        /// The offending line.
        line: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A configuration value was out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A sample violated one of its invariants.
    #[error("invalid sample {id}: {reason}")]
    InvalidSample {
        /// Sample identifier.
        id: String,
        /// Which invariant was violated.
        reason: String,
    },
}

impl SignTypesError {
    /// Creates a landmark count error.
    #[must_use]
    pub const fn landmark_count(expected: usize, actual: usize) -> Self {
        Self::LandmarkCount { expected, actual }
    }

    /// Creates a shape mismatch error.
    #[must_use]
    pub const fn shape_mismatch(expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch { expected, actual }
    }

    /// Creates an insufficient input error.
    #[must_use]
    pub fn insufficient_input(reason: impl Into<String>) -> Self {
        Self::InsufficientInput(reason.into())
    }

    /// Creates an invalid label line error.
    #[must_use]
    pub fn invalid_label_line(line: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLabelLine {
            line: line.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Creates an invalid sample error.
    #[must_use]
    pub fn invalid_sample(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSample {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for sign-types operations.
pub type Result<T> = std::result::Result<T, SignTypesError>;
