//! Error types for sign-pipeline crate.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sign_dataset::DatasetError;
use sign_types::SignTypesError;
use thiserror::Error;

/// Errors that can occur while processing samples.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required file or model asset is absent. Aborts the run.
    #[error("required asset not found: {}", .0.display())]
    MissingAsset(PathBuf),

    /// Fetching a video segment failed.
    #[error("acquisition failed: {0}")]
    Acquisition(String),

    /// Decoding the fetched video failed.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The hand detector failed.
    #[error("detector failed: {0}")]
    Detector(String),

    /// Every frame of a sample was dropped.
    #[error("no usable frames in sample {id} ({examined} frames examined)")]
    NoUsableFrames {
        /// Sample ID.
        id: String,
        /// Frames passed to the detector.
        examined: usize,
    },

    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error from the dataset layer.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

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

impl PipelineError {
    /// Creates a missing asset error.
    #[must_use]
    pub fn missing_asset(path: impl Into<PathBuf>) -> Self {
        Self::MissingAsset(path.into())
    }

    /// Creates an acquisition error.
    #[must_use]
    pub fn acquisition(reason: impl Into<String>) -> Self {
        Self::Acquisition(reason.into())
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode(reason.into())
    }

    /// Creates a detector error.
    #[must_use]
    pub fn detector(reason: impl Into<String>) -> Self {
        Self::Detector(reason.into())
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig(reason.into())
    }

    /// Returns `true` if the run must stop.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        SkipReason::from_error(self).is_none()
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for sign-pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Why a corpus entry produced no sample. None of these stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The video segment could not be fetched.
    AcquisitionFailed(String),
    /// The video could not be decoded.
    DecodeFailed(String),
    /// The detector failed on this sample.
    DetectorFailed(String),
    /// No frame had a usable hand detection.
    NoHandsDetected {
        /// Frames passed to the detector.
        frames_examined: usize,
    },
    /// The sample broke a sample invariant and was not persisted.
    InvalidSample(String),
}

impl SkipReason {
    /// Classifies a per-sample error; `None` means the error is fatal.
    #[must_use]
    pub fn from_error(err: &PipelineError) -> Option<Self> {
        match err {
            PipelineError::Acquisition(reason) => Some(Self::AcquisitionFailed(reason.clone())),
            PipelineError::Decode(reason) => Some(Self::DecodeFailed(reason.clone())),
            PipelineError::Detector(reason) => Some(Self::DetectorFailed(reason.clone())),
            PipelineError::NoUsableFrames { examined, .. } => Some(Self::NoHandsDetected {
                frames_examined: *examined,
            }),
            PipelineError::Types(err @ SignTypesError::InvalidSample { .. }) => {
                Some(Self::InvalidSample(err.to_string()))
            }
            PipelineError::Dataset(err @ DatasetError::InvalidSample { .. }) => {
                Some(Self::InvalidSample(err.to_string()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcquisitionFailed(reason) => write!(f, "acquisition failed: {reason}"),
            Self::DecodeFailed(reason) => write!(f, "decode failed: {reason}"),
            Self::DetectorFailed(reason) => write!(f, "detector failed: {reason}"),
            Self::NoHandsDetected { frames_examined } => {
                write!(f, "no hands detected in {frames_examined} frames")
            }
            Self::InvalidSample(reason) => write!(f, "{reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_asset_is_fatal() {
        let err = PipelineError::missing_asset("models/hand_landmarker.task");
        assert!(err.is_fatal());
        assert!(err.to_string().contains("hand_landmarker.task"));
    }

    #[test]
    fn per_sample_failures_are_skips() {
        assert_eq!(
            SkipReason::from_error(&PipelineError::acquisition("HTTP 404")),
            Some(SkipReason::AcquisitionFailed("HTTP 404".to_string()))
        );
        assert_eq!(
            SkipReason::from_error(&PipelineError::NoUsableFrames {
                id: "x".to_string(),
                examined: 7
            }),
            Some(SkipReason::NoHandsDetected { frames_examined: 7 })
        );
        let err: PipelineError = SignTypesError::invalid_sample("x", "no frames").into();
        assert!(!err.is_fatal());
    }

    #[test]
    fn io_and_collisions_are_fatal() {
        let io: PipelineError = std::io::Error::other("disk full").into();
        assert!(io.is_fatal());
        let collision: PipelineError = DatasetError::label_collision("a b", "a_b", "a_b").into();
        assert!(collision.is_fatal());
    }

    #[test]
    fn skip_reason_display() {
        let reason = SkipReason::NoHandsDetected { frames_examined: 4 };
        assert_eq!(reason.to_string(), "no hands detected in 4 frames");
    }
}
