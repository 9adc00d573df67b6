//! External collaborators: video acquisition, decoding and hand detection.
//!
//! Implementations live outside this crate (a downloader, a video decoder,
//! a landmark model). The pipeline only depends on these traits.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sign_types::Landmark;

use crate::corpus::CorpusEntry;
use crate::error::{PipelineError, Result};

/// One decoded video frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Position in the decoded video (0-based).
    pub index: usize,
    /// Encoded image bytes, stored verbatim as the frame image.
    pub image: Vec<u8>,
}

impl RawFrame {
    /// Creates a frame.
    #[must_use]
    pub const fn new(index: usize, image: Vec<u8>) -> Self {
        Self { index, image }
    }
}

/// One detected hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandDetection {
    /// Raw landmarks in image-normalized coordinates.
    pub landmarks: Vec<Landmark>,
    /// Detection confidence, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl HandDetection {
    /// Creates a detection without a score.
    #[must_use]
    pub const fn new(landmarks: Vec<Landmark>) -> Self {
        Self {
            landmarks,
            score: None,
        }
    }

    /// Sets the score.
    #[must_use]
    pub const fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }
}

/// Fetches a corpus clip to a local file.
pub trait VideoSource {
    /// Downloads the clip of `entry` to `dest`.
    ///
    /// # Errors
    ///
    /// Any error is treated as an acquisition failure for this entry,
    /// except [`PipelineError::MissingAsset`], which aborts the run.
    fn fetch(&self, entry: &CorpusEntry, dest: &Path) -> Result<()>;
}

/// Decodes a local video into frames.
pub trait FrameDecoder {
    /// Decodes every frame of `video` in order.
    ///
    /// # Errors
    ///
    /// Any error is treated as a decode failure for this entry, except
    /// [`PipelineError::MissingAsset`].
    fn decode(&self, video: &Path) -> Result<Vec<RawFrame>>;
}

/// A live hand-landmark detector.
///
/// Dropping the detector releases it.
pub trait HandDetector {
    /// Detects hands in `frame`, most prominent first. An empty list is a
    /// detection miss.
    ///
    /// # Errors
    ///
    /// Any error is treated as a detector failure for this entry.
    fn detect(&mut self, frame: &RawFrame) -> Result<Vec<HandDetection>>;
}

/// Opens one detector per sample.
pub trait DetectorFactory {
    /// Detector type.
    type Detector: HandDetector;

    /// Checks required assets before any sample is processed.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingAsset`] if the model is absent.
    fn check(&self) -> Result<()> {
        Ok(())
    }

    /// Opens a detector.
    ///
    /// # Errors
    ///
    /// [`PipelineError::MissingAsset`] aborts the run; other errors skip
    /// the current entry.
    fn open(&self) -> Result<Self::Detector>;
}

/// Fails with [`PipelineError::MissingAsset`] unless `path` is a file.
///
/// # Errors
///
/// See above.
pub fn require_asset(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::missing_asset(path))
    }
}
