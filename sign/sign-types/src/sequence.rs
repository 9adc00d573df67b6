//! Fixed-length temporal windows over per-frame feature vectors.
//!
//! Dataset preparation and evaluation both build their windows through
//! [`SequenceAssembler`], so the padding policy exists in one place.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignTypesError};
use crate::feature::{FeatureVector, VECTOR_SIZE};

/// Default number of frames in a dynamic-sign window.
pub const DEFAULT_WINDOW_SIZE: usize = 30;

/// Truncates or pads a frame sequence to exactly `window_size` frames.
///
/// - Longer input keeps the first `window_size` frames.
/// - Shorter input repeats its last frame.
/// - Empty input becomes `window_size` all-zero vectors.
///
/// # Example
///
/// ```
/// use sign_types::{FeatureVector, SequenceAssembler};
///
/// let assembler = SequenceAssembler::default();
/// let window = assembler.assemble(&[FeatureVector::zeros(63)]).unwrap();
/// assert_eq!(window.len(), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceAssembler {
    window_size: usize,
    vector_size: usize,
}

impl Default for SequenceAssembler {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            vector_size: VECTOR_SIZE,
        }
    }
}

impl SequenceAssembler {
    /// Creates an assembler.
    ///
    /// # Errors
    ///
    /// Returns [`SignTypesError::InvalidConfig`] if either size is zero.
    pub fn new(window_size: usize, vector_size: usize) -> Result<Self> {
        if window_size == 0 {
            return Err(SignTypesError::invalid_config("window size must be > 0"));
        }
        if vector_size == 0 {
            return Err(SignTypesError::invalid_config("vector size must be > 0"));
        }
        Ok(Self {
            window_size,
            vector_size,
        })
    }

    /// Frames per window.
    #[must_use]
    pub const fn window_size(&self) -> usize {
        self.window_size
    }

    /// Values per frame.
    #[must_use]
    pub const fn vector_size(&self) -> usize {
        self.vector_size
    }

    /// Builds the window.
    ///
    /// # Errors
    ///
    /// Returns [`SignTypesError::ShapeMismatch`] if any input frame does
    /// not have `vector_size` values; such sequences are rejected rather
    /// than reshaped.
    pub fn assemble(&self, frames: &[FeatureVector]) -> Result<Vec<FeatureVector>> {
        for frame in frames {
            frame.ensure_len(self.vector_size)?;
        }

        let mut window: Vec<FeatureVector> = frames.iter().take(self.window_size).cloned().collect();
        let filler = window
            .last()
            .cloned()
            .unwrap_or_else(|| FeatureVector::zeros(self.vector_size));
        window.resize(self.window_size, filler);
        Ok(window)
    }

    /// Builds the window and flattens it row-major into
    /// `window_size * vector_size` values.
    ///
    /// # Errors
    ///
    /// Same as [`Self::assemble`].
    pub fn assemble_flat(&self, frames: &[FeatureVector]) -> Result<Vec<f32>> {
        let window = self.assemble(frames)?;
        let mut flat = Vec::with_capacity(self.window_size * self.vector_size);
        for frame in window {
            flat.extend(frame.into_inner());
        }
        Ok(flat)
    }
}
