//! Flattened per-frame feature vectors.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignTypesError};
use crate::landmark::{HAND_LANDMARK_COUNT, HandLandmarks, Landmark};

/// Length of a hand feature vector: 21 landmarks × (x, y, z).
pub const VECTOR_SIZE: usize = HAND_LANDMARK_COUNT * 3;

/// Flattened `(x, y, z)` triples for one frame.
///
/// # Example
///
/// ```
/// use sign_types::{FeatureVector, Landmark, VECTOR_SIZE};
///
/// let v = FeatureVector::from_landmarks(&[Landmark::new(1.0, 2.0, 3.0); 21]);
/// assert_eq!(v.len(), VECTOR_SIZE);
/// assert_eq!(&v.as_slice()[..3], &[1.0, 2.0, 3.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    /// Flattens landmarks in order.
    #[must_use]
    pub fn from_landmarks(landmarks: &[Landmark]) -> Self {
        Self(landmarks.iter().flat_map(Landmark::as_array).collect())
    }

    /// Flattens a full hand; the result always has [`VECTOR_SIZE`] values.
    #[must_use]
    pub fn from_hand(hand: &HandLandmarks) -> Self {
        Self::from_landmarks(hand.as_slice())
    }

    /// Wraps raw values, rejecting any length other than `expected_len`.
    ///
    /// # Errors
    ///
    /// Returns [`SignTypesError::ShapeMismatch`] on a length mismatch.
    pub fn try_from_values(values: Vec<f32>, expected_len: usize) -> Result<Self> {
        if values.len() == expected_len {
            Ok(Self(values))
        } else {
            Err(SignTypesError::shape_mismatch(expected_len, values.len()))
        }
    }

    /// All-zero vector of the given length.
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self(vec![0.0; len])
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the vector holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the values.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Consumes the vector and returns the values.
    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Checks the length against `expected_len`.
    ///
    /// # Errors
    ///
    /// Returns [`SignTypesError::ShapeMismatch`] on a length mismatch.
    pub fn ensure_len(&self, expected_len: usize) -> Result<()> {
        if self.0.len() == expected_len {
            Ok(())
        } else {
            Err(SignTypesError::shape_mismatch(expected_len, self.0.len()))
        }
    }
}

impl AsRef<[f32]> for FeatureVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}
