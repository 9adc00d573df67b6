//! Sign-language dataset types.
//!
//! This crate provides the pure data transforms every downstream model
//! depends on:
//!
//! # Landmarks
//!
//! - [`Landmark`] - A tracked `(x, y, z)` point
//! - [`HandLandmarks`] - Exactly 21 landmarks in detector order
//! - [`normalize`] - Wrist-anchored, hand-scale normalization
//!
//! # Features
//!
//! - [`FeatureVector`] - Flattened 63-value frame vector
//! - [`SequenceAssembler`] - Fixed 30-frame windows for dynamic signs
//! - [`Finger`], [`FingerState`] - Joint angles and extended/curled state
//!
//! # Detection Labels
//!
//! - [`BoundingBoxEncoder`] - Padded, clamped boxes from landmarks
//! - [`YoloBox`] - `"<class> <xc> <yc> <w> <h>"` label lines
//!
//! # Dataset Schema
//!
//! - [`Sample`], [`Frame`], [`SampleType`] - Processed sample records
//! - [`ProcessedDataset`], [`DatasetMeta`] - The dataset document
//!
//! # Layer 0 Crate
//!
//! No I/O happens here. Storage lives in `sign-dataset`, orchestration in
//! `sign-pipeline`.
//!
//! # Example
//!
//! ```
//! use sign_types::{normalize, BoundingBoxEncoder, FeatureVector, HandLandmarks, Landmark};
//!
//! let mut points = vec![Landmark::new(0.4, 0.6, 0.0); 21];
//! points[HandLandmarks::MIDDLE_MCP] = Landmark::new(0.4, 0.4, 0.0);
//! let hand = HandLandmarks::try_new(points).unwrap();
//!
//! let norm = normalize(&hand);
//! let features = FeatureVector::from_hand(&norm.landmarks);
//! assert_eq!(features.len(), 63);
//!
//! let label = BoundingBoxEncoder::default().encode(hand.as_slice(), 4).unwrap();
//! assert_eq!(label.class_id, 4);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bbox;
mod error;
mod feature;
mod finger;
mod landmark;
mod sample;
mod sequence;

pub use bbox::{BoundingBoxEncoder, DEFAULT_BOX_PADDING, YoloBox};
pub use feature::{FeatureVector, VECTOR_SIZE};
pub use finger::{Finger, FingerState, joint_angle};
pub use landmark::{HAND_LANDMARK_COUNT, HandLandmarks, Landmark, NormalizedHand, normalize};
pub use sample::{
    DatasetMeta, Frame, FrameFeatures, Handedness, ProcessedDataset, Sample, SampleSummary,
    SampleType,
};
pub use sequence::{DEFAULT_WINDOW_SIZE, SequenceAssembler};

pub use error::{Result, SignTypesError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        BoundingBoxEncoder, FeatureVector, Finger, Frame, HandLandmarks, Landmark, ProcessedDataset,
        Sample, SampleType, SequenceAssembler, SignTypesError, YoloBox, normalize,
    };
}
