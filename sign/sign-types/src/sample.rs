//! Processed dataset schema: frames, samples and the dataset document.
//!
//! Field names follow the JSON interchange format consumed by training
//! (`type`, `durationMs`, `createdAt`, ...).

use std::collections::BTreeMap;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SignTypesError};
use crate::feature::FeatureVector;
use crate::finger::Finger;
use crate::landmark::{HandLandmarks, Landmark};

/// Whether a sign is held (static) or involves motion (dynamic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SampleType {
    /// A held hand shape; every frame is an independent example.
    Static,
    /// A moving sign; frames form a temporal sequence.
    #[default]
    Dynamic,
}

impl SampleType {
    /// Returns the wire name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

impl std::fmt::Display for SampleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which hand was tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Handedness {
    /// Left hand.
    Left,
    /// Right hand.
    Right,
    /// Not reported by the detector.
    #[default]
    Unknown,
}

/// Derived per-frame features.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameFeatures {
    /// Wrist-anchored, hand-scale normalized landmarks.
    pub norm: Vec<Landmark>,

    /// Joint angles in degrees per finger name, base joint first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub angles: Option<BTreeMap<String, Vec<f32>>>,

    /// `"extended"` or `"curled"` per finger name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finger_state: Option<BTreeMap<String, String>>,
}

/// One retained video frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Milliseconds since the start of the sample.
    pub t: u64,

    /// Detection confidence, when the detector reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,

    /// Raw detector landmarks.
    pub landmarks: Vec<Landmark>,

    /// Derived features.
    #[serde(default)]
    pub features: FrameFeatures,
}

impl Frame {
    /// Creates a frame from raw and normalized landmarks.
    #[must_use]
    pub fn new(t: u64, landmarks: Vec<Landmark>, norm: Vec<Landmark>) -> Self {
        Self {
            t,
            score: None,
            landmarks,
            features: FrameFeatures {
                norm,
                ..FrameFeatures::default()
            },
        }
    }

    /// Sets the detection score.
    #[must_use]
    pub const fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// Fills the per-finger angles and states from `hand`.
    #[must_use]
    pub fn with_finger_features(mut self, hand: &HandLandmarks) -> Self {
        self.features.angles = Some(
            Finger::ALL
                .iter()
                .map(|&finger| (finger.name().to_string(), hand.joint_angles(finger)))
                .collect(),
        );
        self.features.finger_state = Some(
            hand.finger_states()
                .iter()
                .map(|state| (state.finger.name().to_string(), state.label().to_string()))
                .collect(),
        );
        self
    }

    /// Flattened normalized landmarks.
    #[must_use]
    pub fn feature_vector(&self) -> FeatureVector {
        FeatureVector::from_landmarks(&self.features.norm)
    }
}

/// Summary metadata derived from a sample's frames.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleSummary {
    /// Duration of the source clip in milliseconds.
    #[serde(default)]
    pub duration_ms: u64,

    /// Per-coordinate median of the normalized landmarks over all frames.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_norm: Option<Vec<Landmark>>,

    /// Per-finger mean joint angles over the frames that carry angles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_angles: Option<BTreeMap<String, Vec<f32>>>,
}

/// One labelled recording of a sign.
///
/// # Example
///
/// ```
/// use sign_types::{Frame, Landmark, Sample, SampleType};
///
/// let mut sample = Sample::new("s1", "hello", SampleType::Dynamic);
/// assert!(sample.validate().is_err()); // no frames yet
///
/// sample.frames.push(Frame::new(0, vec![Landmark::ORIGIN; 21], vec![Landmark::ORIGIN; 21]));
/// assert!(sample.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Opaque unique identifier.
    pub id: String,

    /// Human-readable sign name.
    pub label: String,

    /// Static or dynamic.
    #[serde(rename = "type")]
    pub sample_type: SampleType,

    /// Tracked hand.
    #[serde(default)]
    pub handedness: Handedness,

    /// Retained frames in time order.
    pub frames: Vec<Frame>,

    /// Derived metadata.
    #[serde(default)]
    pub summary: SampleSummary,

    /// Capture time (Unix milliseconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl Sample {
    /// Creates a sample with no frames.
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>, sample_type: SampleType) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            sample_type,
            handedness: Handedness::Unknown,
            frames: Vec::new(),
            summary: SampleSummary::default(),
            timestamp: None,
        }
    }

    /// Sets the frames.
    #[must_use]
    pub fn with_frames(mut self, frames: Vec<Frame>) -> Self {
        self.frames = frames;
        self
    }

    /// Sets the clip duration.
    #[must_use]
    pub const fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.summary.duration_ms = duration_ms;
        self
    }

    /// Fills `summary.medianNorm` and `summary.meanAngles` from the frames.
    ///
    /// Frames whose normalized landmark count differs from the first
    /// non-empty one are left out of the median.
    #[must_use]
    pub fn summarized(mut self) -> Self {
        self.summary.median_norm = median_norm(&self.frames);
        self.summary.mean_angles = mean_angles(&self.frames);
        self
    }

    /// Stamps the sample with the current wall-clock time.
    #[must_use]
    pub fn stamped_now(mut self) -> Self {
        self.timestamp = u64::try_from(Utc::now().timestamp_millis()).ok();
        self
    }

    /// Number of frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Per-frame feature vectors in time order.
    #[must_use]
    pub fn feature_vectors(&self) -> Vec<FeatureVector> {
        self.frames.iter().map(Frame::feature_vector).collect()
    }

    /// Checks the sample invariants.
    ///
    /// # Errors
    ///
    /// Returns [`SignTypesError::InvalidSample`] if the sample has no
    /// frames, frames disagree on landmark cardinality, or timestamps
    /// decrease.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.frames.first() else {
            return Err(SignTypesError::invalid_sample(&self.id, "sample has no frames"));
        };

        let cardinality = first.landmarks.len();
        let mut last_t = first.t;
        for (i, frame) in self.frames.iter().enumerate() {
            if frame.landmarks.len() != cardinality {
                return Err(SignTypesError::invalid_sample(
                    &self.id,
                    format!(
                        "frame {i} has {} landmarks, expected {cardinality}",
                        frame.landmarks.len()
                    ),
                ));
            }
            if frame.t < last_t {
                return Err(SignTypesError::invalid_sample(
                    &self.id,
                    format!("frame {i} timestamp {} precedes {last_t}", frame.t),
                ));
            }
            last_t = frame.t;
        }
        Ok(())
    }
}

fn median(values: &mut [f32]) -> f32 {
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn median_norm(frames: &[Frame]) -> Option<Vec<Landmark>> {
    let count = frames
        .iter()
        .map(|f| f.features.norm.len())
        .find(|&n| n > 0)?;
    let norms: Vec<&[Landmark]> = frames
        .iter()
        .map(|f| f.features.norm.as_slice())
        .filter(|norm| norm.len() == count)
        .collect();

    let mut xs = Vec::with_capacity(norms.len());
    let mut ys = Vec::with_capacity(norms.len());
    let mut zs = Vec::with_capacity(norms.len());
    let landmarks = (0..count)
        .map(|i| {
            xs.clear();
            ys.clear();
            zs.clear();
            for norm in &norms {
                xs.push(norm[i].x);
                ys.push(norm[i].y);
                zs.push(norm[i].z);
            }
            Landmark::new(median(&mut xs), median(&mut ys), median(&mut zs))
        })
        .collect();
    Some(landmarks)
}

fn mean_angles(frames: &[Frame]) -> Option<BTreeMap<String, Vec<f32>>> {
    let mut sums: BTreeMap<String, (Vec<f32>, usize)> = BTreeMap::new();
    for angles in frames.iter().filter_map(|f| f.features.angles.as_ref()) {
        for (finger, values) in angles {
            let (sum, count) = sums
                .entry(finger.clone())
                .or_insert_with(|| (vec![0.0; values.len()], 0));
            if sum.len() != values.len() {
                continue;
            }
            for (total, value) in sum.iter_mut().zip(values) {
                *total += *value;
            }
            *count += 1;
        }
    }
    if sums.is_empty() {
        return None;
    }
    Some(
        sums.into_iter()
            .map(|(finger, (sum, count))| {
                #[allow(clippy::cast_precision_loss)]
                let n = count as f32;
                (finger, sum.into_iter().map(|total| total / n).collect())
            })
            .collect(),
    )
}

/// Dataset-level metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetMeta {
    /// Dataset name.
    pub dataset: String,
    /// Dataset version.
    pub version: String,
    /// Creation time (RFC 3339).
    pub created_at: String,
    /// Source frame rate.
    pub fps: u32,
    /// Free-text notes.
    #[serde(default)]
    pub notes: String,
}

impl DatasetMeta {
    /// Default source frame rate.
    pub const DEFAULT_FPS: u32 = 30;

    /// Creates metadata stamped with the current time.
    #[must_use]
    pub fn new(dataset: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            version: version.into(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            fps: Self::DEFAULT_FPS,
            notes: String::new(),
        }
    }

    /// Sets the frame rate.
    #[must_use]
    pub const fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Sets the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

impl Default for DatasetMeta {
    fn default() -> Self {
        Self::new("sign-processed", "1.0")
    }
}

/// The processed dataset document handed to training.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessedDataset {
    /// Metadata.
    pub meta: DatasetMeta,
    /// Samples.
    pub samples: Vec<Sample>,
}

impl ProcessedDataset {
    /// Creates an empty dataset.
    #[must_use]
    pub const fn new(meta: DatasetMeta) -> Self {
        Self {
            meta,
            samples: Vec::new(),
        }
    }

    /// Appends a sample after validating it.
    ///
    /// # Errors
    ///
    /// Returns the validation error; the sample is not added.
    pub fn push(&mut self, sample: Sample) -> Result<()> {
        sample.validate()?;
        self.samples.push(sample);
        Ok(())
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterates over samples of one type.
    pub fn samples_of_type(&self, sample_type: SampleType) -> impl Iterator<Item = &Sample> {
        self.samples.iter().filter(move |s| s.sample_type == sample_type)
    }

    /// Iterates over sample labels in order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.samples.iter().map(|s| s.label.as_str())
    }
}
