//! Turns decoded frames of one clip into a sample.

use serde::{Deserialize, Serialize};
use sign_dataset::ShardRecord;
use sign_types::{
    BoundingBoxEncoder, DEFAULT_BOX_PADDING, Frame, HandLandmarks, Sample, SampleType, normalize,
};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::source::{HandDetector, RawFrame};

/// Per-sample processing settings.
///
/// # Example
///
/// ```
/// use sign_pipeline::ProcessorConfig;
///
/// let config = ProcessorConfig::default().with_frame_stride(5);
/// assert_eq!(config.frame_interval_ms, 33);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Every `frame_stride`-th decoded frame is sent to the detector.
    pub frame_stride: usize,

    /// Milliseconds per decoded frame.
    pub frame_interval_ms: u64,

    /// Fractional box padding.
    pub box_padding: f32,

    /// Type tag given to produced samples.
    pub sample_type: SampleType,

    /// Which detected hand to keep (0 = most prominent).
    pub hand_index: usize,

    /// Detections scoring below this are treated as misses.
    pub min_score: Option<f32>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            frame_stride: 3,
            frame_interval_ms: 33,
            box_padding: DEFAULT_BOX_PADDING,
            sample_type: SampleType::Dynamic,
            hand_index: 0,
            min_score: None,
        }
    }
}

impl ProcessorConfig {
    /// Sets the frame stride.
    #[must_use]
    pub const fn with_frame_stride(mut self, frame_stride: usize) -> Self {
        self.frame_stride = frame_stride;
        self
    }

    /// Sets the frame interval.
    #[must_use]
    pub const fn with_frame_interval_ms(mut self, frame_interval_ms: u64) -> Self {
        self.frame_interval_ms = frame_interval_ms;
        self
    }

    /// Sets the sample type.
    #[must_use]
    pub const fn with_sample_type(mut self, sample_type: SampleType) -> Self {
        self.sample_type = sample_type;
        self
    }

    /// Sets the minimum detection score.
    #[must_use]
    pub const fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    /// Checks every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.frame_stride == 0 {
            return Err(PipelineError::invalid_config("frame_stride must be positive"));
        }
        if !(0.0..=1.0).contains(&self.box_padding) {
            return Err(PipelineError::invalid_config(format!(
                "box_padding must be in [0, 1], got {}",
                self.box_padding
            )));
        }
        if self.min_score.is_some_and(|s| !(0.0..=1.0).contains(&s)) {
            return Err(PipelineError::invalid_config("min_score must be in [0, 1]"));
        }
        Ok(())
    }
}

/// Frame accounting for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FrameStats {
    /// Frames produced by the decoder.
    pub decoded: usize,
    /// Frames sent to the detector.
    pub examined: usize,
    /// Examined frames with no (or a low-scoring) detection.
    pub misses: usize,
    /// Detections without exactly 21 landmarks.
    pub wrong_cardinality: usize,
    /// Kept frames whose normalization scale was zero (raw landmarks
    /// stand in for the normalized ones).
    pub degenerate: usize,
    /// Frames kept.
    pub kept: usize,
}

/// A sample with its per-frame images and YOLO label lines.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSample {
    /// The sample.
    pub sample: Sample,
    /// One YOLO line per frame, with the class id of the sample's label.
    pub yolo_labels: Vec<String>,
    /// One encoded image per frame.
    pub images: Vec<Vec<u8>>,
    /// Frame accounting.
    pub stats: FrameStats,
}

impl ProcessedSample {
    /// Shard record for this sample.
    #[must_use]
    pub fn shard_record(&self) -> ShardRecord {
        ShardRecord::from_sample(&self.sample, self.yolo_labels.clone())
    }
}

/// Converts decoded frames of one clip into a [`ProcessedSample`].
#[derive(Debug, Clone)]
pub struct SampleProcessor {
    config: ProcessorConfig,
    encoder: BoundingBoxEncoder,
}

impl SampleProcessor {
    /// Creates a processor.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for a bad config.
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        config.validate()?;
        let encoder = BoundingBoxEncoder::new(config.box_padding)?;
        Ok(Self { config, encoder })
    }

    /// Processor settings.
    #[must_use]
    pub const fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Runs detection over the strided frames and builds the sample.
    ///
    /// Misses and detections without 21 landmarks are dropped frame by
    /// frame.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::NoUsableFrames`] if every frame is dropped,
    /// and propagates detector errors.
    pub fn process<D: HandDetector + ?Sized>(
        &self,
        id: &str,
        label: &str,
        class_id: u32,
        frames: &[RawFrame],
        detector: &mut D,
    ) -> Result<ProcessedSample> {
        let mut stats = FrameStats {
            decoded: frames.len(),
            ..FrameStats::default()
        };
        let mut kept = Vec::new();
        let mut yolo_labels = Vec::new();
        let mut images = Vec::new();

        for raw in frames.iter().filter(|f| f.index % self.config.frame_stride == 0) {
            stats.examined += 1;
            let detections = detector.detect(raw)?;
            let Some(detection) = detections.get(self.config.hand_index) else {
                stats.misses += 1;
                continue;
            };
            if let (Some(min), Some(score)) = (self.config.min_score, detection.score) {
                if score < min {
                    stats.misses += 1;
                    continue;
                }
            }
            let Ok(hand) = HandLandmarks::try_new(detection.landmarks.clone()) else {
                stats.wrong_cardinality += 1;
                continue;
            };
            let norm = normalize(&hand);
            let degenerate = norm.is_degenerate();
            if degenerate {
                debug!(id, frame = raw.index, "Degenerate hand scale, raw landmarks kept");
                stats.degenerate += 1;
            }

            let yolo_box = self.encoder.encode(hand.as_slice(), class_id)?;
            let t = u64::try_from(raw.index)
                .unwrap_or(u64::MAX)
                .saturating_mul(self.config.frame_interval_ms);
            let mut frame = Frame::new(t, hand.into_inner(), norm.landmarks.as_slice().to_vec());
            if !degenerate {
                frame = frame.with_finger_features(&norm.landmarks);
            }
            frame.score = detection.score;

            kept.push(frame);
            yolo_labels.push(yolo_box.to_line());
            images.push(raw.image.clone());
        }

        stats.kept = kept.len();
        debug!(
            id,
            decoded = stats.decoded,
            examined = stats.examined,
            kept = stats.kept,
            "Frames processed"
        );
        if kept.is_empty() {
            return Err(PipelineError::NoUsableFrames {
                id: id.to_string(),
                examined: stats.examined,
            });
        }

        let duration_ms = u64::try_from(frames.len())
            .unwrap_or(u64::MAX)
            .saturating_mul(self.config.frame_interval_ms);
        let sample = Sample::new(id, label, self.config.sample_type)
            .with_frames(kept)
            .with_duration_ms(duration_ms)
            .summarized()
            .stamped_now();
        sample.validate()?;

        Ok(ProcessedSample {
            sample,
            yolo_labels,
            images,
            stats,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::source::HandDetection;
    use sign_types::{Handedness, Landmark};

    /// Answers from a script indexed by frame index.
    struct Scripted(Vec<Vec<HandDetection>>);

    impl HandDetector for Scripted {
        fn detect(&mut self, frame: &RawFrame) -> Result<Vec<HandDetection>> {
            Ok(self.0.get(frame.index).cloned().unwrap_or_default())
        }
    }

    fn hand() -> HandDetection {
        let mut points = vec![Landmark::new(0.5, 0.5, 0.0); 21];
        points[HandLandmarks::MIDDLE_MCP] = Landmark::new(0.5, 0.4, 0.0);
        points[HandLandmarks::INDEX_TIP] = Landmark::new(0.6, 0.6, 0.0);
        HandDetection::new(points)
    }

    fn frames(n: usize) -> Vec<RawFrame> {
        (0..n).map(|i| RawFrame::new(i, vec![u8::try_from(i).unwrap()])).collect()
    }

    #[test]
    fn strided_frames_and_timing() {
        let processor = SampleProcessor::new(ProcessorConfig::default()).unwrap();
        let mut detector = Scripted(vec![vec![hand()]; 10]);
        let out = processor.process("abc", "hello", 4, &frames(10), &mut detector).unwrap();

        let ts: Vec<u64> = out.sample.frames.iter().map(|f| f.t).collect();
        assert_eq!(ts, vec![0, 99, 198, 297]);
        assert_eq!(out.sample.summary.duration_ms, 330);
        assert_eq!(out.sample.sample_type, SampleType::Dynamic);
        assert_eq!(out.sample.handedness, Handedness::Unknown);
        assert!(out.sample.timestamp.is_some());
        assert_eq!(out.images, vec![vec![0], vec![3], vec![6], vec![9]]);
        assert!(out.yolo_labels.iter().all(|l| l.starts_with("4 ")));
        assert_eq!(out.stats.examined, 4);
        assert_eq!(out.stats.kept, 4);
        assert_eq!(out.sample.frames[0].features.norm[0], Landmark::ORIGIN);

        let states = out.sample.frames[0].features.finger_state.as_ref().unwrap();
        assert_eq!(states.len(), 5);
        assert!(states.values().all(|s| s == "extended" || s == "curled"));
        let median = out.sample.summary.median_norm.as_ref().unwrap();
        assert_eq!(median, &out.sample.frames[0].features.norm);
        assert_eq!(out.sample.summary.mean_angles.as_ref().unwrap().len(), 5);
    }

    #[test]
    fn misses_dropped_and_degenerate_kept() {
        let mut short = hand();
        short.landmarks.truncate(20);
        let flat = HandDetection::new(vec![Landmark::new(0.3, 0.3, 0.0); 21]);
        let script = vec![
            vec![hand()],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
            vec![short],
            vec![],
            vec![],
            vec![flat],
        ];
        let processor = SampleProcessor::new(ProcessorConfig::default()).unwrap();
        let out = processor
            .process("abc", "hello", 0, &frames(10), &mut Scripted(script))
            .unwrap();
        assert_eq!(out.stats.kept, 2);
        assert_eq!(out.stats.misses, 1);
        assert_eq!(out.stats.wrong_cardinality, 1);
        assert_eq!(out.stats.degenerate, 1);
        assert_eq!(out.shard_record().frame_count(), 2);

        let flat_frame = &out.sample.frames[1];
        assert_eq!(flat_frame.t, 297);
        assert_eq!(flat_frame.features.norm, flat_frame.landmarks);
        assert!(flat_frame.features.finger_state.is_none());
        assert!(flat_frame.features.angles.is_none());
        assert!(out.sample.frames[0].features.finger_state.is_some());
    }

    #[test]
    fn low_scores_are_misses() {
        let config = ProcessorConfig::default().with_frame_stride(1).with_min_score(0.5);
        let processor = SampleProcessor::new(config).unwrap();
        let script = vec![vec![hand().with_score(0.2)], vec![hand().with_score(0.8)]];
        let out = processor
            .process("abc", "hello", 0, &frames(2), &mut Scripted(script))
            .unwrap();
        assert_eq!(out.stats.kept, 1);
        assert_eq!(out.sample.frames[0].score, Some(0.8));
    }

    #[test]
    fn no_hands_is_error() {
        let processor = SampleProcessor::new(ProcessorConfig::default()).unwrap();
        let err = processor
            .process("abc", "hello", 0, &frames(6), &mut Scripted(Vec::new()))
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoUsableFrames { examined: 2, .. }));
    }

    #[test]
    fn invalid_config() {
        assert!(SampleProcessor::new(ProcessorConfig::default().with_frame_stride(0)).is_err());
        let mut config = ProcessorConfig::default();
        config.box_padding = -0.1;
        assert!(config.validate().is_err());
    }
}
