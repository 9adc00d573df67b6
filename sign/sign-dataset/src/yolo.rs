//! Detection dataset assembly from label shards.
//!
//! The assembler walks the class vocabulary in id order, reads each class's
//! shard, re-encodes every frame's box with the class's global id and lays
//! the result out as a YOLO dataset:
//!
//! ```text
//! <output>/
//!     dataset.yaml
//!     images/train/  labels/train/
//!     images/val/    labels/val/      (holdout split only)
//! ```

use std::fs;
use std::path::{Component, Path, PathBuf};

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sign_types::BoundingBoxEncoder;
use tracing::{debug, info, warn};

use crate::class_index::ClassIndex;
use crate::error::{DatasetError, Result};
use crate::manifest::{DEFAULT_TRAIN_SUBPATH, DatasetManifest, DatasetManifestBuilder, MANIFEST_FILE_NAME};
use crate::shard::{DEFAULT_IMAGE_EXTENSION, ShardReader, sanitize_label};

const VAL_SUBPATH: &str = "images/val";

/// How samples are divided between train and validation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Everything goes to `train` and the manifest's `val` points at the
    /// training images.
    #[default]
    Placeholder,

    /// Per-class, sample-level split with a seeded shuffle.
    Holdout {
        /// Proportion of each class's samples used for training, in `(0, 1)`.
        train_ratio: f32,
        /// Shuffle seed.
        seed: u64,
    },
}

impl SplitPolicy {
    /// Creates a holdout split.
    #[must_use]
    pub const fn holdout(train_ratio: f32, seed: u64) -> Self {
        Self::Holdout { train_ratio, seed }
    }

    /// Checks the train ratio is in `(0, 1)`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidConfig`] otherwise.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Placeholder => Ok(()),
            Self::Holdout { train_ratio, .. } if train_ratio > 0.0 && train_ratio < 1.0 => Ok(()),
            Self::Holdout { train_ratio, .. } => Err(DatasetError::invalid_config(format!(
                "train ratio must be in (0, 1), got {train_ratio}"
            ))),
        }
    }

    /// Splits `ids` (sorted) into train and validation for class `class_id`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn split(&self, mut ids: Vec<String>, class_id: u32) -> (Vec<String>, Vec<String>) {
        match *self {
            Self::Placeholder => (ids, Vec::new()),
            Self::Holdout { train_ratio, seed } => {
                ids.sort();
                let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(u64::from(class_id)));
                ids.shuffle(&mut rng);
                let split_point = ((ids.len() as f32 * train_ratio).round() as usize).min(ids.len());
                let val = ids.split_off(split_point);
                (ids, val)
            }
        }
    }
}

/// Which split a frame was written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Split {
    Train,
    Val,
}

impl Split {
    const fn name(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Val => "val",
        }
    }
}

/// Result of a dataset assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblySummary {
    /// Classes with a shard.
    pub classes_processed: usize,
    /// Labels without a shard.
    pub classes_skipped: Vec<String>,
    /// Samples read.
    pub samples: usize,
    /// Frames written to `train`.
    pub train_frames: usize,
    /// Frames written to `val`.
    pub val_frames: usize,
    /// Frames dropped (no landmarks or no image).
    pub dropped_frames: usize,
    /// Manifest written to `dataset.yaml`.
    pub manifest: DatasetManifest,
}

/// Builds a YOLO detection dataset from label shards.
///
/// # Example
///
/// ```no_run
/// use sign_dataset::{ClassIndex, ShardReader, SplitPolicy, YoloDatasetAssembler};
///
/// let index = ClassIndex::new(["hello", "yes"]).unwrap();
/// let summary = YoloDatasetAssembler::new("data/yolo")
///     .with_split(SplitPolicy::holdout(0.8, 42))
///     .assemble(&ShardReader::new("data/shards"), &index)
///     .unwrap();
/// println!("{} train frames", summary.train_frames);
/// ```
#[derive(Debug, Clone)]
pub struct YoloDatasetAssembler {
    output_dir: PathBuf,
    encoder: BoundingBoxEncoder,
    split: SplitPolicy,
    image_extension: String,
}

impl YoloDatasetAssembler {
    /// Creates an assembler writing to `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            encoder: BoundingBoxEncoder::default(),
            split: SplitPolicy::default(),
            image_extension: DEFAULT_IMAGE_EXTENSION.to_string(),
        }
    }

    /// Sets the box encoder.
    #[must_use]
    pub const fn with_encoder(mut self, encoder: BoundingBoxEncoder) -> Self {
        self.encoder = encoder;
        self
    }

    /// Sets the split policy.
    #[must_use]
    pub const fn with_split(mut self, split: SplitPolicy) -> Self {
        self.split = split;
        self
    }

    /// Sets the image file extension (without the dot).
    #[must_use]
    pub fn with_image_extension(mut self, extension: impl Into<String>) -> Self {
        self.image_extension = extension.into();
        self
    }

    /// Output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Clears the output directory and assembles the dataset.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidConfig`] if the split is invalid or the
    /// output directory and the shard root overlap (compared after
    /// resolving both paths), and IO or serialization errors from reading
    /// shards or writing output.
    pub fn assemble(&self, reader: &ShardReader, index: &ClassIndex) -> Result<AssemblySummary> {
        self.split.validate()?;
        let output_root = resolve_path(&self.output_dir)?;
        let shard_root = resolve_path(reader.root())?;
        if shard_root.starts_with(&output_root) || output_root.starts_with(&shard_root) {
            return Err(DatasetError::invalid_config(format!(
                "output {} overlaps shard root {}",
                output_root.display(),
                shard_root.display()
            )));
        }

        if self.output_dir.exists() {
            fs::remove_dir_all(&self.output_dir)?;
        }
        let mut splits = vec![Split::Train];
        if matches!(self.split, SplitPolicy::Holdout { .. }) {
            splits.push(Split::Val);
        }
        for split in &splits {
            fs::create_dir_all(self.images_dir(*split))?;
            fs::create_dir_all(self.labels_dir(*split))?;
        }

        let mut classes_processed = 0;
        let mut classes_skipped = Vec::new();
        let mut samples = 0;
        let mut train_frames = 0;
        let mut val_frames = 0;
        let mut dropped_frames = 0;

        for (class_id, label) in index.iter() {
            if !reader.has_shard(label) {
                warn!(label, "No shard for class, skipping");
                classes_skipped.push(label.to_string());
                continue;
            }
            let ids = reader.sample_ids(label)?;
            let (train, val) = self.split.split(ids, class_id);
            info!(
                label,
                class_id,
                train = train.len(),
                val = val.len(),
                "Assembling class"
            );

            for (split, ids) in [(Split::Train, train), (Split::Val, val)] {
                for sample_id in ids {
                    let counts = self.copy_sample(reader, label, class_id, &sample_id, split)?;
                    samples += 1;
                    dropped_frames += counts.dropped;
                    match split {
                        Split::Train => train_frames += counts.written,
                        Split::Val => val_frames += counts.written,
                    }
                }
            }
            classes_processed += 1;
        }

        let mut builder = DatasetManifestBuilder::new(output_root).with_train(DEFAULT_TRAIN_SUBPATH);
        if splits.contains(&Split::Val) {
            builder = builder.with_val(VAL_SUBPATH);
        }
        let manifest = builder.build(index);
        manifest.write(&self.output_dir.join(MANIFEST_FILE_NAME))?;

        info!(
            classes_processed,
            skipped = classes_skipped.len(),
            train_frames,
            val_frames,
            "Detection dataset assembled"
        );

        Ok(AssemblySummary {
            classes_processed,
            classes_skipped,
            samples,
            train_frames,
            val_frames,
            dropped_frames,
            manifest,
        })
    }

    fn copy_sample(
        &self,
        reader: &ShardReader,
        label: &str,
        class_id: u32,
        sample_id: &str,
        split: Split,
    ) -> Result<FrameCounts> {
        let record = reader.read_sample(label, sample_id)?;
        let prefix = sanitize_label(label);
        let mut counts = FrameCounts::default();

        for (i, frame) in record.frames.iter().enumerate() {
            let Ok(yolo_box) = self.encoder.encode(&frame.landmarks, class_id) else {
                debug!(sample_id, frame = i, "Frame has no landmarks, dropped");
                counts.dropped += 1;
                continue;
            };
            let source = reader.image_path(label, sample_id, i);
            if !source.is_file() {
                warn!(path = %source.display(), "Frame image missing, dropped");
                counts.dropped += 1;
                continue;
            }

            let stem = format!("{prefix}_{sample_id}_{i}");
            fs::copy(
                &source,
                self.images_dir(split)
                    .join(format!("{stem}.{}", self.image_extension)),
            )?;
            fs::write(
                self.labels_dir(split).join(format!("{stem}.txt")),
                format!("{yolo_box}\n"),
            )?;
            counts.written += 1;
        }
        Ok(counts)
    }

    fn images_dir(&self, split: Split) -> PathBuf {
        self.output_dir.join("images").join(split.name())
    }

    fn labels_dir(&self, split: Split) -> PathBuf {
        self.output_dir.join("labels").join(split.name())
    }
}

/// Absolute form of `path` with `.` and `..` folded and symlinks resolved
/// on the longest prefix that exists.
fn resolve_path(path: &Path) -> Result<PathBuf> {
    let mut lexical = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                lexical.pop();
            }
            other => lexical.push(other),
        }
    }

    let mut existing = lexical.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return Ok(lexical),
        }
    }
    let mut resolved = fs::canonicalize(existing)?;
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

#[derive(Debug, Clone, Copy, Default)]
struct FrameCounts {
    written: usize,
    dropped: usize,
}
