//! Vocabulary, sharded storage and manifests for sign-language datasets.
//!
//! # Vocabulary
//!
//! - [`LabelRanker`] - Frequency ranking with case-insensitive exclusions
//! - [`LabelCounts`] - Ordered label counts (first-seen tie-break)
//! - [`ClassIndex`] - Immutable label ↔ id mapping
//! - [`write_label_list`] / [`read_label_list`] - The top-N list file
//!
//! # Shards
//!
//! - [`ShardedDatasetWriter`] - Per-label directories of samples, images
//!   and YOLO label files
//! - [`ShardReader`] - Reads shards back
//! - [`sanitize_label`] / [`check_shard_collisions`] - Directory naming
//!
//! # Detection Dataset
//!
//! - [`DatasetManifestBuilder`] / [`DatasetManifest`] - `dataset.yaml`
//! - [`YoloDatasetAssembler`] - Shards → `images/` + `labels/` splits
//!
//! # Classifier Data
//!
//! - [`StaticFeatureSet`] - Per-frame vectors of static signs
//! - [`SequenceSet`] - Fixed windows of dynamic signs
//!
//! # Example
//!
//! ```
//! use sign_dataset::{ClassIndex, DatasetManifestBuilder, LabelRanker};
//!
//! let observations = ["hello", "yes", "thank you", "yes", "thank you", "yes"];
//! let ranked = LabelRanker::new(2)
//!     .with_exclusions(LabelRanker::DEFAULT_EXCLUSIONS)
//!     .rank(observations);
//! let index = ClassIndex::from_ranked(&ranked).unwrap();
//! assert_eq!(index.labels(), ["yes", "thank you"]);
//!
//! let manifest = DatasetManifestBuilder::new("/data/yolo").build(&index);
//! assert_eq!(manifest.names[&0], "yes");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod class_index;
mod config;
mod error;
mod manifest;
mod processed;
mod ranking;
mod shard;
mod training;
mod yolo;

pub use class_index::ClassIndex;
pub use config::DatasetConfig;
pub use manifest::{DEFAULT_TRAIN_SUBPATH, DatasetManifest, DatasetManifestBuilder, MANIFEST_FILE_NAME};
pub use processed::{load_processed_dataset, save_processed_dataset};
pub use ranking::{LabelCounts, LabelRanker, RankedLabel, read_label_list, write_label_list};
pub use shard::{
    DEFAULT_IMAGE_EXTENSION, SampleLocation, ShardReader, ShardRecord, ShardedDatasetWriter,
    check_shard_collisions, sanitize_label,
};
pub use training::{SequenceSet, StaticFeatureSet};
pub use yolo::{AssemblySummary, SplitPolicy, YoloDatasetAssembler};

pub use error::{DatasetError, Result};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        ClassIndex, DatasetConfig, DatasetError, DatasetManifest, DatasetManifestBuilder,
        LabelRanker, RankedLabel, SequenceSet, ShardReader, ShardRecord, ShardedDatasetWriter,
        SplitPolicy, StaticFeatureSet, YoloDatasetAssembler,
    };
}
