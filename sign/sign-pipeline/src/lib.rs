//! Per-sample processing driver for sign-language video corpora.
//!
//! The pipeline is single-threaded: each corpus entry is fetched, decoded,
//! run through the hand detector, normalized, encoded and written to its
//! shard before the next entry starts.
//!
//! # Collaborators
//!
//! Acquisition, decoding and detection sit behind [`VideoSource`],
//! [`FrameDecoder`] and [`DetectorFactory`] / [`HandDetector`].
//!
//! # Error Taxonomy
//!
//! Per-entry failures (download, decode, detector, no usable frames) become
//! a [`SkipReason`] in the [`RunReport`]; only missing assets, vocabulary
//! collisions and IO failures stop a run.
//!
//! # Example
//!
//! ```
//! use sign_pipeline::{CorpusEntry, ProcessorConfig, SampleProcessor};
//!
//! let entry = CorpusEntry::new("abc123", 1.0, 2.5, "hello");
//! assert_eq!(entry.sample_id().len(), 16);
//!
//! let processor = SampleProcessor::new(ProcessorConfig::default()).unwrap();
//! assert_eq!(processor.config().frame_stride, 3);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod corpus;
mod error;
mod processor;
mod runner;
mod scratch;
mod source;

pub use corpus::{CorpusEntry, entries_for, load_corpus};
pub use processor::{FrameStats, ProcessedSample, ProcessorConfig, SampleProcessor};
pub use runner::{PipelineRunner, RunConfig, RunOutput, RunReport, SkippedEntry};
pub use scratch::SampleScratch;
pub use source::{
    DetectorFactory, FrameDecoder, HandDetection, HandDetector, RawFrame, VideoSource,
    require_asset,
};

pub use error::{PipelineError, Result, SkipReason};

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{
        CorpusEntry, DetectorFactory, FrameDecoder, HandDetection, HandDetector, PipelineError,
        PipelineRunner, ProcessorConfig, RawFrame, RunConfig, SampleProcessor, SkipReason,
        VideoSource,
    };
}
