//! The run loop: corpus entries in, shards and a processed dataset out.

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sign_dataset::{ClassIndex, ShardedDatasetWriter, check_shard_collisions};
use sign_types::{DatasetMeta, ProcessedDataset};
use tracing::{debug, info, warn};

use crate::corpus::{CorpusEntry, entries_for};
use crate::error::{PipelineError, Result, SkipReason};
use crate::processor::{ProcessedSample, SampleProcessor};
use crate::scratch::SampleScratch;
use crate::source::{DetectorFactory, FrameDecoder, VideoSource};

/// Run-level settings.
///
/// # Example
///
/// ```
/// use sign_pipeline::RunConfig;
///
/// let config = RunConfig::default().with_signs_limit(20);
/// assert_eq!(config.samples_per_sign, 10);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Only the first N vocabulary labels are processed (`None` = all).
    pub signs_limit: Option<usize>,

    /// Successful samples wanted per label.
    pub samples_per_sign: usize,

    /// Parent of the per-sample scratch directories (`None` = system temp).
    pub scratch_root: Option<PathBuf>,

    /// Name recorded in the dataset metadata.
    pub dataset_name: String,

    /// Version recorded in the dataset metadata.
    pub dataset_version: String,

    /// Notes recorded in the dataset metadata.
    pub notes: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            signs_limit: Some(5),
            samples_per_sign: 10,
            scratch_root: None,
            dataset_name: "msasl-processed".to_string(),
            dataset_version: "1.0".to_string(),
            notes: String::new(),
        }
    }
}

impl RunConfig {
    /// Sets the label limit.
    #[must_use]
    pub const fn with_signs_limit(mut self, limit: usize) -> Self {
        self.signs_limit = Some(limit);
        self
    }

    /// Processes every vocabulary label.
    #[must_use]
    pub const fn without_signs_limit(mut self) -> Self {
        self.signs_limit = None;
        self
    }

    /// Sets the samples wanted per label.
    #[must_use]
    pub const fn with_samples_per_sign(mut self, samples: usize) -> Self {
        self.samples_per_sign = samples;
        self
    }

    /// Sets the scratch root.
    #[must_use]
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Sets the dataset notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Checks every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.samples_per_sign == 0 {
            return Err(PipelineError::invalid_config("samples_per_sign must be positive"));
        }
        if self.dataset_name.trim().is_empty() {
            return Err(PipelineError::invalid_config("dataset_name is empty"));
        }
        Ok(())
    }
}

/// A corpus entry that produced no sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntry {
    /// The entry's label.
    pub label: String,
    /// The entry's watch URL.
    pub url: String,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// What happened during a run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// Ids of persisted samples, in processing order.
    pub processed: Vec<String>,
    /// Entries that were skipped.
    pub skipped: Vec<SkippedEntry>,
    /// Persisted samples per label.
    pub per_label: BTreeMap<String, usize>,
}

impl RunReport {
    /// Persisted samples for `label`.
    #[must_use]
    pub fn processed_for(&self, label: &str) -> usize {
        self.per_label.get(label).copied().unwrap_or(0)
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    /// Every persisted sample.
    pub dataset: ProcessedDataset,
    /// Run accounting.
    pub report: RunReport,
}

/// Drives sample processing one entry at a time.
///
/// Each entry gets its own scratch directory and detector, both released
/// before the next entry starts.
#[derive(Debug)]
pub struct PipelineRunner<S, D, F> {
    source: S,
    decoder: D,
    detectors: F,
    processor: SampleProcessor,
    config: RunConfig,
}

impl<S, D, F> PipelineRunner<S, D, F>
where
    S: VideoSource,
    D: FrameDecoder,
    F: DetectorFactory,
{
    /// Creates a runner.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] for a bad run config.
    pub fn new(
        source: S,
        decoder: D,
        detectors: F,
        processor: SampleProcessor,
        config: RunConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            decoder,
            detectors,
            processor,
            config,
        })
    }

    /// Run settings.
    #[must_use]
    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Processes the corpus for each vocabulary label and writes shards.
    ///
    /// Per-entry failures are recorded in the report and processing moves
    /// on. Samples already written stay on disk if a later entry fails
    /// fatally.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::MissingAsset`] if the detector assets are
    /// absent (checked before anything is written), a dataset error if
    /// the vocabulary has shard name collisions, and IO errors.
    pub fn run(
        &self,
        corpus: &[CorpusEntry],
        index: &ClassIndex,
        writer: &mut ShardedDatasetWriter,
    ) -> Result<RunOutput> {
        self.detectors.check()?;
        check_shard_collisions(index.labels())?;

        let meta = DatasetMeta::new(&self.config.dataset_name, &self.config.dataset_version)
            .with_notes(&self.config.notes);
        let mut dataset = ProcessedDataset::new(meta);
        let mut report = RunReport::default();
        let limit = self.config.signs_limit.unwrap_or(usize::MAX);
        let mut seen = HashSet::new();

        for (class_id, label) in index.iter().take(limit) {
            let mut count = 0;
            info!(label, class_id, "Processing sign");

            for entry in entries_for(corpus, label) {
                if count >= self.config.samples_per_sign {
                    break;
                }
                let id = entry.sample_id();
                if !seen.insert(id.clone()) {
                    debug!(label, id = id.as_str(), "Clip already processed this run");
                    continue;
                }
                let outcome = self
                    .process_entry(entry, &id, label, class_id)
                    .and_then(|processed| {
                        writer.write_sample(&processed.shard_record(), &processed.images)?;
                        Ok(processed)
                    });

                match outcome {
                    Ok(processed) => {
                        info!(
                            label,
                            id = id.as_str(),
                            frames = processed.stats.kept,
                            "Sample processed"
                        );
                        dataset.push(processed.sample)?;
                        report.processed.push(id);
                        count += 1;
                    }
                    Err(err) => match SkipReason::from_error(&err) {
                        Some(reason) => {
                            warn!(label, url = entry.url.as_str(), %reason, "Sample skipped");
                            report.skipped.push(SkippedEntry {
                                label: label.to_string(),
                                url: entry.watch_url(),
                                reason,
                            });
                        }
                        None => return Err(err),
                    },
                }
            }
            report.per_label.insert(label.to_string(), count);
        }

        info!(
            processed = report.processed.len(),
            skipped = report.skipped.len(),
            "Run complete"
        );
        Ok(RunOutput { dataset, report })
    }

    /// Fetches, decodes and processes one entry inside its own scratch
    /// directory. The scratch directory and detector drop on return.
    fn process_entry(
        &self,
        entry: &CorpusEntry,
        id: &str,
        label: &str,
        class_id: u32,
    ) -> Result<ProcessedSample> {
        entry.validate()?;
        let scratch = SampleScratch::new(self.config.scratch_root.as_deref())?;
        let video = scratch.video_path(id);

        self.source
            .fetch(entry, &video)
            .map_err(|e| in_stage(e, PipelineError::Acquisition))?;
        let frames = self
            .decoder
            .decode(&video)
            .map_err(|e| in_stage(e, PipelineError::Decode))?;
        let mut detector = self
            .detectors
            .open()
            .map_err(|e| in_stage(e, PipelineError::Detector))?;

        self.processor
            .process(id, label, class_id, &frames, &mut detector)
            .map_err(|e| match e {
                PipelineError::NoUsableFrames { .. } | PipelineError::Types(_) => e,
                other => in_stage(other, PipelineError::Detector),
            })
    }
}

/// Attributes a collaborator error to its stage, keeping missing assets
/// and already-classified errors as they are.
fn in_stage(err: PipelineError, wrap: fn(String) -> PipelineError) -> PipelineError {
    match err {
        PipelineError::MissingAsset(_)
        | PipelineError::Acquisition(_)
        | PipelineError::Decode(_)
        | PipelineError::Detector(_) => err,
        other => wrap(other.to_string()),
    }
}
