//! Classifier training sets extracted from a processed dataset.
//!
//! Static signs become one feature vector per frame. Dynamic signs become
//! one fixed-length window per sample, built with [`SequenceAssembler`];
//! evaluation goes through the same function so both sides pad identically.

use sign_types::{FeatureVector, ProcessedDataset, SampleType, SequenceAssembler};
use tracing::debug;

use crate::class_index::ClassIndex;

/// Per-frame vectors of static samples with their class ids.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StaticFeatureSet {
    /// One vector per retained frame.
    pub features: Vec<FeatureVector>,
    /// Class id of each vector.
    pub class_ids: Vec<u32>,
    /// Frames skipped for having the wrong length.
    pub skipped_frames: usize,
    /// Samples skipped for having a label outside the vocabulary.
    pub skipped_samples: usize,
}

impl StaticFeatureSet {
    /// Collects every frame of every static sample labelled in `index`.
    ///
    /// # Example
    ///
    /// ```
    /// use sign_dataset::{ClassIndex, StaticFeatureSet};
    /// use sign_types::{DatasetMeta, Frame, Landmark, ProcessedDataset, Sample, SampleType};
    ///
    /// let frame = Frame::new(0, vec![Landmark::ORIGIN; 21], vec![Landmark::ORIGIN; 21]);
    /// let mut dataset = ProcessedDataset::new(DatasetMeta::default());
    /// dataset
    ///     .push(Sample::new("s1", "A", SampleType::Static).with_frames(vec![frame]))
    ///     .unwrap();
    ///
    /// let index = ClassIndex::new(["A"]).unwrap();
    /// let set = StaticFeatureSet::from_dataset(&dataset, &index, 63);
    /// assert_eq!(set.len(), 1);
    /// assert_eq!(set.class_ids, vec![0]);
    /// ```
    #[must_use]
    pub fn from_dataset(dataset: &ProcessedDataset, index: &ClassIndex, vector_size: usize) -> Self {
        let mut set = Self::default();
        for sample in dataset.samples_of_type(SampleType::Static) {
            let Ok(class_id) = index.id_of(&sample.label) else {
                set.skipped_samples += 1;
                continue;
            };
            for vector in sample.feature_vectors() {
                if vector.ensure_len(vector_size).is_ok() {
                    set.features.push(vector);
                    set.class_ids.push(class_id);
                } else {
                    set.skipped_frames += 1;
                }
            }
        }
        debug!(
            vectors = set.features.len(),
            skipped_frames = set.skipped_frames,
            skipped_samples = set.skipped_samples,
            "Static feature set built"
        );
        set
    }

    /// Number of vectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if there are no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Fixed-length windows of dynamic samples with their class ids.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SequenceSet {
    /// One window of `window_size` vectors per retained sample.
    pub windows: Vec<Vec<FeatureVector>>,
    /// Class id of each window.
    pub class_ids: Vec<u32>,
    /// Sample ids, parallel to `windows`.
    pub sample_ids: Vec<String>,
    /// Samples discarded for a malformed frame vector.
    pub malformed_samples: usize,
    /// Samples skipped for having a label outside the vocabulary.
    pub skipped_samples: usize,
}

impl SequenceSet {
    /// Builds one window per dynamic sample labelled in `index`.
    ///
    /// A sample with any frame vector of the wrong length is discarded as a
    /// whole rather than reshaped.
    #[must_use]
    pub fn from_dataset(
        dataset: &ProcessedDataset,
        index: &ClassIndex,
        assembler: &SequenceAssembler,
    ) -> Self {
        let mut set = Self::default();
        for sample in dataset.samples_of_type(SampleType::Dynamic) {
            let Ok(class_id) = index.id_of(&sample.label) else {
                set.skipped_samples += 1;
                continue;
            };
            match assembler.assemble(&sample.feature_vectors()) {
                Ok(window) => {
                    set.windows.push(window);
                    set.class_ids.push(class_id);
                    set.sample_ids.push(sample.id.clone());
                }
                Err(err) => {
                    debug!(id = sample.id.as_str(), %err, "Dynamic sample discarded");
                    set.malformed_samples += 1;
                }
            }
        }
        set
    }

    /// Number of windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Returns `true` if there are no windows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Windows flattened to `window_size * vector_size` values each.
    #[must_use]
    pub fn flattened(&self) -> Vec<Vec<f32>> {
        self.windows
            .iter()
            .map(|w| w.iter().flat_map(|v| v.as_slice().iter().copied()).collect())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sign_types::{DatasetMeta, Frame, Landmark, Sample};

    fn frame(t: u64, value: f32, count: usize) -> Frame {
        let norm = vec![Landmark::new(value, value, value); count];
        Frame::new(t, norm.clone(), norm)
    }

    fn dataset() -> ProcessedDataset {
        let mut dataset = ProcessedDataset::new(DatasetMeta::default());
        dataset
            .push(
                Sample::new("s1", "A", SampleType::Static)
                    .with_frames(vec![frame(0, 0.1, 21), frame(33, 0.2, 21)]),
            )
            .unwrap();
        dataset
            .push(Sample::new("s2", "Z", SampleType::Static).with_frames(vec![frame(0, 0.1, 21)]))
            .unwrap();
        dataset
            .push(Sample::new("s3", "B", SampleType::Static).with_frames(vec![frame(0, 0.1, 20)]))
            .unwrap();
        dataset
            .push(
                Sample::new("d1", "hello", SampleType::Dynamic)
                    .with_frames(vec![frame(0, 0.3, 21), frame(33, 0.4, 21)]),
            )
            .unwrap();
        dataset
            .push(Sample::new("d2", "hello", SampleType::Dynamic).with_frames(vec![frame(0, 0.3, 5)]))
            .unwrap();
        dataset
    }

    fn index() -> ClassIndex {
        ClassIndex::new(["A", "B", "hello"]).unwrap()
    }

    #[test]
    fn static_set() {
        let set = StaticFeatureSet::from_dataset(&dataset(), &index(), 63);
        assert_eq!(set.len(), 2);
        assert_eq!(set.class_ids, vec![0, 0]);
        assert_eq!(set.skipped_frames, 1);
        assert_eq!(set.skipped_samples, 1);
        assert!(set.features.iter().all(|f| f.len() == 63));
    }

    #[test]
    fn sequence_set_pads_with_last_frame() {
        let assembler = SequenceAssembler::default();
        let set = SequenceSet::from_dataset(&dataset(), &index(), &assembler);
        assert_eq!(set.len(), 1);
        assert_eq!(set.sample_ids, vec!["d1"]);
        assert_eq!(set.class_ids, vec![2]);
        assert_eq!(set.malformed_samples, 1);

        let window = &set.windows[0];
        assert_eq!(window.len(), 30);
        assert_eq!(window[29], window[1]);
        assert_ne!(window[0], window[1]);

        let flat = set.flattened();
        assert_eq!(flat[0].len(), 30 * 63);
    }

    #[test]
    fn empty_dataset() {
        let dataset = ProcessedDataset::new(DatasetMeta::default());
        assert!(StaticFeatureSet::from_dataset(&dataset, &index(), 63).is_empty());
        assert!(SequenceSet::from_dataset(&dataset, &index(), &SequenceAssembler::default()).is_empty());
    }
}
