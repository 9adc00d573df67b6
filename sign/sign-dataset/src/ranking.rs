//! Label frequency ranking and the top-N label list file.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};

/// Observation counts per label, in first-seen order.
///
/// Entries live in a vector (the order) with a side index for lookup, so
/// the tie-break order is part of the type rather than a property of a
/// particular hash map.
///
/// # Example
///
/// ```
/// use sign_dataset::LabelCounts;
///
/// let counts = LabelCounts::from_observations(["b", "a", "b"]);
/// assert_eq!(counts.get("b"), 2);
/// assert_eq!(counts.iter().next(), Some(("b", 2)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelCounts {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl LabelCounts {
    /// Creates an empty counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts every observation in order.
    pub fn from_observations<I, S>(observations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = Self::new();
        for label in observations {
            counts.observe(label.as_ref());
        }
        counts
    }

    /// Records one observation of `label`.
    pub fn observe(&mut self, label: &str) {
        if let Some(&slot) = self.index.get(label) {
            self.entries[slot].1 += 1;
        } else {
            self.index.insert(label.to_string(), self.entries.len());
            self.entries.push((label.to_string(), 1));
        }
    }

    /// Count for `label` (0 if never seen).
    #[must_use]
    pub fn get(&self, label: &str) -> usize {
        self.index.get(label).map_or(0, |&slot| self.entries[slot].1)
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was observed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(label, count)` in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(label, count)| (label.as_str(), *count))
    }

    /// All labels by descending count; equal counts keep first-seen order.
    #[must_use]
    pub fn ranked(&self) -> Vec<RankedLabel> {
        let mut ranked: Vec<RankedLabel> = self
            .entries
            .iter()
            .map(|(label, count)| RankedLabel::new(label.clone(), *count))
            .collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }
}

/// A label with its observation count.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankedLabel {
    /// Label text.
    pub label: String,
    /// Number of observations.
    pub count: usize,
}

impl RankedLabel {
    /// Creates a ranked label.
    #[must_use]
    pub fn new(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            count,
        }
    }
}

/// Ranks labels by frequency, drops excluded ones and keeps the top N.
///
/// Exclusions are compared case-insensitively.
///
/// # Example
///
/// ```
/// use sign_dataset::{LabelRanker, RankedLabel};
///
/// let ranker = LabelRanker::new(2).with_exclusions(["Hello"]);
/// let top = ranker.rank(["apple", "hello", "banana", "apple", "hello", "hello"]);
/// assert_eq!(top, vec![RankedLabel::new("apple", 2), RankedLabel::new("banana", 1)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRanker {
    top_n: usize,
    exclusions: HashSet<String>,
}

impl Default for LabelRanker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOP_N)
    }
}

impl LabelRanker {
    /// Default number of labels kept.
    pub const DEFAULT_TOP_N: usize = 100;

    /// Exclusions used for the MS-ASL vocabulary run: greetings and
    /// fingerspelled letters/digits that are handled separately.
    pub const DEFAULT_EXCLUSIONS: [&'static str; 9] =
        ["Hello", "A", "B", "C", "D", "E", "1", "2", "3"];

    /// Creates a ranker keeping `top_n` labels with no exclusions.
    #[must_use]
    pub fn new(top_n: usize) -> Self {
        Self {
            top_n,
            exclusions: HashSet::new(),
        }
    }

    /// Adds labels to exclude (case-insensitive).
    #[must_use]
    pub fn with_exclusions<I, S>(mut self, exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclusions
            .extend(exclusions.into_iter().map(|e| e.as_ref().to_lowercase()));
        self
    }

    /// Number of labels kept.
    #[must_use]
    pub const fn top_n(&self) -> usize {
        self.top_n
    }

    /// Returns `true` if `label` is excluded.
    #[must_use]
    pub fn is_excluded(&self, label: &str) -> bool {
        self.exclusions.contains(&label.to_lowercase())
    }

    /// Ranks a stream of label observations.
    pub fn rank<I, S>(&self, observations: I) -> Vec<RankedLabel>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rank_counts(&LabelCounts::from_observations(observations))
    }

    /// Ranks pre-computed counts.
    #[must_use]
    pub fn rank_counts(&self, counts: &LabelCounts) -> Vec<RankedLabel> {
        counts
            .ranked()
            .into_iter()
            .filter(|r| !self.is_excluded(&r.label))
            .take(self.top_n)
            .collect()
    }
}

/// Writes the ordered label list as a JSON array of strings.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_label_list(path: &Path, labels: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(labels)?;
    fs::write(path, json)?;
    Ok(())
}

/// Reads an ordered label list written by [`write_label_list`].
///
/// # Errors
///
/// Returns [`DatasetError::MissingInput`] if the file does not exist, or a
/// serialization error if it is not a JSON array of strings.
pub fn read_label_list(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(DatasetError::missing_input(path));
    }
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
