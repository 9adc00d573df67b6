//! Fixed class vocabulary: label ↔ integer id.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{DatasetError, Result};
use crate::ranking::RankedLabel;

/// Ordered, deduplicated class vocabulary.
///
/// The id of a label is its position in the list. The mapping cannot be
/// changed once built; shards and the manifest must be written from the
/// same instance.
///
/// # Example
///
/// ```
/// use sign_dataset::ClassIndex;
///
/// let index = ClassIndex::new(["hello", "thank you"]).unwrap();
/// assert_eq!(index.id_of("thank you").unwrap(), 1);
/// assert_eq!(index.label_of(0), Some("hello"));
/// assert!(index.id_of("zebra").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ClassIndex {
    labels: Vec<String>,
    ids: HashMap<String, u32>,
}

impl ClassIndex {
    /// Builds a vocabulary from an ordered label list.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::DuplicateLabel`] if a label appears twice
    /// and [`DatasetError::InvalidLabel`] if a label contains control
    /// characters.
    pub fn new<I, S>(labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let mut ids = HashMap::with_capacity(labels.len());
        for (position, label) in labels.iter().enumerate() {
            let id = u32::try_from(position)
                .map_err(|_| DatasetError::invalid_config("class vocabulary too large"))?;
            if label.chars().any(char::is_control) {
                return Err(DatasetError::InvalidLabel(label.clone()));
            }
            if ids.insert(label.clone(), id).is_some() {
                return Err(DatasetError::DuplicateLabel(label.clone()));
            }
        }
        Ok(Self { labels, ids })
    }

    /// Builds a vocabulary from ranked labels, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::DuplicateLabel`] if a label appears twice.
    pub fn from_ranked(ranked: &[RankedLabel]) -> Result<Self> {
        Self::new(ranked.iter().map(|r| r.label.clone()))
    }

    /// Id of `label`.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownLabel`] for labels outside the
    /// vocabulary. Callers skip such samples.
    pub fn id_of(&self, label: &str) -> Result<u32> {
        self.ids
            .get(label)
            .copied()
            .ok_or_else(|| DatasetError::unknown_label(label))
    }

    /// Label with id `id`.
    #[must_use]
    pub fn label_of(&self, id: u32) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.labels.get(i))
            .map(String::as_str)
    }

    /// Returns `true` if `label` is in the vocabulary.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.ids.contains_key(label)
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if the vocabulary is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in id order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Iterates `(id, label)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        (0u32..).zip(self.labels.iter().map(String::as_str))
    }
}

impl TryFrom<Vec<String>> for ClassIndex {
    type Error = DatasetError;

    fn try_from(labels: Vec<String>) -> Result<Self> {
        Self::new(labels)
    }
}

impl From<ClassIndex> for Vec<String> {
    fn from(index: ClassIndex) -> Self {
        index.labels
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_list_order() {
        let index = ClassIndex::new(["yes", "no", "maybe"]).unwrap();
        assert_eq!(index.len(), 3);
        assert_eq!(index.id_of("yes").unwrap(), 0);
        assert_eq!(index.id_of("maybe").unwrap(), 2);
        assert_eq!(index.label_of(1), Some("no"));
        assert_eq!(index.label_of(3), None);
    }

    #[test]
    fn unknown_label_is_error() {
        let index = ClassIndex::new(["yes"]).unwrap();
        let err = index.id_of("Yes").unwrap_err();
        assert!(matches!(err, DatasetError::UnknownLabel(ref l) if l == "Yes"));
        assert!(!index.contains("Yes"));
    }

    #[test]
    fn duplicate_rejected() {
        let err = ClassIndex::new(["a", "b", "a"]).unwrap_err();
        assert!(matches!(err, DatasetError::DuplicateLabel(ref l) if l == "a"));
    }

    #[test]
    fn control_characters_rejected() {
        for label in ["thank\nyou", "tab\there", "bell\u{7}"] {
            let err = ClassIndex::new(["ok", label]).unwrap_err();
            assert!(matches!(err, DatasetError::InvalidLabel(ref l) if l == label));
        }
        assert!(serde_json::from_str::<ClassIndex>(r#"["a\nb"]"#).is_err());
        assert!(ClassIndex::new(["what's up", "ñandú"]).is_ok());
    }

    #[test]
    fn from_ranked_keeps_rank_order() {
        let ranked = vec![RankedLabel::new("apple", 3), RankedLabel::new("banana", 2)];
        let index = ClassIndex::from_ranked(&ranked).unwrap();
        let pairs: Vec<_> = index.iter().collect();
        assert_eq!(pairs, vec![(0, "apple"), (1, "banana")]);
    }

    #[test]
    fn serde_as_plain_list() {
        let index = ClassIndex::new(["x", "y"]).unwrap();
        let json = serde_json::to_string(&index).unwrap();
        assert_eq!(json, r#"["x","y"]"#);
        let back: ClassIndex = serde_json::from_str(&json).unwrap();
        assert_eq!(back, index);
        assert!(serde_json::from_str::<ClassIndex>(r#"["x","x"]"#).is_err());
    }

    #[test]
    fn empty_index() {
        let index = ClassIndex::new(Vec::<String>::new()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.iter().count(), 0);
    }
}
