//! Source corpus entries (MS-ASL style clip index).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{PipelineError, Result};

const WATCH_URL_PREFIX: &str = "https://www.youtube.com/watch?v=";
const SAMPLE_ID_LEN: usize = 16;

/// One clip of the source corpus.
///
/// Fields the corpus carries beyond these are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    /// Video URL, full or a bare video id.
    pub url: String,

    /// Clip start in seconds.
    pub start_time: f64,

    /// Clip end in seconds.
    pub end_time: f64,

    /// Sign label.
    pub clean_text: String,

    /// Source file name reported by the corpus. Informational only; scratch
    /// files are always named by sample id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl CorpusEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(url: impl Into<String>, start_time: f64, end_time: f64, label: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            start_time,
            end_time,
            clean_text: label.into(),
            file: None,
        }
    }

    /// Sign label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.clean_text
    }

    /// Fully qualified watch URL.
    ///
    /// # Example
    ///
    /// ```
    /// use sign_pipeline::CorpusEntry;
    ///
    /// let bare = CorpusEntry::new("dQw4w9WgXcQ", 0.0, 1.0, "hello");
    /// assert_eq!(bare.watch_url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
    ///
    /// let host = CorpusEntry::new("www.youtube.com/watch?v=abc", 0.0, 1.0, "hello");
    /// assert_eq!(host.watch_url(), "https://www.youtube.com/watch?v=abc");
    /// ```
    #[must_use]
    pub fn watch_url(&self) -> String {
        let url = self.url.trim();
        if url.contains("://") {
            url.to_string()
        } else if url.starts_with("www.")
            || url.starts_with("youtube.com/")
            || url.starts_with("m.youtube.com/")
            || url.starts_with("youtu.be/")
        {
            format!("https://{url}")
        } else {
            format!("{WATCH_URL_PREFIX}{url}")
        }
    }

    /// Stable id derived from the clip's URL and time range.
    ///
    /// Re-running over the same clip yields the same id, so the sample's
    /// shard files are overwritten rather than duplicated.
    #[must_use]
    pub fn sample_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.watch_url().as_bytes());
        hasher.update(b"|");
        hasher.update(self.start_time.to_string().as_bytes());
        hasher.update(b"|");
        hasher.update(self.end_time.to_string().as_bytes());
        let hash = hasher.finalize();
        let mut id = format!("{hash:x}");
        id.truncate(SAMPLE_ID_LEN);
        id
    }

    /// Checks the time range.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Acquisition`] if the range is empty or
    /// not finite.
    pub fn validate(&self) -> Result<()> {
        let valid = self.start_time.is_finite()
            && self.end_time.is_finite()
            && self.start_time >= 0.0
            && self.end_time > self.start_time;
        if valid {
            Ok(())
        } else {
            Err(PipelineError::acquisition(format!(
                "bad clip range {}..{} for {}",
                self.start_time, self.end_time, self.url
            )))
        }
    }
}

/// Loads the corpus index (a JSON array of entries).
///
/// # Errors
///
/// Returns [`PipelineError::MissingAsset`] if the file does not exist, or a
/// serialization error for malformed JSON.
pub fn load_corpus(path: &Path) -> Result<Vec<CorpusEntry>> {
    if !path.is_file() {
        return Err(PipelineError::missing_asset(path));
    }
    let entries: Vec<CorpusEntry> = serde_json::from_str(&fs::read_to_string(path)?)?;
    debug!(path = %path.display(), entries = entries.len(), "Loaded corpus");
    Ok(entries)
}

/// Entries labelled `label`, in corpus order.
pub fn entries_for<'a>(corpus: &'a [CorpusEntry], label: &'a str) -> impl Iterator<Item = &'a CorpusEntry> {
    corpus.iter().filter(move |e| e.clean_text == label)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn url_fixups() {
        let full = CorpusEntry::new("https://youtu.be/abc", 0.0, 1.0, "x");
        assert_eq!(full.watch_url(), "https://youtu.be/abc");
        let short = CorpusEntry::new("youtu.be/abc", 0.0, 1.0, "x");
        assert_eq!(short.watch_url(), "https://youtu.be/abc");
        let bare = CorpusEntry::new("abc", 0.0, 1.0, "x");
        assert_eq!(bare.watch_url(), "https://www.youtube.com/watch?v=abc");
    }

    #[test]
    fn ids_containing_host_fragments_stay_ids() {
        for id in ["wwwAbc12345", "xwww_youtu9", "youtube-com"] {
            let entry = CorpusEntry::new(id, 0.0, 1.0, "x");
            assert_eq!(
                entry.watch_url(),
                format!("https://www.youtube.com/watch?v={id}")
            );
        }
        let host = CorpusEntry::new("youtube.com/watch?v=abc", 0.0, 1.0, "x");
        assert_eq!(host.watch_url(), "https://youtube.com/watch?v=abc");
    }

    #[test]
    fn sample_id_is_stable_and_distinct() {
        let a = CorpusEntry::new("abc", 1.5, 3.0, "hello");
        let b = CorpusEntry::new("https://www.youtube.com/watch?v=abc", 1.5, 3.0, "other");
        let c = CorpusEntry::new("abc", 1.5, 3.5, "hello");
        assert_eq!(a.sample_id().len(), 16);
        assert!(a.sample_id().bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(a.sample_id(), a.clone().sample_id());
        assert_eq!(a.sample_id(), b.sample_id());
        assert_ne!(a.sample_id(), c.sample_id());
    }

    #[test]
    fn range_validation() {
        assert!(CorpusEntry::new("a", 0.0, 1.0, "x").validate().is_ok());
        assert!(CorpusEntry::new("a", 2.0, 1.0, "x").validate().is_err());
        assert!(CorpusEntry::new("a", f64::NAN, 1.0, "x").validate().is_err());
    }

    #[test]
    fn load_ignores_extra_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MSASL_train.json");
        fs::write(
            &path,
            r#"[{"url": "www.youtube.com/watch?v=x", "start_time": 0.5, "end_time": 2.0,
                 "clean_text": "hello", "file": "hello_1", "signer_id": 4, "fps": 30.0}]"#,
        )
        .unwrap();
        let corpus = load_corpus(&path).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus[0].file.as_deref(), Some("hello_1"));
        assert_eq!(entries_for(&corpus, "hello").count(), 1);
        assert_eq!(entries_for(&corpus, "yes").count(), 0);

        assert!(matches!(
            load_corpus(&dir.path().join("absent.json")),
            Err(PipelineError::MissingAsset(_))
        ));
    }
}
