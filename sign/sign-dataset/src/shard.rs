//! Per-class shard directories.
//!
//! A shard is a directory named after a sanitized label holding, for every
//! sample, one JSON record plus one image and one YOLO label file per
//! retained frame:
//!
//! ```text
//! <root>/<sanitized_label>/
//!     <sample_id>.json
//!     images/<sample_id>_<frame_idx>.jpg
//!     labels/<sample_id>_<frame_idx>.txt
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sign_types::{Frame, Sample};
use tracing::{debug, warn};

use crate::error::{DatasetError, Result};

/// Default image file extension.
pub const DEFAULT_IMAGE_EXTENSION: &str = "jpg";

const IMAGES_DIR: &str = "images";
const LABELS_DIR: &str = "labels";

/// Maps a label to a filesystem-safe directory name.
///
/// Keeps alphanumerics, spaces and underscores, trims, then replaces the
/// remaining spaces with underscores.
///
/// # Example
///
/// ```
/// use sign_dataset::sanitize_label;
///
/// assert_eq!(sanitize_label("thank you"), "thank_you");
/// assert_eq!(sanitize_label("what's-up!"), "whatsup");
/// ```
#[must_use]
pub fn sanitize_label(label: &str) -> String {
    let kept: String = label
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '_')
        .collect();
    kept.trim().replace(' ', "_")
}

/// Checks that no two labels of a vocabulary share a shard directory.
///
/// # Errors
///
/// Returns [`DatasetError::LabelCollision`] for the first clash found and
/// [`DatasetError::EmptyShardName`] for labels with no safe characters.
pub fn check_shard_collisions<I, S>(labels: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut claims = ShardClaims::default();
    for label in labels {
        claims.claim(label.as_ref())?;
    }
    Ok(())
}

/// Directory name → label that owns it.
#[derive(Debug, Clone, Default)]
struct ShardClaims {
    owners: HashMap<String, String>,
}

impl ShardClaims {
    fn claim(&mut self, label: &str) -> Result<String> {
        let dir = sanitize_label(label);
        if dir.is_empty() {
            return Err(DatasetError::EmptyShardName(label.to_string()));
        }
        match self.owners.get(&dir) {
            Some(existing) if existing != label => {
                warn!(label, existing = existing.as_str(), dir = dir.as_str(), "Shard name collision");
                Err(DatasetError::label_collision(label, existing.clone(), dir))
            }
            Some(_) => Ok(dir),
            None => {
                self.owners.insert(dir.clone(), label.to_string());
                Ok(dir)
            }
        }
    }
}

/// A sample as stored inside a shard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShardRecord {
    /// Sample id.
    pub id: String,

    /// Human-readable label.
    pub label: String,

    /// Retained frames.
    pub frames: Vec<Frame>,

    /// One YOLO label line per frame.
    pub yolo_labels: Vec<String>,
}

impl ShardRecord {
    /// Creates a record.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        frames: Vec<Frame>,
        yolo_labels: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            frames,
            yolo_labels,
        }
    }

    /// Creates a record from a processed sample.
    #[must_use]
    pub fn from_sample(sample: &Sample, yolo_labels: Vec<String>) -> Self {
        Self::new(
            sample.id.clone(),
            sample.label.clone(),
            sample.frames.clone(),
            yolo_labels,
        )
    }

    /// Number of frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Checks the record is fit to be persisted.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidSample`] if the id is not a plain file
    /// stem, there are no frames, frame cardinality differs, or the label
    /// count does not match the frame count.
    pub fn validate(&self) -> Result<()> {
        let id_ok = !self.id.is_empty()
            && self
                .id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !id_ok {
            return Err(DatasetError::invalid_sample(
                &self.id,
                "id must be non-empty ASCII alphanumerics, '-' or '_'",
            ));
        }
        let Some(first) = self.frames.first() else {
            return Err(DatasetError::invalid_sample(&self.id, "no frames"));
        };
        if self
            .frames
            .iter()
            .any(|f| f.landmarks.len() != first.landmarks.len())
        {
            return Err(DatasetError::invalid_sample(
                &self.id,
                "frames have differing landmark counts",
            ));
        }
        if self.yolo_labels.len() != self.frames.len() {
            return Err(DatasetError::invalid_sample(
                &self.id,
                format!(
                    "{} label lines for {} frames",
                    self.yolo_labels.len(),
                    self.frames.len()
                ),
            ));
        }
        Ok(())
    }
}

/// Files written for one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLocation {
    /// Shard directory.
    pub shard_dir: PathBuf,
    /// JSON record.
    pub record_path: PathBuf,
    /// One image per frame.
    pub image_paths: Vec<PathBuf>,
    /// One label file per frame.
    pub label_paths: Vec<PathBuf>,
}

/// Writes samples into per-label shard directories under a root.
///
/// Re-writing a sample id replaces only that sample's files. Distinct
/// labels that sanitize to the same directory are rejected for the
/// lifetime of the writer.
///
/// # Example
///
/// ```
/// use sign_dataset::ShardedDatasetWriter;
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut writer = ShardedDatasetWriter::new(dir.path());
/// let shard = writer.shard_dir("thank you").unwrap();
/// assert!(shard.ends_with("thank_you"));
/// assert!(writer.shard_dir("thank you!").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ShardedDatasetWriter {
    root: PathBuf,
    image_extension: String,
    claims: ShardClaims,
}

impl ShardedDatasetWriter {
    /// Creates a writer rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            image_extension: DEFAULT_IMAGE_EXTENSION.to_string(),
            claims: ShardClaims::default(),
        }
    }

    /// Sets the image file extension (without the dot).
    #[must_use]
    pub fn with_image_extension(mut self, extension: impl Into<String>) -> Self {
        self.image_extension = extension.into();
        self
    }

    /// Content root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the shard directory for `label`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns a collision or empty-name error, or an IO error if the
    /// directory cannot be created.
    pub fn shard_dir(&mut self, label: &str) -> Result<PathBuf> {
        let name = self.claims.claim(label)?;
        let dir = self.root.join(name);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Writes one sample and its per-frame images and labels.
    ///
    /// `images` holds one encoded image per frame, in frame order.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidSample`] if the record fails
    /// validation or the image count differs from the frame count, and
    /// IO or serialization errors from writing.
    pub fn write_sample(
        &mut self,
        record: &ShardRecord,
        images: &[Vec<u8>],
    ) -> Result<SampleLocation> {
        record.validate()?;
        if images.len() != record.frames.len() {
            return Err(DatasetError::invalid_sample(
                &record.id,
                format!("{} images for {} frames", images.len(), record.frames.len()),
            ));
        }

        let shard_dir = self.shard_dir(&record.label)?;
        let images_dir = shard_dir.join(IMAGES_DIR);
        let labels_dir = shard_dir.join(LABELS_DIR);
        fs::create_dir_all(&images_dir)?;
        fs::create_dir_all(&labels_dir)?;

        let mut image_paths = Vec::with_capacity(images.len());
        let mut label_paths = Vec::with_capacity(images.len());
        for (i, (image, line)) in images.iter().zip(&record.yolo_labels).enumerate() {
            let image_path = images_dir.join(frame_file(&record.id, i, &self.image_extension));
            fs::write(&image_path, image)?;
            image_paths.push(image_path);

            let label_path = labels_dir.join(frame_file(&record.id, i, "txt"));
            fs::write(&label_path, format!("{line}\n"))?;
            label_paths.push(label_path);
        }

        let stale = remove_stale_frames(&images_dir, &record.id, &self.image_extension, images.len())?
            + remove_stale_frames(&labels_dir, &record.id, "txt", images.len())?;

        let record_path = shard_dir.join(format!("{}.json", record.id));
        fs::write(&record_path, serde_json::to_string_pretty(record)?)?;

        debug!(
            id = record.id.as_str(),
            label = record.label.as_str(),
            frames = record.frames.len(),
            stale,
            "Wrote shard sample"
        );

        Ok(SampleLocation {
            shard_dir,
            record_path,
            image_paths,
            label_paths,
        })
    }
}

/// Reads samples back from a shard root.
///
/// # Example
///
/// ```
/// use sign_dataset::ShardReader;
///
/// let dir = tempfile::tempdir().unwrap();
/// let reader = ShardReader::new(dir.path());
/// assert!(!reader.has_shard("hello"));
/// ```
#[derive(Debug, Clone)]
pub struct ShardReader {
    root: PathBuf,
    image_extension: String,
}

impl ShardReader {
    /// Creates a reader rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            image_extension: DEFAULT_IMAGE_EXTENSION.to_string(),
        }
    }

    /// Sets the image file extension (without the dot).
    #[must_use]
    pub fn with_image_extension(mut self, extension: impl Into<String>) -> Self {
        self.image_extension = extension.into();
        self
    }

    /// Content root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a label's shard lives in (whether or not it exists).
    #[must_use]
    pub fn shard_path(&self, label: &str) -> PathBuf {
        self.root.join(sanitize_label(label))
    }

    /// Returns `true` if the label has a shard directory.
    #[must_use]
    pub fn has_shard(&self, label: &str) -> bool {
        !sanitize_label(label).is_empty() && self.shard_path(label).is_dir()
    }

    /// Sample ids in the shard, sorted.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::ShardNotFound`] if the shard is absent.
    pub fn sample_ids(&self, label: &str) -> Result<Vec<String>> {
        if !self.has_shard(label) {
            return Err(DatasetError::shard_not_found(label));
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(self.shard_path(label))? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Reads one sample record.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::MissingInput`] if the record does not exist,
    /// or a serialization error if it cannot be parsed.
    pub fn read_sample(&self, label: &str, id: &str) -> Result<ShardRecord> {
        let path = self.shard_path(label).join(format!("{id}.json"));
        if !path.is_file() {
            return Err(DatasetError::missing_input(path));
        }
        let json = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Path of a frame's image.
    #[must_use]
    pub fn image_path(&self, label: &str, id: &str, frame: usize) -> PathBuf {
        self.shard_path(label)
            .join(IMAGES_DIR)
            .join(frame_file(id, frame, &self.image_extension))
    }

    /// Path of a frame's YOLO label file.
    #[must_use]
    pub fn label_path(&self, label: &str, id: &str, frame: usize) -> PathBuf {
        self.shard_path(label)
            .join(LABELS_DIR)
            .join(frame_file(id, frame, "txt"))
    }
}

fn frame_file(id: &str, frame: usize, extension: &str) -> String {
    format!("{id}_{frame}.{extension}")
}

/// Parses `<id>_<digits>.<extension>`.
fn frame_index(file_name: &str, id: &str, extension: &str) -> Option<usize> {
    let digits = file_name
        .strip_prefix(id)?
        .strip_prefix('_')?
        .strip_suffix(extension)?
        .strip_suffix('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Removes frame files of `id` with index `>= keep`.
fn remove_stale_frames(dir: &Path, id: &str, extension: &str, keep: usize) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if frame_index(name, id, extension).is_some_and(|i| i >= keep) {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sign_types::Landmark;

    fn record(id: &str, label: &str, frames: usize) -> ShardRecord {
        let frames: Vec<Frame> = (0..frames)
            .map(|i| {
                let t = u64::try_from(i).unwrap() * 99;
                Frame::new(t, vec![Landmark::new(0.5, 0.5, 0.0); 21], vec![Landmark::ORIGIN; 21])
            })
            .collect();
        let lines = vec!["0 0.5 0.5 0.1 0.1".to_string(); frames.len()];
        ShardRecord::new(id, label, frames, lines)
    }

    fn images(n: usize) -> Vec<Vec<u8>> {
        (0..n).map(|i| vec![0xFF, 0xD8, u8::try_from(i).unwrap()]).collect()
    }

    #[test]
    fn sanitize_examples() {
        assert_eq!(sanitize_label("thank you"), "thank_you");
        assert_eq!(sanitize_label("what's-up!"), "whatsup");
        assert_eq!(sanitize_label("  padded  "), "padded");
        assert_eq!(sanitize_label("snake_case ok"), "snake_case_ok");
        assert_eq!(sanitize_label("?!"), "");
    }

    #[test]
    fn collision_detection() {
        assert!(check_shard_collisions(["hello", "thank you", "yes"]).is_ok());
        let err = check_shard_collisions(["thank you", "thank-you", "thank you!"]).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::LabelCollision { ref label, ref dir, .. } if label == "thank you!" && dir == "thank_you"
        ));

        let err = check_shard_collisions(["ok", "!!"]).unwrap_err();
        assert!(matches!(err, DatasetError::EmptyShardName(_)));
    }

    #[test]
    fn same_label_twice_is_not_collision() {
        assert!(check_shard_collisions(["yes", "yes"]).is_ok());
    }

    #[test]
    fn shard_dir_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ShardedDatasetWriter::new(dir.path());
        let a = writer.shard_dir("thank you").unwrap();
        let b = writer.shard_dir("thank you").unwrap();
        assert_eq!(a, b);
        assert!(a.is_dir());
    }

    #[test]
    fn write_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ShardedDatasetWriter::new(dir.path());
        let location = writer.write_sample(&record("abc", "thank you", 3), &images(3)).unwrap();

        assert!(location.record_path.ends_with("thank_you/abc.json"));
        assert_eq!(location.image_paths.len(), 3);
        assert!(location.image_paths[2].ends_with("images/abc_2.jpg"));
        assert_eq!(
            fs::read_to_string(&location.label_paths[0]).unwrap(),
            "0 0.5 0.5 0.1 0.1\n"
        );

        let reader = ShardReader::new(dir.path());
        assert!(reader.has_shard("thank you"));
        assert_eq!(reader.sample_ids("thank you").unwrap(), vec!["abc"]);
        let back = reader.read_sample("thank you", "abc").unwrap();
        assert_eq!(back.label, "thank you");
        assert_eq!(back.frame_count(), 3);
        assert_eq!(fs::read(reader.image_path("thank you", "abc", 1)).unwrap(), images(3)[1]);
    }

    #[test]
    fn rewrite_replaces_only_own_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ShardedDatasetWriter::new(dir.path());
        writer.write_sample(&record("a", "yes", 4), &images(4)).unwrap();
        writer.write_sample(&record("a_1", "yes", 2), &images(2)).unwrap();
        writer.write_sample(&record("b", "yes", 3), &images(3)).unwrap();

        writer.write_sample(&record("a", "yes", 2), &images(2)).unwrap();

        let reader = ShardReader::new(dir.path());
        assert!(reader.image_path("yes", "a", 1).is_file());
        assert!(!reader.image_path("yes", "a", 2).exists());
        assert!(!reader.label_path("yes", "a", 3).exists());
        assert!(reader.image_path("yes", "a_1", 1).is_file());
        assert!(reader.image_path("yes", "b", 2).is_file());
        assert_eq!(reader.read_sample("yes", "a").unwrap().frame_count(), 2);
        assert_eq!(reader.sample_ids("yes").unwrap(), vec!["a", "a_1", "b"]);
    }

    #[test]
    fn rejects_invalid_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ShardedDatasetWriter::new(dir.path());

        let empty = record("e", "yes", 0);
        assert!(matches!(
            writer.write_sample(&empty, &[]),
            Err(DatasetError::InvalidSample { .. })
        ));

        let bad_id = record("../x", "yes", 1);
        assert!(writer.write_sample(&bad_id, &images(1)).is_err());

        let mismatch = record("m", "yes", 2);
        assert!(writer.write_sample(&mismatch, &images(1)).is_err());

        let mut mixed = record("mixed", "yes", 2);
        mixed.frames[1].landmarks.pop();
        assert!(writer.write_sample(&mixed, &images(2)).is_err());

        assert!(!dir.path().join("yes").join("e.json").exists());
    }

    #[test]
    fn writer_rejects_collision() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = ShardedDatasetWriter::new(dir.path());
        writer.write_sample(&record("a", "whats up", 1), &images(1)).unwrap();
        let err = writer
            .write_sample(&record("b", "what's up", 1), &images(1))
            .unwrap_err();
        assert!(matches!(err, DatasetError::LabelCollision { .. }));
    }

    #[test]
    fn missing_shard_and_record() {
        let dir = tempfile::tempdir().unwrap();
        let reader = ShardReader::new(dir.path());
        assert!(matches!(
            reader.sample_ids("nope"),
            Err(DatasetError::ShardNotFound(_))
        ));
        fs::create_dir_all(dir.path().join("yes")).unwrap();
        assert!(matches!(
            reader.read_sample("yes", "zzz"),
            Err(DatasetError::MissingInput(_))
        ));
    }

    #[test]
    fn frame_index_parsing() {
        assert_eq!(frame_index("abc_12.jpg", "abc", "jpg"), Some(12));
        assert_eq!(frame_index("abc_1_2.jpg", "abc", "jpg"), None);
        assert_eq!(frame_index("abc_.jpg", "abc", "jpg"), None);
        assert_eq!(frame_index("abc_3.txt", "abc", "jpg"), None);
    }
}
