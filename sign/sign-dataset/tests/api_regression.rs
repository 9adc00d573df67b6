//! End-to-end checks of the public dataset API.

#![allow(clippy::unwrap_used)]

use std::fs;

use approx::assert_relative_eq;
use sign_dataset::prelude::*;
use sign_dataset::{check_shard_collisions, read_label_list, write_label_list};
use sign_types::{BoundingBoxEncoder, Frame, HandLandmarks, Landmark, YoloBox, normalize};

fn hand(offset: f32) -> HandLandmarks {
    let points = (0..21)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let step = i as f32 * 0.01;
            Landmark::new(0.3 + offset + step, 0.4 + step, 0.0)
        })
        .collect();
    HandLandmarks::try_new(points).unwrap()
}

fn record(id: &str, label: &str, class_id: u32, frames: usize) -> ShardRecord {
    let encoder = BoundingBoxEncoder::default();
    let mut out = Vec::new();
    let mut lines = Vec::new();
    for i in 0..frames {
        #[allow(clippy::cast_precision_loss)]
        let raw = hand(i as f32 * 0.01);
        let norm = normalize(&raw);
        lines.push(encoder.encode_line(raw.as_slice(), class_id).unwrap());
        out.push(Frame::new(
            u64::try_from(i * 99).unwrap(),
            raw.into_inner(),
            norm.landmarks.into_inner(),
        ));
    }
    ShardRecord::new(id, label, out, lines)
}

#[test]
fn vocabulary_to_detection_dataset() {
    let work = tempfile::tempdir().unwrap();
    let shard_root = work.path().join("shards");
    let output = work.path().join("yolo");

    let corpus = ["hello", "thank you", "yes", "thank you", "A", "yes", "thank you"];
    let ranked = LabelRanker::new(2)
        .with_exclusions(LabelRanker::DEFAULT_EXCLUSIONS)
        .rank(corpus);
    let labels: Vec<String> = ranked.iter().map(|r| r.label.clone()).collect();
    assert_eq!(labels, ["thank you", "yes"]);

    let list_path = work.path().join("top_signs.json");
    write_label_list(&list_path, &labels).unwrap();
    let index = ClassIndex::new(read_label_list(&list_path).unwrap()).unwrap();
    check_shard_collisions(index.labels()).unwrap();

    let mut writer = ShardedDatasetWriter::new(&shard_root);
    for (label, ids) in [("thank you", ["t1", "t2"]), ("yes", ["y1", "y2"])] {
        let class_id = index.id_of(label).unwrap();
        for id in ids {
            let rec = record(id, label, class_id, 3);
            let images: Vec<Vec<u8>> = (0..3).map(|i| vec![0xFF, 0xD8, i]).collect();
            writer.write_sample(&rec, &images).unwrap();
        }
    }

    let reader = ShardReader::new(&shard_root);
    let back = reader.read_sample("thank you", "t2").unwrap();
    assert_eq!(back.label, "thank you");
    assert_eq!(back.frame_count(), 3);

    let summary = YoloDatasetAssembler::new(&output)
        .assemble(&reader, &index)
        .unwrap();
    assert_eq!(summary.classes_processed, 2);
    assert_eq!(summary.train_frames, 12);
    assert!(!summary.manifest.has_held_out_validation());

    let line = fs::read_to_string(output.join("labels/train/yes_y1_0.txt")).unwrap();
    let parsed = YoloBox::parse_line(line.trim_end()).unwrap();
    let expected = YoloBox::parse_line(&back.yolo_labels[0]).unwrap();
    assert_eq!(parsed.class_id, 1);
    assert_relative_eq!(parsed.x_center, expected.x_center, epsilon = 1e-6);
    assert_relative_eq!(parsed.width, expected.width, epsilon = 1e-6);

    let manifest = DatasetManifest::load(&output.join("dataset.yaml")).unwrap();
    manifest.validate_against(&index).unwrap();
}

#[test]
fn holdout_manifest_points_at_val() {
    let work = tempfile::tempdir().unwrap();
    let shard_root = work.path().join("shards");
    let mut writer = ShardedDatasetWriter::new(&shard_root);
    for i in 0..5 {
        let rec = record(&format!("s{i}"), "yes", 0, 2);
        writer.write_sample(&rec, &[vec![1], vec![2]]).unwrap();
    }
    let index = ClassIndex::new(["yes"]).unwrap();
    let summary = YoloDatasetAssembler::new(work.path().join("yolo"))
        .with_split(SplitPolicy::holdout(0.6, 42))
        .assemble(&ShardReader::new(&shard_root), &index)
        .unwrap();
    assert_eq!(summary.train_frames, 6);
    assert_eq!(summary.val_frames, 4);
    assert_eq!(summary.manifest.val, "images/val");
}

#[test]
fn config_drives_components() {
    let work = tempfile::tempdir().unwrap();
    let config = DatasetConfig::new(work.path()).with_top_n(1);
    config.validate().unwrap();

    let ranked = config.label_ranker().rank(["B", "no", "no", "B", "B"]);
    assert_eq!(ranked, vec![RankedLabel::new("no", 2)]);

    let mut writer = config.shard_writer();
    writer
        .write_sample(&record("x1", "no", 0, 1), &[vec![7]])
        .unwrap();
    assert!(config.shard_reader().has_shard("no"));
    assert_relative_eq!(config.box_encoder().unwrap().padding(), 0.05);
}
