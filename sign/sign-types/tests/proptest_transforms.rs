//! Property tests for the landmark, box and window transforms.
//!
//! Run with: cargo test -p sign-types -- proptest

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use sign_types::{
    BoundingBoxEncoder, FeatureVector, HandLandmarks, Landmark, SequenceAssembler, VECTOR_SIZE,
    normalize,
};

fn arb_landmark() -> impl Strategy<Value = Landmark> {
    (0.0f32..=1.0, 0.0f32..=1.0, 0.0f32..=1.0).prop_map(|(x, y, z)| Landmark::new(x, y, z))
}

/// Hands whose wrist and middle base are clearly apart.
fn arb_hand() -> impl Strategy<Value = HandLandmarks> {
    prop::collection::vec(arb_landmark(), 21)
        .prop_filter("hand scale must be non-trivial", |points| {
            points[HandLandmarks::WRIST].distance(&points[HandLandmarks::MIDDLE_MCP]) > 0.05
        })
        .prop_map(|points| HandLandmarks::try_new(points).unwrap())
}

fn arb_frame() -> impl Strategy<Value = FeatureVector> {
    prop::collection::vec(-2.0f32..2.0, VECTOR_SIZE)
        .prop_map(|v| FeatureVector::try_from_values(v, VECTOR_SIZE).unwrap())
}

proptest! {
    /// The wrist lands exactly on the origin.
    #[test]
    fn normalized_wrist_is_origin(hand in arb_hand()) {
        let norm = normalize(&hand);
        prop_assert!(!norm.is_degenerate());
        prop_assert_eq!(norm.landmarks.wrist(), Landmark::ORIGIN);
    }

    /// Uniform scaling of the input does not change the output.
    #[test]
    fn normalization_is_scale_invariant(hand in arb_hand(), k in 0.1f32..10.0) {
        let a = normalize(&hand);
        let b = normalize(&hand.scaled(k));
        for (p, q) in a.landmarks.as_slice().iter().zip(b.landmarks.as_slice()) {
            prop_assert!((p.x - q.x).abs() < 1e-3);
            prop_assert!((p.y - q.y).abs() < 1e-3);
            prop_assert!((p.z - q.z).abs() < 1e-3);
        }
    }
}

proptest! {
    /// Boxes never leave the unit square and never have negative extent.
    #[test]
    fn boxes_stay_in_unit_square(
        points in prop::collection::vec(arb_landmark(), 1..30),
        class_id in 0u32..100,
    ) {
        let b = BoundingBoxEncoder::default().encode(&points, class_id).unwrap();
        prop_assert!(b.width >= 0.0);
        prop_assert!(b.height >= 0.0);
        prop_assert!(b.x_center - b.width / 2.0 >= -1e-6);
        prop_assert!(b.y_center - b.height / 2.0 >= -1e-6);
        prop_assert!(b.x_center + b.width / 2.0 <= 1.0 + 1e-6);
        prop_assert!(b.y_center + b.height / 2.0 <= 1.0 + 1e-6);
        prop_assert!(!b.to_line().contains('e'));
    }
}

proptest! {
    /// Windows always have the configured length and follow the
    /// truncate / repeat-last policy.
    #[test]
    fn window_policy(frames in prop::collection::vec(arb_frame(), 0..60)) {
        let assembler = SequenceAssembler::default();
        let window = assembler.assemble(&frames).unwrap();
        prop_assert_eq!(window.len(), assembler.window_size());

        if frames.len() >= assembler.window_size() {
            prop_assert_eq!(&window[..], &frames[..assembler.window_size()]);
        } else if let Some(last) = frames.last() {
            prop_assert_eq!(&window[..frames.len()], &frames[..]);
            prop_assert!(window[frames.len()..].iter().all(|f| f == last));
        } else {
            prop_assert!(window.iter().all(|f| *f == FeatureVector::zeros(VECTOR_SIZE)));
        }
    }
}
