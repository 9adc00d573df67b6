//! Hand landmarks and wrist-anchored normalization.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignTypesError};

/// Number of landmarks in a detected hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// A single tracked point on a hand.
///
/// Raw detector output has each coordinate in `[0, 1]` relative to the
/// image plane (`z` is relative depth). After normalization the range is
/// unconstrained.
///
/// # Example
///
/// ```
/// use sign_types::Landmark;
///
/// let a = Landmark::new(0.0, 0.0, 0.0);
/// let b = Landmark::new(3.0, 4.0, 0.0);
/// assert!((a.distance(&b) - 5.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Landmark {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate (depth).
    pub z: f32,
}

impl Landmark {
    /// The origin `(0, 0, 0)`.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Creates a new landmark.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns the coordinates as `[x, y, z]`.
    #[must_use]
    pub const fn as_array(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    /// Euclidean distance to another landmark.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Translates by `-origin` and divides by `scale`.
    #[must_use]
    pub fn relative_to(&self, origin: &Self, scale: f32) -> Self {
        Self {
            x: (self.x - origin.x) / scale,
            y: (self.y - origin.y) / scale,
            z: (self.z - origin.z) / scale,
        }
    }

    /// Multiplies every coordinate by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    /// Returns `true` if all coordinates are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// A complete set of 21 hand landmarks in detector order.
///
/// The cardinality is checked at construction, so every `HandLandmarks`
/// can be indexed by the named constants below.
///
/// # Example
///
/// ```
/// use sign_types::{HandLandmarks, Landmark};
///
/// let hand = HandLandmarks::try_new(vec![Landmark::ORIGIN; 21]);
/// assert!(hand.is_ok());
///
/// let short = HandLandmarks::try_new(vec![Landmark::ORIGIN; 5]);
/// assert!(short.is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Landmark>", into = "Vec<Landmark>")]
pub struct HandLandmarks(Vec<Landmark>);

impl HandLandmarks {
    /// Wrist.
    pub const WRIST: usize = 0;
    /// Thumb carpometacarpal joint.
    pub const THUMB_CMC: usize = 1;
    /// Thumb metacarpophalangeal joint.
    pub const THUMB_MCP: usize = 2;
    /// Thumb interphalangeal joint.
    pub const THUMB_IP: usize = 3;
    /// Thumb tip.
    pub const THUMB_TIP: usize = 4;
    /// Index finger base.
    pub const INDEX_MCP: usize = 5;
    /// Index finger proximal joint.
    pub const INDEX_PIP: usize = 6;
    /// Index finger distal joint.
    pub const INDEX_DIP: usize = 7;
    /// Index finger tip.
    pub const INDEX_TIP: usize = 8;
    /// Middle finger base; with the wrist it defines the hand scale.
    pub const MIDDLE_MCP: usize = 9;
    /// Middle finger proximal joint.
    pub const MIDDLE_PIP: usize = 10;
    /// Middle finger distal joint.
    pub const MIDDLE_DIP: usize = 11;
    /// Middle finger tip.
    pub const MIDDLE_TIP: usize = 12;
    /// Ring finger base.
    pub const RING_MCP: usize = 13;
    /// Ring finger proximal joint.
    pub const RING_PIP: usize = 14;
    /// Ring finger distal joint.
    pub const RING_DIP: usize = 15;
    /// Ring finger tip.
    pub const RING_TIP: usize = 16;
    /// Pinky base.
    pub const PINKY_MCP: usize = 17;
    /// Pinky proximal joint.
    pub const PINKY_PIP: usize = 18;
    /// Pinky distal joint.
    pub const PINKY_DIP: usize = 19;
    /// Pinky tip.
    pub const PINKY_TIP: usize = 20;

    /// Creates a landmark set, checking the cardinality.
    ///
    /// # Errors
    ///
    /// Returns [`SignTypesError::LandmarkCount`] if `landmarks` does not
    /// hold exactly [`HAND_LANDMARK_COUNT`] points.
    pub fn try_new(landmarks: Vec<Landmark>) -> Result<Self> {
        if landmarks.len() == HAND_LANDMARK_COUNT {
            Ok(Self(landmarks))
        } else {
            Err(SignTypesError::landmark_count(
                HAND_LANDMARK_COUNT,
                landmarks.len(),
            ))
        }
    }

    /// Returns the landmarks as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Landmark] {
        &self.0
    }

    /// Consumes the set and returns the landmarks.
    #[must_use]
    pub fn into_inner(self) -> Vec<Landmark> {
        self.0
    }

    /// Returns the wrist landmark.
    #[must_use]
    pub fn wrist(&self) -> Landmark {
        self.0[Self::WRIST]
    }

    /// Distance from the wrist to the middle finger base.
    #[must_use]
    pub fn hand_scale(&self) -> f32 {
        self.0[Self::WRIST].distance(&self.0[Self::MIDDLE_MCP])
    }

    /// Returns a copy with every landmark scaled by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f32) -> Self {
        Self(self.0.iter().map(|lm| lm.scaled(factor)).collect())
    }

    /// Normalizes this hand; see [`normalize`].
    #[must_use]
    pub fn normalized(&self) -> NormalizedHand {
        normalize(self)
    }

    /// Unit normal of the palm plane spanned by wrist, index base and
    /// pinky base.
    ///
    /// Returns `None` when the three points are collinear.
    #[must_use]
    pub fn palm_normal(&self) -> Option<Landmark> {
        let wrist = self.0[Self::WRIST];
        let index = self.0[Self::INDEX_MCP];
        let pinky = self.0[Self::PINKY_MCP];

        let (ax, ay, az) = (index.x - wrist.x, index.y - wrist.y, index.z - wrist.z);
        let (bx, by, bz) = (pinky.x - wrist.x, pinky.y - wrist.y, pinky.z - wrist.z);

        let nx = ay * bz - az * by;
        let ny = az * bx - ax * bz;
        let nz = ax * by - ay * bx;

        let norm = Landmark::new(nx, ny, nz);
        let magnitude = norm.distance(&Landmark::ORIGIN);
        if magnitude > 0.0 && magnitude.is_finite() {
            Some(norm.scaled(1.0 / magnitude))
        } else {
            None
        }
    }
}

impl TryFrom<Vec<Landmark>> for HandLandmarks {
    type Error = SignTypesError;

    fn try_from(landmarks: Vec<Landmark>) -> Result<Self> {
        Self::try_new(landmarks)
    }
}

impl From<HandLandmarks> for Vec<Landmark> {
    fn from(hand: HandLandmarks) -> Self {
        hand.0
    }
}

impl AsRef<[Landmark]> for HandLandmarks {
    fn as_ref(&self) -> &[Landmark] {
        &self.0
    }
}

/// Result of [`normalize`].
///
/// `hand_scale` is the wrist-to-middle-base distance used as the divisor.
/// A non-positive or non-finite scale means the detection was degenerate
/// and `landmarks` holds the raw input unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedHand {
    /// Normalized landmarks (or the raw input when degenerate).
    pub landmarks: HandLandmarks,
    /// Wrist-to-middle-base distance of the raw input.
    pub hand_scale: f32,
}

impl NormalizedHand {
    /// Returns `true` if normalization fell back to the raw input.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !(self.hand_scale > 0.0 && self.hand_scale.is_finite())
    }
}

/// Translates the hand so the wrist is the origin and divides every
/// coordinate by the wrist-to-middle-base distance.
///
/// When that distance is zero the input is returned unchanged and the
/// result reports [`NormalizedHand::is_degenerate`].
///
/// # Example
///
/// ```
/// use sign_types::{normalize, HandLandmarks, Landmark};
///
/// let mut points = vec![Landmark::new(0.5, 0.5, 0.0); 21];
/// points[HandLandmarks::MIDDLE_MCP] = Landmark::new(0.5, 0.3, 0.0);
/// let hand = HandLandmarks::try_new(points).unwrap();
///
/// let norm = normalize(&hand);
/// assert!(!norm.is_degenerate());
/// assert_eq!(norm.landmarks.wrist(), Landmark::ORIGIN);
/// ```
#[must_use]
pub fn normalize(hand: &HandLandmarks) -> NormalizedHand {
    let hand_scale = hand.hand_scale();
    if !(hand_scale > 0.0 && hand_scale.is_finite()) {
        return NormalizedHand {
            landmarks: hand.clone(),
            hand_scale,
        };
    }

    let wrist = hand.wrist();
    let landmarks = hand
        .0
        .iter()
        .map(|lm| lm.relative_to(&wrist, hand_scale))
        .collect();

    NormalizedHand {
        landmarks: HandLandmarks(landmarks),
        hand_scale,
    }
}
