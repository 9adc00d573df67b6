//! Per-finger joint angles and extension state.

use serde::{Deserialize, Serialize};

use crate::landmark::{HandLandmarks, Landmark};

/// Thumb counts as extended when the angle at its IP joint exceeds this.
const THUMB_EXTENDED_ANGLE: f32 = 150.0;

/// PIP angle (degrees) at which a finger counts as fully curled.
const FULL_CURL_ANGLE: f32 = 50.0;

/// Curl scores above this force the curled state.
const CURLED_ABOVE: f32 = 0.4;

/// Curl scores below this force the extended state.
const EXTENDED_BELOW: f32 = 0.3;

/// One of the five digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Finger {
    /// Thumb.
    Thumb,
    /// Index finger.
    Index,
    /// Middle finger.
    Middle,
    /// Ring finger.
    Ring,
    /// Pinky.
    Pinky,
}

impl Finger {
    /// All fingers, thumb first.
    pub const ALL: [Self; 5] = [Self::Thumb, Self::Index, Self::Middle, Self::Ring, Self::Pinky];

    /// Name used as the key of per-finger maps.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Thumb => "Thumb",
            Self::Index => "Index",
            Self::Middle => "Middle",
            Self::Ring => "Ring",
            Self::Pinky => "Pinky",
        }
    }

    /// Landmark indices from the base joint to the tip.
    ///
    /// The thumb chain is CMC, MCP, IP, tip; the others are MCP, PIP,
    /// DIP, tip.
    #[must_use]
    pub const fn joints(self) -> [usize; 4] {
        match self {
            Self::Thumb => [
                HandLandmarks::THUMB_CMC,
                HandLandmarks::THUMB_MCP,
                HandLandmarks::THUMB_IP,
                HandLandmarks::THUMB_TIP,
            ],
            Self::Index => [
                HandLandmarks::INDEX_MCP,
                HandLandmarks::INDEX_PIP,
                HandLandmarks::INDEX_DIP,
                HandLandmarks::INDEX_TIP,
            ],
            Self::Middle => [
                HandLandmarks::MIDDLE_MCP,
                HandLandmarks::MIDDLE_PIP,
                HandLandmarks::MIDDLE_DIP,
                HandLandmarks::MIDDLE_TIP,
            ],
            Self::Ring => [
                HandLandmarks::RING_MCP,
                HandLandmarks::RING_PIP,
                HandLandmarks::RING_DIP,
                HandLandmarks::RING_TIP,
            ],
            Self::Pinky => [
                HandLandmarks::PINKY_MCP,
                HandLandmarks::PINKY_PIP,
                HandLandmarks::PINKY_DIP,
                HandLandmarks::PINKY_TIP,
            ],
        }
    }
}

impl std::fmt::Display for Finger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Extension state of one finger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FingerState {
    /// Which finger.
    pub finger: Finger,
    /// Whether the finger is extended.
    pub is_extended: bool,
    /// 0 (straight) to 1 (fully curled).
    pub curl_score: f32,
}

impl FingerState {
    /// Returns `true` if the finger is not extended.
    #[must_use]
    pub const fn is_curled(&self) -> bool {
        !self.is_extended
    }

    /// `"extended"` or `"curled"`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        if self.is_extended {
            "extended"
        } else {
            "curled"
        }
    }
}

/// Angle at `b` between the segments to `a` and `c`, in degrees.
///
/// 180 means the three points are collinear with `b` in the middle. A
/// zero-length segment has no defined bend and also gives 180.
///
/// # Example
///
/// ```
/// use sign_types::{joint_angle, Landmark};
///
/// let a = Landmark::new(1.0, 0.0, 0.0);
/// let b = Landmark::ORIGIN;
/// let c = Landmark::new(0.0, 1.0, 0.0);
/// assert!((joint_angle(&a, &b, &c) - 90.0).abs() < 1e-4);
/// ```
#[must_use]
pub fn joint_angle(a: &Landmark, b: &Landmark, c: &Landmark) -> f32 {
    let u = Landmark::new(a.x - b.x, a.y - b.y, a.z - b.z);
    let v = Landmark::new(c.x - b.x, c.y - b.y, c.z - b.z);
    let magnitude = u.distance(&Landmark::ORIGIN) * v.distance(&Landmark::ORIGIN);
    if !(magnitude > 0.0 && magnitude.is_finite()) {
        return 180.0;
    }
    let dot = u.x * v.x + u.y * v.y + u.z * v.z;
    (dot / magnitude).clamp(-1.0, 1.0).acos().to_degrees()
}

impl HandLandmarks {
    /// Bend angles of `finger` in degrees, base joint first.
    ///
    /// The thumb reports its MCP and IP joints; the other fingers report
    /// MCP (measured from the wrist), PIP and DIP.
    #[must_use]
    pub fn joint_angles(&self, finger: Finger) -> Vec<f32> {
        let p = self.as_slice();
        let [base, second, third, tip] = finger.joints();
        match finger {
            Finger::Thumb => vec![
                joint_angle(&p[base], &p[second], &p[third]),
                joint_angle(&p[second], &p[third], &p[tip]),
            ],
            _ => vec![
                joint_angle(&p[Self::WRIST], &p[base], &p[second]),
                joint_angle(&p[base], &p[second], &p[third]),
                joint_angle(&p[second], &p[third], &p[tip]),
            ],
        }
    }

    /// Extension state of one finger.
    ///
    /// The thumb is extended when its IP angle exceeds 150°, with curl
    /// `1 - angle / 180`. The other fingers map the angle at the PIP joint
    /// (between MCP and tip) from 180°..50° onto a curl of 0..1. A curl
    /// above 0.4 means curled, below 0.3 means extended, and in between
    /// the finger is extended when its tip is further from the wrist
    /// than its PIP joint.
    #[must_use]
    pub fn finger_state(&self, finger: Finger) -> FingerState {
        let p = self.as_slice();
        let [base, second, third, tip] = finger.joints();

        if finger == Finger::Thumb {
            let angle = joint_angle(&p[second], &p[third], &p[tip]);
            return FingerState {
                finger,
                is_extended: angle > THUMB_EXTENDED_ANGLE,
                curl_score: 1.0 - angle.min(180.0) / 180.0,
            };
        }

        let (mcp, pip) = (base, second);
        let wrist = p[Self::WRIST];
        let angle = joint_angle(&p[mcp], &p[pip], &p[tip]);
        let curl_score = ((180.0 - angle) / (180.0 - FULL_CURL_ANGLE)).clamp(0.0, 1.0);
        let is_extended = if curl_score > CURLED_ABOVE {
            false
        } else if curl_score < EXTENDED_BELOW {
            true
        } else {
            p[tip].distance(&wrist) > p[pip].distance(&wrist)
        };
        FingerState {
            finger,
            is_extended,
            curl_score,
        }
    }

    /// States of all five fingers, thumb first.
    #[must_use]
    pub fn finger_states(&self) -> [FingerState; 5] {
        Finger::ALL.map(|finger| self.finger_state(finger))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Every finger a straight ray pointing along -y.
    fn open_hand() -> Vec<Landmark> {
        let mut points = vec![Landmark::ORIGIN; 21];
        for (column, finger) in Finger::ALL.iter().enumerate() {
            let x = column as f32 * 0.3 - 0.6;
            for (step, &joint) in finger.joints().iter().enumerate() {
                points[joint] = Landmark::new(x, -1.0 - 0.4 * step as f32, 0.0);
            }
        }
        points
    }

    #[test]
    fn joint_angle_cases() {
        let b = Landmark::ORIGIN;
        let a = Landmark::new(-1.0, 0.0, 0.0);
        assert_relative_eq!(joint_angle(&a, &b, &Landmark::new(2.0, 0.0, 0.0)), 180.0, epsilon = 1e-3);
        assert_relative_eq!(joint_angle(&a, &b, &Landmark::new(0.0, 0.0, 3.0)), 90.0, epsilon = 1e-3);
        assert_relative_eq!(joint_angle(&a, &b, &b), 180.0);
    }

    #[test]
    fn open_hand_is_extended() {
        let hand = HandLandmarks::try_new(open_hand()).unwrap();
        for state in hand.finger_states() {
            assert!(state.is_extended, "{}", state.finger);
            assert_relative_eq!(state.curl_score, 0.0, epsilon = 1e-3);
            assert_eq!(state.label(), "extended");
        }
        for angle in hand.joint_angles(Finger::Middle) {
            assert_relative_eq!(angle, 180.0, epsilon = 1e-3);
        }
        assert_eq!(hand.joint_angles(Finger::Thumb).len(), 2);
        assert_eq!(hand.joint_angles(Finger::Index).len(), 3);
    }

    #[test]
    fn folded_index_is_curled() {
        let mut points = open_hand();
        // PIP at (-0.3, -1.4); tip folded back towards the palm.
        points[HandLandmarks::INDEX_TIP] = Landmark::new(-0.3, -1.0, 0.3);
        let hand = HandLandmarks::try_new(points).unwrap();

        let index = hand.finger_state(Finger::Index);
        assert!(index.is_curled());
        assert_relative_eq!(index.curl_score, 1.0);
        assert!(hand.finger_state(Finger::Middle).is_extended);
    }

    #[test]
    fn right_angle_thumb() {
        let mut points = open_hand();
        // IP at (-0.6, -1.8); tip turned sideways.
        points[HandLandmarks::THUMB_TIP] = Landmark::new(-0.2, -1.8, 0.0);
        let hand = HandLandmarks::try_new(points).unwrap();

        let thumb = hand.finger_state(Finger::Thumb);
        assert!(!thumb.is_extended);
        assert_relative_eq!(thumb.curl_score, 0.5, epsilon = 1e-4);
        assert_relative_eq!(hand.joint_angles(Finger::Thumb)[1], 90.0, epsilon = 1e-3);
    }

    #[test]
    fn states_are_scale_invariant() {
        let mut points = open_hand();
        points[HandLandmarks::PINKY_TIP] = Landmark::new(0.6, -1.2, 0.25);
        let hand = HandLandmarks::try_new(points).unwrap();
        let scaled = hand.scaled(0.1);
        for (a, b) in hand.finger_states().iter().zip(scaled.finger_states().iter()) {
            assert_eq!(a.is_extended, b.is_extended);
            assert_relative_eq!(a.curl_score, b.curl_score, epsilon = 1e-4);
        }
    }
}
