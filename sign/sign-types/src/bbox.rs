//! YOLO-style bounding box labels derived from hand landmarks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SignTypesError};
use crate::landmark::Landmark;

/// Default padding added on every side of the landmark extent, as a
/// fraction of the normalized image plane.
pub const DEFAULT_BOX_PADDING: f32 = 0.05;

/// Fractional digits kept when rendering a label line.
const LABEL_DECIMALS: usize = 6;

/// A normalized detection box in YOLO center format.
///
/// All four geometric fields are in `[0, 1]`. The text form is
/// `"<class_id> <x_center> <y_center> <width> <height>"`.
///
/// # Example
///
/// ```
/// use sign_types::YoloBox;
///
/// let b = YoloBox::from_edges(3, 0.25, 0.25, 0.75, 0.5);
/// assert_eq!(b.to_string(), "3 0.5 0.375 0.5 0.25");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YoloBox {
    /// Class index.
    pub class_id: u32,
    /// Box center x.
    pub x_center: f32,
    /// Box center y.
    pub y_center: f32,
    /// Box width.
    pub width: f32,
    /// Box height.
    pub height: f32,
}

impl YoloBox {
    /// Creates a box from center and extent.
    #[must_use]
    pub const fn new(class_id: u32, x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
        Self {
            class_id,
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Creates a box from edges, clamping each edge to `[0, 1]`
    /// independently before deriving center and extent.
    #[must_use]
    pub fn from_edges(class_id: u32, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        let x0 = x0.clamp(0.0, 1.0);
        let y0 = y0.clamp(0.0, 1.0);
        let x1 = x1.clamp(0.0, 1.0);
        let y1 = y1.clamp(0.0, 1.0);

        let width = (x1 - x0).max(0.0);
        let height = (y1 - y0).max(0.0);

        Self {
            class_id,
            x_center: x0 + width / 2.0,
            y_center: y0 + height / 2.0,
            width,
            height,
        }
    }

    /// Returns `(x0, y0, x1, y1)`.
    #[must_use]
    pub fn edges(&self) -> (f32, f32, f32, f32) {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        (
            self.x_center - hw,
            self.y_center - hh,
            self.x_center + hw,
            self.y_center + hh,
        )
    }

    /// Returns a copy carrying a different class id.
    #[must_use]
    pub const fn with_class(mut self, class_id: u32) -> Self {
        self.class_id = class_id;
        self
    }

    /// Checks the box stays inside the unit square (with `tolerance` for
    /// rounding) and has non-negative extent.
    #[must_use]
    pub fn is_valid(&self, tolerance: f32) -> bool {
        let (x0, y0, x1, y1) = self.edges();
        self.width >= 0.0
            && self.height >= 0.0
            && x0 >= -tolerance
            && y0 >= -tolerance
            && x1 <= 1.0 + tolerance
            && y1 <= 1.0 + tolerance
    }

    /// Renders the label line (no trailing newline).
    #[must_use]
    pub fn to_line(&self) -> String {
        self.to_string()
    }

    /// Parses a label line.
    ///
    /// # Errors
    ///
    /// Returns [`SignTypesError::InvalidLabelLine`] if the line does not
    /// hold exactly five fields, the class id is not a non-negative
    /// integer, or a coordinate is not a finite number.
    pub fn parse_line(line: &str) -> Result<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(SignTypesError::invalid_label_line(
                line,
                format!("expected 5 fields, got {}", fields.len()),
            ));
        }

        let class_id = fields[0]
            .parse::<u32>()
            .map_err(|e| SignTypesError::invalid_label_line(line, format!("class id: {e}")))?;

        let mut values = [0.0_f32; 4];
        for (slot, raw) in values.iter_mut().zip(&fields[1..]) {
            let value = raw
                .parse::<f32>()
                .map_err(|e| SignTypesError::invalid_label_line(line, format!("'{raw}': {e}")))?;
            if !value.is_finite() {
                return Err(SignTypesError::invalid_label_line(line, format!("'{raw}' is not finite")));
            }
            *slot = value;
        }

        Ok(Self::new(class_id, values[0], values[1], values[2], values[3]))
    }
}

impl fmt::Display for YoloBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.class_id,
            format_decimal(self.x_center),
            format_decimal(self.y_center),
            format_decimal(self.width),
            format_decimal(self.height),
        )
    }
}

/// Fixed-precision decimal with trailing zeros trimmed, never exponent form.
fn format_decimal(value: f32) -> String {
    let mut text = format!("{:.*}", LABEL_DECIMALS, value);
    if text.contains('.') {
        let trimmed = text.trim_end_matches('0').trim_end_matches('.').len();
        text.truncate(trimmed);
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

/// Derives padded, clamped boxes from landmark extents.
///
/// # Example
///
/// ```
/// use sign_types::{BoundingBoxEncoder, Landmark};
///
/// let encoder = BoundingBoxEncoder::default();
/// let line = encoder
///     .encode_line(&[Landmark::new(0.5, 0.5, 0.0), Landmark::new(0.6, 0.6, 0.0)], 0)
///     .unwrap();
/// assert_eq!(line, "0 0.55 0.55 0.2 0.2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxEncoder {
    padding: f32,
}

impl Default for BoundingBoxEncoder {
    fn default() -> Self {
        Self {
            padding: DEFAULT_BOX_PADDING,
        }
    }
}

impl BoundingBoxEncoder {
    /// Creates an encoder with the given padding.
    ///
    /// # Errors
    ///
    /// Returns [`SignTypesError::InvalidConfig`] if `padding` is negative,
    /// above 1 or not finite.
    pub fn new(padding: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&padding) {
            return Err(SignTypesError::invalid_config(format!(
                "box padding must be in [0, 1], got {padding}"
            )));
        }
        Ok(Self { padding })
    }

    /// Padding fraction.
    #[must_use]
    pub const fn padding(&self) -> f32 {
        self.padding
    }

    /// Computes the box around `landmarks` for `class_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SignTypesError::InsufficientInput`] if `landmarks` is
    /// empty; the caller should skip the frame.
    pub fn encode(&self, landmarks: &[Landmark], class_id: u32) -> Result<YoloBox> {
        let Some(first) = landmarks.first() else {
            return Err(SignTypesError::insufficient_input(
                "cannot derive a bounding box from zero landmarks",
            ));
        };

        let (mut x0, mut y0, mut x1, mut y1) = (first.x, first.y, first.x, first.y);
        for lm in &landmarks[1..] {
            x0 = x0.min(lm.x);
            y0 = y0.min(lm.y);
            x1 = x1.max(lm.x);
            y1 = y1.max(lm.y);
        }

        Ok(YoloBox::from_edges(
            class_id,
            x0 - self.padding,
            y0 - self.padding,
            x1 + self.padding,
            y1 + self.padding,
        ))
    }

    /// Computes the box and renders its label line.
    ///
    /// # Errors
    ///
    /// Same as [`Self::encode`].
    pub fn encode_line(&self, landmarks: &[Landmark], class_id: u32) -> Result<String> {
        self.encode(landmarks, class_id).map(|b| b.to_line())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn two_landmarks_example() {
        let encoder = BoundingBoxEncoder::default();
        let lms = [Landmark::new(0.5, 0.5, 0.0), Landmark::new(0.6, 0.6, 0.0)];
        assert_eq!(encoder.encode_line(&lms, 0).unwrap(), "0 0.55 0.55 0.2 0.2");
    }

    #[test]
    fn single_landmark_at_origin_is_clamped() {
        let encoder = BoundingBoxEncoder::default();
        let b = encoder.encode(&[Landmark::ORIGIN], 1).unwrap();
        assert_relative_eq!(b.x_center, 0.025);
        assert_relative_eq!(b.y_center, 0.025);
        assert_relative_eq!(b.width, 0.05);
        assert_relative_eq!(b.height, 0.05);
        assert!(b.to_line().starts_with("1 0.025 0.025 0.05 0.05"));
    }

    #[test]
    fn upper_boundary_is_clamped() {
        let encoder = BoundingBoxEncoder::default();
        let b = encoder.encode(&[Landmark::new(1.0, 0.98, 0.0)], 2).unwrap();
        let (_, _, x1, y1) = b.edges();
        assert_relative_eq!(x1, 1.0, epsilon = 1e-6);
        assert_relative_eq!(y1, 1.0, epsilon = 1e-6);
        assert!(b.is_valid(1e-6));
    }

    #[test]
    fn empty_input_is_insufficient() {
        let err = BoundingBoxEncoder::default().encode(&[], 0).unwrap_err();
        assert!(matches!(err, SignTypesError::InsufficientInput(_)));
    }

    #[test]
    fn invalid_padding_is_rejected() {
        assert!(BoundingBoxEncoder::new(-0.1).is_err());
        assert!(BoundingBoxEncoder::new(f32::NAN).is_err());
        assert!(BoundingBoxEncoder::new(0.0).is_ok());
    }

    #[test]
    fn format_is_plain_decimal() {
        assert_eq!(format_decimal(0.0000001), "0");
        assert_eq!(format_decimal(1.0), "1");
        assert_eq!(format_decimal(0.5), "0.5");
        assert_eq!(format_decimal(0.123_456_7), "0.123457");
        assert!(!format_decimal(1e-5).contains('e'));
    }

    #[test]
    fn parse_line_round_trip() {
        let b = YoloBox::parse_line("7 0.5 0.25 0.1 0.2\n").unwrap();
        assert_eq!(b.class_id, 7);
        assert_eq!(b.to_line(), "7 0.5 0.25 0.1 0.2");
    }

    #[test]
    fn parse_line_rejects_malformed() {
        assert!(YoloBox::parse_line("").is_err());
        assert!(YoloBox::parse_line("0 0.5 0.5 0.1").is_err());
        assert!(YoloBox::parse_line("-1 0.5 0.5 0.1 0.1").is_err());
        assert!(YoloBox::parse_line("0 a 0.5 0.1 0.1").is_err());
        assert!(YoloBox::parse_line("0 inf 0.5 0.1 0.1").is_err());
    }

    #[test]
    fn with_class_relabels() {
        let b = YoloBox::from_edges(0, 0.1, 0.1, 0.2, 0.2).with_class(9);
        assert_eq!(b.class_id, 9);
    }
}
